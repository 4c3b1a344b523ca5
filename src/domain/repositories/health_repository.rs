//! Repository trait for backing-store health probes.

use async_trait::async_trait;

use crate::error::AppError;

/// Connectivity probe used by the health endpoint.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HealthRepository: Send + Sync {
    /// Round-trips a trivial query.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if the database cannot be reached.
    async fn ping(&self) -> Result<(), AppError>;
}
