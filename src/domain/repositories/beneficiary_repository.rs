//! Repository trait for beneficiary lookups beyond generic CRUD.

use async_trait::async_trait;

use crate::domain::entities::Beneficiary;
use crate::error::AppError;

/// Beneficiary-specific queries.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgBeneficiaryRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BeneficiaryRepository: Send + Sync {
    /// Finds the non-deleted beneficiary holding `national_id`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn find_by_national_id(&self, national_id: &str)
    -> Result<Option<Beneficiary>, AppError>;

    /// Returns true if a non-deleted beneficiary with this id exists.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn exists(&self, id: i64) -> Result<bool, AppError>;
}
