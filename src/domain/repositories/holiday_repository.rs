//! Repository trait for holiday calendar queries.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::entities::Holiday;
use crate::error::AppError;

/// Holiday calendar queries.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HolidayRepository: Send + Sync {
    /// Lists non-deleted holidays intersecting the inclusive range `[from, to]`,
    /// ordered by start date.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn find_in_range(&self, from: NaiveDate, to: NaiveDate)
    -> Result<Vec<Holiday>, AppError>;
}
