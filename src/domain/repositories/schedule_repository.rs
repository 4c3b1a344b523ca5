//! Repository trait for weekly schedule queries.

use async_trait::async_trait;
use chrono::Weekday;

use crate::domain::entities::Schedule;
use crate::error::AppError;

/// Weekly schedule queries.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ScheduleRepository: Send + Sync {
    /// Lists every non-deleted schedule of a weekday, active or not, ordered
    /// by start time.
    ///
    /// Callers narrow the result with [`Schedule::applies_on`] or
    /// [`crate::domain::entities::ScheduleDraft::overlaps`].
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn find_by_day(&self, day: Weekday) -> Result<Vec<Schedule>, AppError>;
}
