//! DTOs for schedule endpoints.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use validator::Validate;

use crate::domain::entities::{Schedule, ScheduleDraft};
use crate::domain::scheduling;
use crate::error::AppError;

fn default_active() -> bool {
    true
}

/// Request body for creating or replacing a weekly schedule.
///
/// `day_of_week` uses ISO numbering: 1 = Monday … 7 = Sunday. Times are
/// `HH:MM` or `HH:MM:SS`.
#[derive(Debug, Deserialize, Validate)]
pub struct ScheduleRequest {
    #[validate(range(min = 1, max = 7, message = "day_of_week must be between 1 and 7"))]
    pub day_of_week: u8,

    pub start_time: NaiveTime,

    pub end_time: NaiveTime,

    #[validate(range(
        min = 5,
        max = 480,
        message = "slot_minutes must be between 5 and 480"
    ))]
    pub slot_minutes: i32,

    #[validate(range(min = 1, max = 500, message = "capacity must be between 1 and 500"))]
    pub capacity: i32,

    pub valid_from: NaiveDate,

    pub valid_until: Option<NaiveDate>,

    #[serde(default = "default_active")]
    pub is_active: bool,

    #[validate(length(max = 500))]
    pub description: Option<String>,
}

impl ScheduleRequest {
    /// Converts the request into a draft.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if `day_of_week` is not an ISO weekday.
    pub fn into_draft(self) -> Result<ScheduleDraft, AppError> {
        let day_of_week = scheduling::weekday_from_iso(self.day_of_week).ok_or_else(|| {
            AppError::bad_request(
                "day_of_week must be between 1 and 7",
                json!({ "field": "day_of_week", "value": self.day_of_week }),
            )
        })?;

        Ok(ScheduleDraft {
            day_of_week,
            start_time: self.start_time,
            end_time: self.end_time,
            slot_minutes: self.slot_minutes,
            capacity: self.capacity,
            valid_from: self.valid_from,
            valid_until: self.valid_until,
            is_active: self.is_active,
            description: self
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
        })
    }
}

/// Schedule as returned by the API.
#[derive(Debug, Serialize)]
pub struct ScheduleItem {
    pub id: i64,
    pub day_of_week: u8,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub slot_minutes: i32,
    pub capacity: i32,
    pub valid_from: NaiveDate,
    pub valid_until: Option<NaiveDate>,
    pub is_active: bool,
    pub description: Option<String>,
    pub row_version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Schedule> for ScheduleItem {
    fn from(s: Schedule) -> Self {
        Self {
            id: s.id,
            day_of_week: scheduling::iso_from_weekday(s.day_of_week),
            start_time: s.start_time,
            end_time: s.end_time,
            slot_minutes: s.slot_minutes,
            capacity: s.capacity,
            valid_from: s.valid_from,
            valid_until: s.valid_until,
            is_active: s.is_active,
            description: s.description,
            row_version: s.row_version,
            created_at: s.created_at,
            updated_at: s.updated_at,
        }
    }
}
