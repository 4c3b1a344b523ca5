//! DTOs for holiday endpoints.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::entities::{Holiday, HolidayDraft};

/// Request body for creating or replacing a holiday.
///
/// Both dates are inclusive; a single-day holiday has `start_date == end_date`.
#[derive(Debug, Deserialize, Validate)]
pub struct HolidayRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be 1 to 200 characters"))]
    pub name: String,

    pub start_date: NaiveDate,

    /// Defaults to `start_date`.
    pub end_date: Option<NaiveDate>,
}

impl HolidayRequest {
    pub fn into_draft(self) -> HolidayDraft {
        HolidayDraft {
            name: self.name.trim().to_string(),
            start_date: self.start_date,
            end_date: self.end_date.unwrap_or(self.start_date),
        }
    }
}

/// Holiday as returned by the API.
#[derive(Debug, Serialize)]
pub struct HolidayItem {
    pub id: i64,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub row_version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Holiday> for HolidayItem {
    fn from(h: Holiday) -> Self {
        Self {
            id: h.id,
            name: h.name,
            start_date: h.start_date,
            end_date: h.end_date,
            row_version: h.row_version,
            created_at: h.created_at,
            updated_at: h.updated_at,
        }
    }
}
