//! Domain entity representing a holiday.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::json;

use crate::domain::repositories::{Editable, Resource};
use crate::error::AppError;

/// An inclusive date range on which no appointment can be booked.
#[derive(Debug, Clone, PartialEq)]
pub struct Holiday {
    pub id: i64,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub row_version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Holiday {
    /// Returns true if `date` falls inside the holiday (both ends inclusive).
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

/// Client-controlled holiday fields.
#[derive(Debug, Clone, PartialEq)]
pub struct HolidayDraft {
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl Resource for Holiday {
    const NAME: &'static str = "Holiday";

    fn id(&self) -> i64 {
        self.id
    }

    fn row_version(&self) -> i32 {
        self.row_version
    }
}

impl Editable for Holiday {
    type Draft = HolidayDraft;

    fn validate_draft(draft: &HolidayDraft) -> Result<(), AppError> {
        let name_len = draft.name.trim().chars().count();
        if name_len == 0 || name_len > 200 {
            return Err(AppError::bad_request(
                "Holiday name must be 1 to 200 characters",
                json!({ "field": "name" }),
            ));
        }

        if draft.end_date < draft.start_date {
            return Err(AppError::bad_request(
                "Holiday must end on or after its start date",
                json!({
                    "start_date": draft.start_date.to_string(),
                    "end_date": draft.end_date.to_string(),
                }),
            ));
        }

        Ok(())
    }
}
