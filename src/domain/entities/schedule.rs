//! Domain entity representing a weekly schedule.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc, Weekday};
use serde_json::json;

use crate::domain::repositories::{Editable, Resource};
use crate::error::AppError;

use crate::domain::scheduling::{self, TimeSlot};

/// A weekly opening window split into fixed-size slots.
///
/// A schedule applies on every `day_of_week` between `valid_from` and
/// `valid_until` (inclusive, open-ended when `None`) while `is_active` is set.
/// Each slot accepts up to `capacity` appointments.
#[derive(Debug, Clone, PartialEq)]
pub struct Schedule {
    pub id: i64,
    pub day_of_week: Weekday,
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

impl Schedule {
    /// Returns true if appointments can be booked against this schedule on `date`.
    pub fn applies_on(&self, date: NaiveDate) -> bool {
        self.is_active
            && date.weekday() == self.day_of_week
            && self.valid_from <= date
            && self.valid_until.is_none_or(|until| date <= until)
    }

    /// All bookable slots of one day.
    pub fn slots(&self) -> Vec<TimeSlot> {
        scheduling::generate_slots(self.start_time, self.end_time, self.slot_minutes)
    }

    /// The slot beginning exactly at `start`, if it lies on this schedule's grid.
    pub fn slot_starting_at(&self, start: NaiveTime) -> Option<TimeSlot> {
        scheduling::slot_starting_at(self.start_time, self.end_time, self.slot_minutes, start)
    }
}

/// Client-controlled schedule fields.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleDraft {
    pub day_of_week: Weekday,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub slot_minutes: i32,
    pub capacity: i32,
    pub valid_from: NaiveDate,
    pub valid_until: Option<NaiveDate>,
    pub is_active: bool,
    pub description: Option<String>,
}

impl ScheduleDraft {
    /// Returns true if this draft collides with `other` on the weekly calendar.
    pub fn overlaps(&self, other: &Schedule) -> bool {
        self.day_of_week == other.day_of_week
            && scheduling::windows_overlap(
                self.start_time,
                self.end_time,
                other.start_time,
                other.end_time,
            )
            && scheduling::date_ranges_overlap(
                self.valid_from,
                self.valid_until,
                other.valid_from,
                other.valid_until,
            )
    }
}

/// Largest number of seats one slot may offer.
pub const MAX_CAPACITY: i32 = 500;

impl Resource for Schedule {
    const NAME: &'static str = "Schedule";

    fn id(&self) -> i64 {
        self.id
    }

    fn row_version(&self) -> i32 {
        self.row_version
    }
}

impl Editable for Schedule {
    type Draft = ScheduleDraft;

    fn validate_draft(draft: &ScheduleDraft) -> Result<(), AppError> {
        scheduling::validate_schedule_window(draft.start_time, draft.end_time, draft.slot_minutes)?;

        if !(1..=MAX_CAPACITY).contains(&draft.capacity) {
            return Err(AppError::bad_request(
                "Invalid slot capacity",
                json!({ "min": 1, "max": MAX_CAPACITY, "capacity": draft.capacity }),
            ));
        }

        if let Some(until) = draft.valid_until
            && until < draft.valid_from
        {
            return Err(AppError::bad_request(
                "valid_until must not precede valid_from",
                json!({
                    "valid_from": draft.valid_from.to_string(),
                    "valid_until": until.to_string(),
                }),
            ));
        }

        Ok(())
    }
}
