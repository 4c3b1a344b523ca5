//! Domain entity representing an appointment.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use std::fmt;
use std::str::FromStr;

use crate::domain::repositories::Resource;

/// Lifecycle state of an appointment.
///
/// Only `Scheduled` appointments can change state; every other state is
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    Cancelled,
    NoShow,
}

impl AppointmentStatus {
    pub const ALL: [&'static str; 4] = ["scheduled", "completed", "cancelled", "no_show"];

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::NoShow => "no_show",
        }
    }

    /// Returns true if an appointment in this state may move to `next`.
    ///
    /// Only a scheduled appointment moves, and only into a terminal state.
    pub fn can_transition_to(&self, next: AppointmentStatus) -> bool {
        !self.is_terminal() && next.is_terminal()
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, AppointmentStatus::Scheduled)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(AppointmentStatus::Scheduled),
            "completed" => Ok(AppointmentStatus::Completed),
            "cancelled" => Ok(AppointmentStatus::Cancelled),
            "no_show" => Ok(AppointmentStatus::NoShow),
            other => Err(format!("unknown appointment status '{other}'")),
        }
    }
}

/// A booked slot.
#[derive(Debug, Clone, PartialEq)]
pub struct Appointment {
    pub id: i64,
    /// Human-readable number, `APT-YYYY-NNNNNN`.
    pub appointment_number: String,
    pub beneficiary_id: i64,
    pub schedule_id: i64,
    pub appointment_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub cancellation_reason: Option<String>,
    pub row_version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The slot an appointment occupies, as validated by the booking rules.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BookedSlot {
    pub schedule_id: i64,
    pub appointment_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

/// Validated booking handed to the repository.
///
/// The appointment number is allocated by the repository inside the booking
/// transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAppointment {
    pub beneficiary_id: i64,
    pub slot: BookedSlot,
    pub notes: Option<String>,
}

/// Number of scheduled appointments in one slot of one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotUsage {
    pub schedule_id: i64,
    pub start_time: NaiveTime,
    pub booked: i64,
}

impl Resource for Appointment {
    const NAME: &'static str = "Appointment";

    fn id(&self) -> i64 {
        self.id
    }

    fn row_version(&self) -> i32 {
        self.row_version
    }
}
