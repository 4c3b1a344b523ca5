//! Repository trait for appointments.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};

use crate::domain::entities::{
    Appointment, AppointmentStatus, BookedSlot, NewAppointment, SlotUsage,
};
use crate::domain::filter::{FilterRequest, Page};
use crate::error::AppError;

/// Repository interface for booking and tracking appointments.
///
/// Appointments are never edited field by field; they are booked,
/// rescheduled and moved through their status lifecycle.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgAppointmentRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    /// Finds a non-deleted appointment by id.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn find_by_id(&self, id: i64) -> Result<Option<Appointment>, AppError>;

    /// Runs a structured search over non-deleted appointments.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for invalid filters.
    /// Returns [`AppError::Internal`] on database errors.
    async fn search(&self, request: &FilterRequest) -> Result<Page<Appointment>, AppError>;

    /// Stores a booking and assigns the next appointment number of its year.
    ///
    /// Capacity is re-checked while the schedule row is locked, so two
    /// concurrent bookings cannot both take the last seat.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the slot filled up in the meantime.
    /// Returns [`AppError::Internal`] on database errors.
    async fn book(&self, new_appointment: NewAppointment) -> Result<Appointment, AppError>;

    /// Moves a scheduled appointment to another slot, keeping its number.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the appointment does not exist.
    /// Returns [`AppError::Conflict`] on a stale version or a full slot.
    async fn reschedule(
        &self,
        id: i64,
        expected_version: i32,
        slot: BookedSlot,
    ) -> Result<Appointment, AppError>;

    /// Sets a new status (and optional cancellation reason).
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the appointment does not exist.
    /// Returns [`AppError::Conflict`] on a stale version.
    async fn update_status(
        &self,
        id: i64,
        expected_version: i32,
        status: AppointmentStatus,
        cancellation_reason: Option<String>,
    ) -> Result<Appointment, AppError>;

    /// Counts scheduled appointments in one slot, optionally ignoring one
    /// appointment (the one being rescheduled).
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn count_booked(
        &self,
        schedule_id: i64,
        date: NaiveDate,
        start_time: NaiveTime,
        exclude_id: Option<i64>,
    ) -> Result<i64, AppError>;

    /// Per-slot counts of scheduled appointments on `date`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn booked_counts(&self, date: NaiveDate) -> Result<Vec<SlotUsage>, AppError>;

    /// Returns true if the beneficiary already holds a scheduled appointment
    /// on `date` whose time window intersects `[start_time, end_time)`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn has_overlapping_booking(
        &self,
        beneficiary_id: i64,
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
        exclude_id: Option<i64>,
    ) -> Result<bool, AppError>;

    /// Counts scheduled appointments of a beneficiary on or after `from`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn count_upcoming_for_beneficiary(
        &self,
        beneficiary_id: i64,
        from: NaiveDate,
    ) -> Result<i64, AppError>;

    /// Counts scheduled appointments against a schedule on or after `from`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn count_upcoming_for_schedule(
        &self,
        schedule_id: i64,
        from: NaiveDate,
    ) -> Result<i64, AppError>;

    /// Counts non-deleted appointments per status.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn count_by_status(&self) -> Result<Vec<(AppointmentStatus, i64)>, AppError>;
}
