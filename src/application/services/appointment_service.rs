//! Appointment booking and lifecycle service.
//!
//! Implements the slot rules on top of the schedule, holiday and appointment
//! repositories:
//!
//! - only dates between today and the booking horizon can be booked
//! - holidays close the whole day
//! - the schedule must apply on the date and the start time must lie on its
//!   slot grid
//! - a beneficiary cannot hold two overlapping scheduled appointments
//! - a slot accepts at most `capacity` scheduled appointments
//!
//! All "today" decisions use UTC.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::entities::{
    Appointment, AppointmentStatus, BookedSlot, NewAppointment, Schedule,
};
use crate::domain::filter::{FilterLimits, FilterRequest, Page};
use crate::domain::repositories::{
    AppointmentRepository, BeneficiaryRepository, HolidayRepository, ScheduleRepository,
};
use crate::domain::scheduling;
use crate::error::AppError;

/// Default number of days ahead that can be booked.
pub const DEFAULT_BOOKING_HORIZON_DAYS: i64 = 90;

/// A slot offered on a given date with its remaining seats.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailableSlot {
    pub schedule_id: i64,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub capacity: i32,
    pub booked: i64,
    pub remaining: i64,
}

/// Request to book one slot for a beneficiary.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingRequest {
    pub beneficiary_id: i64,
    pub schedule_id: i64,
    pub appointment_date: NaiveDate,
    pub start_time: NaiveTime,
    pub notes: Option<String>,
}

/// Target slot of a reschedule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RescheduleRequest {
    pub schedule_id: i64,
    pub appointment_date: NaiveDate,
    pub start_time: NaiveTime,
}

/// Service for booking appointments and moving them through their lifecycle.
pub struct AppointmentService<A, B, S, H>
where
    A: AppointmentRepository,
    B: BeneficiaryRepository,
    S: ScheduleRepository,
    H: HolidayRepository,
{
    appointments: Arc<A>,
    beneficiaries: Arc<B>,
    schedules: Arc<S>,
    holidays: Arc<H>,
    booking_horizon_days: i64,
    limits: FilterLimits,
    clock: fn() -> NaiveDateTime,
}

fn utc_now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

impl<A, B, S, H> AppointmentService<A, B, S, H>
where
    A: AppointmentRepository,
    B: BeneficiaryRepository,
    S: ScheduleRepository,
    H: HolidayRepository,
{
    /// Creates a new appointment service.
    pub fn new(
        appointments: Arc<A>,
        beneficiaries: Arc<B>,
        schedules: Arc<S>,
        holidays: Arc<H>,
        booking_horizon_days: i64,
        limits: FilterLimits,
    ) -> Self {
        Self {
            appointments,
            beneficiaries,
            schedules,
            holidays,
            booking_horizon_days,
            limits,
            clock: utc_now,
        }
    }

    /// Replaces the wall clock, for deterministic tests.
    pub fn with_clock(mut self, clock: fn() -> NaiveDateTime) -> Self {
        self.clock = clock;
        self
    }

    /// Filter limits applied to [`AppointmentService::search`].
    pub fn limits(&self) -> &FilterLimits {
        &self.limits
    }

    /// Lists every slot that can still be booked on `date`.
    ///
    /// Returns an empty list for past dates and holidays. On today's date,
    /// slots that have already started are omitted. Results are sorted by
    /// start time, then schedule id.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    pub async fn available_slots(&self, date: NaiveDate) -> Result<Vec<AvailableSlot>, AppError> {
        let now = (self.clock)();
        if date < now.date() {
            return Ok(Vec::new());
        }

        if !self.holidays.find_in_range(date, date).await?.is_empty() {
            return Ok(Vec::new());
        }

        let schedules: Vec<Schedule> = self
            .schedules
            .find_by_day(date.weekday())
            .await?
            .into_iter()
            .filter(|s| s.applies_on(date))
            .collect();

        if schedules.is_empty() {
            return Ok(Vec::new());
        }

        let usage: HashMap<(i64, NaiveTime), i64> = self
            .appointments
            .booked_counts(date)
            .await?
            .into_iter()
            .map(|u| ((u.schedule_id, u.start_time), u.booked))
            .collect();

        let mut slots: Vec<AvailableSlot> = schedules
            .iter()
            .flat_map(|schedule| {
                schedule.slots().into_iter().map(|slot| {
                    let booked = usage
                        .get(&(schedule.id, slot.start))
                        .copied()
                        .unwrap_or(0);
                    AvailableSlot {
                        schedule_id: schedule.id,
                        start_time: slot.start,
                        end_time: slot.end,
                        capacity: schedule.capacity,
                        booked,
                        remaining: (i64::from(schedule.capacity) - booked).max(0),
                    }
                })
            })
            .filter(|slot| date > now.date() || slot.start_time > now.time())
            .collect();

        slots.sort_by_key(|s| (s.start_time, s.schedule_id));
        Ok(slots)
    }

    /// Books a slot and assigns the next appointment number of the year.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the date is in the past, beyond the
    /// booking horizon or a holiday, or if the schedule does not offer the
    /// requested slot.
    /// Returns [`AppError::NotFound`] if the beneficiary does not exist.
    /// Returns [`AppError::Conflict`] if the beneficiary already holds an
    /// overlapping appointment or the slot is full.
    /// Returns [`AppError::Internal`] on database errors.
    pub async fn book(&self, request: BookingRequest) -> Result<Appointment, AppError> {
        let result = self.try_book(request).await;

        match &result {
            Ok(appointment) => {
                metrics::counter!("appointments_booked_total").increment(1);
                tracing::info!(
                    id = appointment.id,
                    number = %appointment.appointment_number,
                    beneficiary_id = appointment.beneficiary_id,
                    schedule_id = appointment.schedule_id,
                    date = %appointment.appointment_date,
                    start_time = %appointment.start_time,
                    "Appointment booked"
                );
            }
            Err(e) => record_rejection("book", e),
        }

        result
    }

    async fn try_book(&self, request: BookingRequest) -> Result<Appointment, AppError> {
        let (schedule, slot) = self
            .resolve_slot(
                request.schedule_id,
                request.appointment_date,
                request.start_time,
            )
            .await?;

        if !self.beneficiaries.exists(request.beneficiary_id).await? {
            return Err(AppError::not_found(
                "Beneficiary not found",
                json!({ "id": request.beneficiary_id }),
            ));
        }

        self.ensure_free(request.beneficiary_id, &schedule, &slot, None)
            .await?;

        let notes = request
            .notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        self.appointments
            .book(NewAppointment {
                beneficiary_id: request.beneficiary_id,
                slot,
                notes,
            })
            .await
    }

    /// Moves a scheduled appointment to another slot. The appointment number
    /// is kept.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the appointment does not exist.
    /// Returns [`AppError::Conflict`] on a stale version, a non-scheduled
    /// appointment, an overlapping booking or a full slot.
    /// Returns [`AppError::Validation`] if the target slot breaks a booking rule.
    /// Returns [`AppError::Internal`] on database errors.
    pub async fn reschedule(
        &self,
        id: i64,
        expected_version: i32,
        request: RescheduleRequest,
    ) -> Result<Appointment, AppError> {
        let result = self.try_reschedule(id, expected_version, request).await;

        match &result {
            Ok(appointment) => tracing::info!(
                id,
                number = %appointment.appointment_number,
                date = %appointment.appointment_date,
                start_time = %appointment.start_time,
                "Appointment rescheduled"
            ),
            Err(e) => record_rejection("reschedule", e),
        }

        result
    }

    async fn try_reschedule(
        &self,
        id: i64,
        expected_version: i32,
        request: RescheduleRequest,
    ) -> Result<Appointment, AppError> {
        let current = self.get(id).await?;
        ensure_version(&current, expected_version)?;

        if current.status != AppointmentStatus::Scheduled {
            return Err(AppError::conflict(
                "Only scheduled appointments can be rescheduled",
                json!({ "id": id, "status": current.status.as_str() }),
            ));
        }

        let (schedule, slot) = self
            .resolve_slot(
                request.schedule_id,
                request.appointment_date,
                request.start_time,
            )
            .await?;
        self.ensure_free(current.beneficiary_id, &schedule, &slot, Some(id))
            .await?;

        self.appointments
            .reschedule(id, expected_version, slot)
            .await
    }

    /// Cancels a scheduled appointment.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the appointment does not exist.
    /// Returns [`AppError::Conflict`] on a stale version or a terminal status.
    /// Returns [`AppError::Internal`] on database errors.
    pub async fn cancel(
        &self,
        id: i64,
        expected_version: i32,
        reason: Option<String>,
    ) -> Result<Appointment, AppError> {
        let reason = reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());
        self.transition(id, expected_version, AppointmentStatus::Cancelled, reason)
            .await
    }

    /// Marks a scheduled appointment as completed.
    ///
    /// # Errors
    ///
    /// Same as [`AppointmentService::cancel`].
    pub async fn complete(&self, id: i64, expected_version: i32) -> Result<Appointment, AppError> {
        self.transition(id, expected_version, AppointmentStatus::Completed, None)
            .await
    }

    /// Marks a scheduled appointment as missed.
    ///
    /// # Errors
    ///
    /// Same as [`AppointmentService::cancel`].
    pub async fn mark_no_show(
        &self,
        id: i64,
        expected_version: i32,
    ) -> Result<Appointment, AppError> {
        self.transition(id, expected_version, AppointmentStatus::NoShow, None)
            .await
    }

    async fn transition(
        &self,
        id: i64,
        expected_version: i32,
        next: AppointmentStatus,
        reason: Option<String>,
    ) -> Result<Appointment, AppError> {
        let current = self.get(id).await?;
        ensure_version(&current, expected_version)?;

        if !current.status.can_transition_to(next) {
            return Err(AppError::conflict(
                "Invalid status transition",
                json!({ "id": id, "from": current.status.as_str(), "to": next.as_str() }),
            ));
        }

        let updated = self
            .appointments
            .update_status(id, expected_version, next, reason)
            .await?;

        metrics::counter!("appointments_status_changed_total", "status" => next.as_str())
            .increment(1);
        tracing::info!(
            id,
            number = %updated.appointment_number,
            from = current.status.as_str(),
            to = next.as_str(),
            "Appointment status changed"
        );

        Ok(updated)
    }

    /// Loads a non-deleted appointment.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the appointment does not exist.
    /// Returns [`AppError::Internal`] on database errors.
    pub async fn get(&self, id: i64) -> Result<Appointment, AppError> {
        self.appointments
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Appointment not found", json!({ "id": id })))
    }

    /// Runs a structured search over appointments.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for invalid filters.
    /// Returns [`AppError::Internal`] on database errors.
    pub async fn search(&self, request: &FilterRequest) -> Result<Page<Appointment>, AppError> {
        request.validate(&self.limits)?;
        self.appointments.search(request).await
    }

    /// Checks the date and finds the schedule slot starting at `start_time`.
    async fn resolve_slot(
        &self,
        schedule_id: i64,
        date: NaiveDate,
        start_time: NaiveTime,
    ) -> Result<(Schedule, BookedSlot), AppError> {
        let now = (self.clock)();
        let today = now.date();

        if date < today {
            return Err(AppError::bad_request(
                "Cannot book a date in the past",
                json!({ "date": date.to_string(), "today": today.to_string() }),
            ));
        }

        let horizon = today + Duration::days(self.booking_horizon_days);
        if date > horizon {
            return Err(AppError::bad_request(
                "Date is beyond the booking horizon",
                json!({
                    "date": date.to_string(),
                    "last_bookable_date": horizon.to_string(),
                    "horizon_days": self.booking_horizon_days,
                }),
            ));
        }

        let holidays = self.holidays.find_in_range(date, date).await?;
        if let Some(holiday) = scheduling::holiday_on(date, &holidays) {
            return Err(AppError::bad_request(
                "Date is a holiday",
                json!({ "date": date.to_string(), "holiday": holiday.name }),
            ));
        }

        let schedule = self
            .schedules
            .find_by_day(date.weekday())
            .await?
            .into_iter()
            .find(|s| s.id == schedule_id && s.applies_on(date))
            .ok_or_else(|| {
                AppError::bad_request(
                    "Schedule does not apply on the requested date",
                    json!({ "schedule_id": schedule_id, "date": date.to_string() }),
                )
            })?;

        let slot = schedule.slot_starting_at(start_time).ok_or_else(|| {
            AppError::bad_request(
                "Start time is not on the schedule's slot grid",
                json!({
                    "start_time": start_time.to_string(),
                    "schedule_start": schedule.start_time.to_string(),
                    "slot_minutes": schedule.slot_minutes,
                }),
            )
        })?;

        if date == today && slot.start <= now.time() {
            return Err(AppError::bad_request(
                "Slot has already started",
                json!({ "start_time": slot.start.to_string() }),
            ));
        }

        let booked = BookedSlot {
            schedule_id: schedule.id,
            appointment_date: date,
            start_time: slot.start,
            end_time: slot.end,
        };

        Ok((schedule, booked))
    }

    /// Rejects a slot the beneficiary already overlaps or that is full.
    ///
    /// `exclude_id` is the appointment being rescheduled; it does not count
    /// against capacity or the overlap rule. The repository repeats both
    /// checks under row locks.
    async fn ensure_free(
        &self,
        beneficiary_id: i64,
        schedule: &Schedule,
        slot: &BookedSlot,
        exclude_id: Option<i64>,
    ) -> Result<(), AppError> {
        let date = slot.appointment_date;

        if self
            .appointments
            .has_overlapping_booking(beneficiary_id, date, slot.start_time, slot.end_time, exclude_id)
            .await?
        {
            return Err(AppError::conflict(
                "Beneficiary already has an appointment at this time",
                json!({
                    "beneficiary_id": beneficiary_id,
                    "date": date.to_string(),
                    "start_time": slot.start_time.to_string(),
                }),
            ));
        }

        let booked = self
            .appointments
            .count_booked(schedule.id, date, slot.start_time, exclude_id)
            .await?;
        if booked >= i64::from(schedule.capacity) {
            return Err(AppError::conflict(
                "Slot is fully booked",
                json!({ "capacity": schedule.capacity, "booked": booked }),
            ));
        }

        Ok(())
    }
}

fn ensure_version(current: &Appointment, expected_version: i32) -> Result<(), AppError> {
    if current.row_version != expected_version {
        return Err(AppError::stale_version(
            "Appointment",
            current.id,
            expected_version,
        ));
    }
    Ok(())
}

fn record_rejection(operation: &'static str, error: &AppError) {
    let reason = error.to_error_info().code;
    metrics::counter!(
        "appointments_booking_rejected_total",
        "operation" => operation,
        "reason" => reason
    )
    .increment(1);
    tracing::debug!(operation, reason, error = %error, "Booking rejected");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Holiday;
    use crate::domain::entities::SlotUsage;
    use crate::domain::entities::schedule::tests::{date, monday_morning, time};
    use crate::domain::repositories::{
        MockAppointmentRepository, MockBeneficiaryRepository, MockHolidayRepository,
        MockScheduleRepository,
    };

    type Service = AppointmentService<
        MockAppointmentRepository,
        MockBeneficiaryRepository,
        MockScheduleRepository,
        MockHolidayRepository,
    >;

    /// Saturday 2026-01-10 10:00 UTC.
    fn saturday_morning() -> NaiveDateTime {
        date(2026, 1, 10).and_time(time(10, 0))
    }

    /// Monday 2026-01-12 10:10 UTC.
    fn monday_during_opening() -> NaiveDateTime {
        date(2026, 1, 12).and_time(time(10, 10))
    }

    fn monday() -> NaiveDate {
        date(2026, 1, 12)
    }

    struct Mocks {
        appointments: MockAppointmentRepository,
        beneficiaries: MockBeneficiaryRepository,
        schedules: MockScheduleRepository,
        holidays: MockHolidayRepository,
    }

    impl Mocks {
        fn new() -> Self {
            Self {
                appointments: MockAppointmentRepository::new(),
                beneficiaries: MockBeneficiaryRepository::new(),
                schedules: MockScheduleRepository::new(),
                holidays: MockHolidayRepository::new(),
            }
        }

        /// Monday has one schedule (id 1) and no holidays.
        fn with_open_monday(mut self) -> Self {
            self.schedules
                .expect_find_by_day()
                .returning(|_| Ok(vec![monday_morning(1)]));
            self.holidays
                .expect_find_in_range()
                .returning(|_, _| Ok(vec![]));
            self
        }

        fn with_beneficiary(mut self, exists: bool) -> Self {
            self.beneficiaries
                .expect_exists()
                .returning(move |_| Ok(exists));
            self
        }

        fn service(self, clock: fn() -> NaiveDateTime) -> Service {
            AppointmentService::new(
                Arc::new(self.appointments),
                Arc::new(self.beneficiaries),
                Arc::new(self.schedules),
                Arc::new(self.holidays),
                DEFAULT_BOOKING_HORIZON_DAYS,
                FilterLimits::default(),
            )
            .with_clock(clock)
        }
    }

    fn appointment(id: i64, status: AppointmentStatus, row_version: i32) -> Appointment {
        Appointment {
            id,
            appointment_number: "APT-2026-000001".to_string(),
            beneficiary_id: 5,
            schedule_id: 1,
            appointment_date: monday(),
            start_time: time(9, 30),
            end_time: time(10, 0),
            status,
            notes: None,
            cancellation_reason: None,
            row_version,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn booking(start: NaiveTime) -> BookingRequest {
        BookingRequest {
            beneficiary_id: 5,
            schedule_id: 1,
            appointment_date: monday(),
            start_time: start,
            notes: Some("  first visit ".to_string()),
        }
    }

    // ─── AVAILABILITY ──────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_available_slots_reports_remaining_seats() {
        let mut mocks = Mocks::new().with_open_monday();
        mocks.appointments.expect_booked_counts().returning(|_| {
            Ok(vec![SlotUsage {
                schedule_id: 1,
                start_time: time(9, 30),
                booked: 2,
            }])
        });
        let service = mocks.service(saturday_morning);

        let slots = service.available_slots(monday()).await.unwrap();

        assert_eq!(slots.len(), 6);
        assert_eq!(slots[0].remaining, 2);
        assert_eq!(slots[1].start_time, time(9, 30));
        assert_eq!(slots[1].booked, 2);
        assert_eq!(slots[1].remaining, 0);
    }

    #[tokio::test]
    async fn test_available_slots_skips_started_slots_today() {
        let mut mocks = Mocks::new().with_open_monday();
        mocks
            .appointments
            .expect_booked_counts()
            .returning(|_| Ok(vec![]));
        let service = mocks.service(monday_during_opening);

        let slots = service.available_slots(monday()).await.unwrap();

        // 10:10 -> 10:30, 11:00, 11:30 remain.
        assert_eq!(slots.len(), 3);
        assert_eq!(slots[0].start_time, time(10, 30));
    }

    #[tokio::test]
    async fn test_available_slots_empty_on_holiday() {
        let mut mocks = Mocks::new();
        mocks.holidays.expect_find_in_range().returning(|from, _| {
            Ok(vec![Holiday {
                id: 1,
                name: "Closure".to_string(),
                start_date: from,
                end_date: from,
                row_version: 0,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            }])
        });
        let service = mocks.service(saturday_morning);

        let slots = service.available_slots(monday()).await.unwrap();

        assert!(slots.is_empty());
    }

    #[tokio::test]
    async fn test_available_slots_empty_in_the_past() {
        let service = Mocks::new().service(saturday_morning);

        let slots = service.available_slots(date(2026, 1, 5)).await.unwrap();

        assert!(slots.is_empty());
    }

    // ─── BOOKING ───────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_book_success() {
        let mut mocks = Mocks::new().with_open_monday().with_beneficiary(true);
        mocks
            .appointments
            .expect_has_overlapping_booking()
            .withf(|b, d, s, e, ex| {
                *b == 5 && *d == monday() && *s == time(9, 30) && *e == time(10, 0) && ex.is_none()
            })
            .times(1)
            .returning(|_, _, _, _, _| Ok(false));
        mocks
            .appointments
            .expect_count_booked()
            .times(1)
            .returning(|_, _, _, _| Ok(1));
        mocks
            .appointments
            .expect_book()
            .withf(|new| {
                new.slot.schedule_id == 1
                    && new.slot.end_time == time(10, 0)
                    && new.notes.as_deref() == Some("first visit")
            })
            .times(1)
            .returning(|_| Ok(appointment(10, AppointmentStatus::Scheduled, 0)));
        let service = mocks.service(saturday_morning);

        let booked = service.book(booking(time(9, 30))).await.unwrap();

        assert_eq!(booked.id, 10);
        assert_eq!(booked.appointment_number, "APT-2026-000001");
    }

    #[tokio::test]
    async fn test_book_unknown_beneficiary_is_not_found() {
        let service = Mocks::new()
            .with_open_monday()
            .with_beneficiary(false)
            .service(saturday_morning);

        let result = service.book(booking(time(9, 30))).await;

        assert!(matches!(result, Err(AppError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_book_checks_date_before_beneficiary() {
        let service = Mocks::new()
            .with_open_monday()
            .with_beneficiary(false)
            .service(saturday_morning);

        let mut past = booking(time(9, 30));
        past.appointment_date = date(2026, 1, 5);
        let off_grid = booking(time(9, 15));

        let past = service.book(past).await;
        let off_grid = service.book(off_grid).await;

        assert!(matches!(past, Err(AppError::Validation { .. })));
        assert!(matches!(off_grid, Err(AppError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_book_in_the_past_is_rejected() {
        let service = Mocks::new()
            .with_open_monday()
            .with_beneficiary(true)
            .service(saturday_morning);

        let mut request = booking(time(9, 30));
        request.appointment_date = date(2026, 1, 5);

        let result = service.book(request).await;

        assert!(matches!(result, Err(AppError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_book_beyond_horizon_is_rejected() {
        let service = Mocks::new()
            .with_open_monday()
            .with_beneficiary(true)
            .service(saturday_morning);

        let mut request = booking(time(9, 30));
        request.appointment_date = date(2026, 6, 1);

        let result = service.book(request).await;

        assert!(matches!(result, Err(AppError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_book_off_grid_start_is_rejected() {
        let service = Mocks::new()
            .with_open_monday()
            .with_beneficiary(true)
            .service(saturday_morning);

        let result = service.book(booking(time(9, 15))).await;

        assert!(matches!(result, Err(AppError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_book_on_wrong_weekday_is_rejected() {
        let service = Mocks::new()
            .with_open_monday()
            .with_beneficiary(true)
            .service(saturday_morning);

        let mut request = booking(time(9, 30));
        request.appointment_date = date(2026, 1, 13);

        let result = service.book(request).await;

        assert!(matches!(result, Err(AppError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_book_started_slot_today_is_rejected() {
        let service = Mocks::new()
            .with_open_monday()
            .with_beneficiary(true)
            .service(monday_during_opening);

        let result = service.book(booking(time(10, 0))).await;

        assert!(matches!(result, Err(AppError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_book_overlapping_booking_is_conflict() {
        let mut mocks = Mocks::new().with_open_monday().with_beneficiary(true);
        mocks
            .appointments
            .expect_has_overlapping_booking()
            .returning(|_, _, _, _, _| Ok(true));
        let service = mocks.service(saturday_morning);

        let result = service.book(booking(time(9, 30))).await;

        assert!(matches!(result, Err(AppError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_book_full_slot_is_conflict() {
        let mut mocks = Mocks::new().with_open_monday().with_beneficiary(true);
        mocks
            .appointments
            .expect_has_overlapping_booking()
            .returning(|_, _, _, _, _| Ok(false));
        mocks
            .appointments
            .expect_count_booked()
            .returning(|_, _, _, _| Ok(2));
        mocks.appointments.expect_book().never();
        let service = mocks.service(saturday_morning);

        let result = service.book(booking(time(9, 30))).await;

        assert!(matches!(result, Err(AppError::Conflict { .. })));
    }

    // ─── RESCHEDULE ────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_reschedule_excludes_itself_from_capacity() {
        let mut mocks = Mocks::new().with_open_monday();
        mocks
            .appointments
            .expect_find_by_id()
            .returning(|id| Ok(Some(appointment(id, AppointmentStatus::Scheduled, 3))));
        mocks
            .appointments
            .expect_has_overlapping_booking()
            .withf(|_, _, _, _, ex| *ex == Some(10))
            .returning(|_, _, _, _, _| Ok(false));
        mocks
            .appointments
            .expect_count_booked()
            .withf(|_, _, _, ex| *ex == Some(10))
            .returning(|_, _, _, _| Ok(1));
        mocks
            .appointments
            .expect_reschedule()
            .withf(|id, v, slot| *id == 10 && *v == 3 && slot.start_time == time(11, 0))
            .times(1)
            .returning(|id, _, slot| {
                let mut a = appointment(id, AppointmentStatus::Scheduled, 4);
                a.start_time = slot.start_time;
                a.end_time = slot.end_time;
                Ok(a)
            });
        let service = mocks.service(saturday_morning);

        let moved = service
            .reschedule(
                10,
                3,
                RescheduleRequest {
                    schedule_id: 1,
                    appointment_date: monday(),
                    start_time: time(11, 0),
                },
            )
            .await
            .unwrap();

        assert_eq!(moved.start_time, time(11, 0));
        assert_eq!(moved.appointment_number, "APT-2026-000001");
    }

    #[tokio::test]
    async fn test_reschedule_cancelled_is_conflict() {
        let mut mocks = Mocks::new();
        mocks
            .appointments
            .expect_find_by_id()
            .returning(|id| Ok(Some(appointment(id, AppointmentStatus::Cancelled, 1))));
        let service = mocks.service(saturday_morning);

        let result = service
            .reschedule(
                10,
                1,
                RescheduleRequest {
                    schedule_id: 1,
                    appointment_date: monday(),
                    start_time: time(11, 0),
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Conflict { .. })));
    }

    // ─── STATUS ────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_cancel_stores_trimmed_reason() {
        let mut mocks = Mocks::new();
        mocks
            .appointments
            .expect_find_by_id()
            .returning(|id| Ok(Some(appointment(id, AppointmentStatus::Scheduled, 0))));
        mocks
            .appointments
            .expect_update_status()
            .withf(|id, v, status, reason| {
                *id == 10
                    && *v == 0
                    && *status == AppointmentStatus::Cancelled
                    && reason.as_deref() == Some("sick")
            })
            .times(1)
            .returning(|id, _, status, reason| {
                let mut a = appointment(id, status, 1);
                a.cancellation_reason = reason;
                Ok(a)
            });
        let service = mocks.service(saturday_morning);

        let cancelled = service
            .cancel(10, 0, Some(" sick ".to_string()))
            .await
            .unwrap();

        assert_eq!(cancelled.status, AppointmentStatus::Cancelled);
        assert_eq!(cancelled.cancellation_reason.as_deref(), Some("sick"));
    }

    #[tokio::test]
    async fn test_complete_terminal_is_conflict() {
        let mut mocks = Mocks::new();
        mocks
            .appointments
            .expect_find_by_id()
            .returning(|id| Ok(Some(appointment(id, AppointmentStatus::NoShow, 1))));
        mocks.appointments.expect_update_status().never();
        let service = mocks.service(saturday_morning);

        let result = service.complete(10, 1).await;

        assert!(matches!(result, Err(AppError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_mark_no_show_stale_version_is_conflict() {
        let mut mocks = Mocks::new();
        mocks
            .appointments
            .expect_find_by_id()
            .returning(|id| Ok(Some(appointment(id, AppointmentStatus::Scheduled, 2))));
        mocks.appointments.expect_update_status().never();
        let service = mocks.service(saturday_morning);

        let result = service.mark_no_show(10, 1).await;

        assert!(matches!(result, Err(AppError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let mut mocks = Mocks::new();
        mocks
            .appointments
            .expect_find_by_id()
            .returning(|_| Ok(None));
        let service = mocks.service(saturday_morning);

        assert!(matches!(
            service.get(99).await,
            Err(AppError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_search_rejects_oversized_page() {
        let service = Mocks::new().service(saturday_morning);

        let result = service.search(&FilterRequest::page(1, 500)).await;

        assert!(matches!(result, Err(AppError::Validation { .. })));
    }
}
