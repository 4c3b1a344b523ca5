//! DTOs for appointment booking and lifecycle endpoints.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::application::services::{AvailableSlot, BookingRequest, RescheduleRequest};
use crate::domain::entities::Appointment;

/// Request body for `POST /api/appointments`.
#[derive(Debug, Deserialize, Validate)]
pub struct BookAppointmentRequest {
    #[validate(range(min = 1))]
    pub beneficiary_id: i64,

    #[validate(range(min = 1))]
    pub schedule_id: i64,

    pub appointment_date: NaiveDate,

    pub start_time: NaiveTime,

    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

impl From<BookAppointmentRequest> for BookingRequest {
    fn from(r: BookAppointmentRequest) -> Self {
        BookingRequest {
            beneficiary_id: r.beneficiary_id,
            schedule_id: r.schedule_id,
            appointment_date: r.appointment_date,
            start_time: r.start_time,
            notes: r.notes,
        }
    }
}

/// Request body for `PUT /api/appointments/{id}/reschedule`.
#[derive(Debug, Deserialize, Validate)]
pub struct RescheduleAppointmentRequest {
    pub row_version: i32,

    #[validate(range(min = 1))]
    pub schedule_id: i64,

    pub appointment_date: NaiveDate,

    pub start_time: NaiveTime,
}

impl RescheduleAppointmentRequest {
    pub fn target(&self) -> RescheduleRequest {
        RescheduleRequest {
            schedule_id: self.schedule_id,
            appointment_date: self.appointment_date,
            start_time: self.start_time,
        }
    }
}

/// Request body for `POST /api/appointments/{id}/cancel`.
#[derive(Debug, Deserialize, Validate)]
pub struct CancelAppointmentRequest {
    pub row_version: i32,

    #[validate(length(max = 500))]
    pub reason: Option<String>,
}

/// Request body for `complete` and `no-show`.
#[derive(Debug, Deserialize)]
pub struct StatusChangeRequest {
    pub row_version: i32,
}

/// Query of `GET /api/appointments/availability`.
#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub date: NaiveDate,
}

/// Appointment as returned by the API.
#[derive(Debug, Serialize)]
pub struct AppointmentItem {
    pub id: i64,
    pub appointment_number: String,
    pub beneficiary_id: i64,
    pub schedule_id: i64,
    pub appointment_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub status: &'static str,
    pub notes: Option<String>,
    pub cancellation_reason: Option<String>,
    pub row_version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Appointment> for AppointmentItem {
    fn from(a: Appointment) -> Self {
        Self {
            id: a.id,
            appointment_number: a.appointment_number,
            beneficiary_id: a.beneficiary_id,
            schedule_id: a.schedule_id,
            appointment_date: a.appointment_date,
            start_time: a.start_time,
            end_time: a.end_time,
            status: a.status.as_str(),
            notes: a.notes,
            cancellation_reason: a.cancellation_reason,
            row_version: a.row_version,
            created_at: a.created_at,
            updated_at: a.updated_at,
        }
    }
}

/// One bookable slot.
#[derive(Debug, Serialize)]
pub struct AvailableSlotItem {
    pub schedule_id: i64,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub capacity: i32,
    pub booked: i64,
    pub remaining: i64,
}

impl From<AvailableSlot> for AvailableSlotItem {
    fn from(s: AvailableSlot) -> Self {
        Self {
            schedule_id: s.schedule_id,
            start_time: s.start_time,
            end_time: s.end_time,
            capacity: s.capacity,
            booked: s.booked,
            remaining: s.remaining,
        }
    }
}

/// Slots offered on one date.
#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    pub date: NaiveDate,
    pub slots: Vec<AvailableSlotItem>,
}
