//! Appointment booking and lifecycle endpoints.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use validator::Validate;

use crate::api::dto::appointment::{
    AppointmentItem, AvailabilityQuery, AvailabilityResponse, BookAppointmentRequest,
    CancelAppointmentRequest, RescheduleAppointmentRequest, StatusChangeRequest,
};
use crate::api::dto::pagination::ListResponse;
use crate::domain::filter::FilterRequest;
use crate::error::AppError;
use crate::state::AppState;

/// Books a slot.
///
/// # Endpoint
///
/// `POST /api/appointments`
///
/// # Request Body
///
/// ```json
/// {
///   "beneficiary_id": 12,
///   "schedule_id": 3,
///   "appointment_date": "2026-11-02",
///   "start_time": "09:30",
///   "notes": "first visit"
/// }
/// ```
///
/// # Errors
///
/// Returns 400 if the date is in the past, beyond the booking horizon or a
/// holiday, or if the schedule does not offer the slot.
/// Returns 404 if the beneficiary does not exist.
/// Returns 409 if the beneficiary already holds an overlapping appointment or
/// the slot is full.
pub async fn book_appointment_handler(
    State(state): State<AppState>,
    Json(payload): Json<BookAppointmentRequest>,
) -> Result<(StatusCode, Json<AppointmentItem>), AppError> {
    payload.validate()?;

    let appointment = state.appointment_service.book(payload.into()).await?;

    Ok((StatusCode::CREATED, Json(appointment.into())))
}

/// Structured search over appointments.
///
/// # Endpoint
///
/// `POST /api/appointments/search`
///
/// Scopes: `upcoming`, `today`, `active`.
pub async fn search_appointments_handler(
    State(state): State<AppState>,
    Json(request): Json<FilterRequest>,
) -> Result<Json<ListResponse<AppointmentItem>>, AppError> {
    let page = state.appointment_service.search(&request).await?;
    Ok(Json(page.into()))
}

/// Lists the slots still bookable on a date.
///
/// # Endpoint
///
/// `GET /api/appointments/availability?date=YYYY-MM-DD`
///
/// Past dates and holidays return an empty list.
pub async fn availability_handler(
    State(state): State<AppState>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityResponse>, AppError> {
    let slots = state
        .appointment_service
        .available_slots(query.date)
        .await?;

    Ok(Json(AvailabilityResponse {
        date: query.date,
        slots: slots.into_iter().map(Into::into).collect(),
    }))
}

/// Loads one appointment.
///
/// # Endpoint
///
/// `GET /api/appointments/{id}`
///
/// # Errors
///
/// Returns 404 if the appointment does not exist.
pub async fn get_appointment_handler(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<AppointmentItem>, AppError> {
    let appointment = state.appointment_service.get(id).await?;
    Ok(Json(appointment.into()))
}

/// Moves a scheduled appointment to another slot, keeping its number.
///
/// # Endpoint
///
/// `PUT /api/appointments/{id}/reschedule`
///
/// # Errors
///
/// Same rules as booking, plus 409 when the appointment is no longer
/// scheduled or `row_version` is stale.
pub async fn reschedule_appointment_handler(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(payload): Json<RescheduleAppointmentRequest>,
) -> Result<Json<AppointmentItem>, AppError> {
    payload.validate()?;

    let appointment = state
        .appointment_service
        .reschedule(id, payload.row_version, payload.target())
        .await?;

    Ok(Json(appointment.into()))
}

/// Cancels a scheduled appointment.
///
/// # Endpoint
///
/// `POST /api/appointments/{id}/cancel`
///
/// # Errors
///
/// Returns 404 if the appointment does not exist.
/// Returns 409 if it is not scheduled or `row_version` is stale.
pub async fn cancel_appointment_handler(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(payload): Json<CancelAppointmentRequest>,
) -> Result<Json<AppointmentItem>, AppError> {
    payload.validate()?;

    let appointment = state
        .appointment_service
        .cancel(id, payload.row_version, payload.reason)
        .await?;

    Ok(Json(appointment.into()))
}

/// Marks a scheduled appointment as completed.
///
/// # Endpoint
///
/// `POST /api/appointments/{id}/complete`
pub async fn complete_appointment_handler(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(payload): Json<StatusChangeRequest>,
) -> Result<Json<AppointmentItem>, AppError> {
    let appointment = state
        .appointment_service
        .complete(id, payload.row_version)
        .await?;

    Ok(Json(appointment.into()))
}

/// Marks a scheduled appointment as missed.
///
/// # Endpoint
///
/// `POST /api/appointments/{id}/no-show`
pub async fn no_show_appointment_handler(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(payload): Json<StatusChangeRequest>,
) -> Result<Json<AppointmentItem>, AppError> {
    let appointment = state
        .appointment_service
        .mark_no_show(id, payload.row_version)
        .await?;

    Ok(Json(appointment.into()))
}
