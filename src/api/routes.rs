//! API route configuration.

use crate::api::handlers::{
    CrudEndpoint, availability_handler, book_appointment_handler, cancel_appointment_handler,
    complete_appointment_handler, create_handler, delete_handler, get_appointment_handler,
    get_handler, list_handler, no_show_appointment_handler, reschedule_appointment_handler,
    search_appointments_handler, search_handler, update_handler,
};
use crate::domain::entities::{Beneficiary, Holiday, Schedule};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post, put},
};

/// The five CRUD routes of one resource, mounted under `/{path}`.
fn crud_routes<E: CrudEndpoint>(path: &str) -> Router<AppState> {
    Router::new()
        .route(
            &format!("/{path}"),
            get(list_handler::<E>).post(create_handler::<E>),
        )
        .route(&format!("/{path}/search"), post(search_handler::<E>))
        .route(
            &format!("/{path}/{{id}}"),
            get(get_handler::<E>)
                .put(update_handler::<E>)
                .delete(delete_handler::<E>),
        )
}

/// Read endpoints.
///
/// # Endpoints
///
/// - `GET  /beneficiaries`, `/holidays`, `/schedules` - Paginated lists
/// - `GET  /{resource}/{id}`                          - Single resource
/// - `POST /{resource}/search`                        - Structured search
/// - `POST /appointments/search`                      - Appointment search
/// - `GET  /appointments/availability?date=`          - Bookable slots
/// - `GET  /appointments/{id}`                        - Single appointment
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(crud_routes::<Beneficiary>("beneficiaries"))
        .merge(crud_routes::<Holiday>("holidays"))
        .merge(crud_routes::<Schedule>("schedules"))
        .route("/appointments/search", post(search_appointments_handler))
        .route("/appointments/availability", get(availability_handler))
        .route("/appointments/{id}", get(get_appointment_handler))
}

/// Booking endpoints, rate limited separately.
///
/// # Endpoints
///
/// - `POST /appointments`                   - Book a slot
/// - `PUT  /appointments/{id}/reschedule`   - Move to another slot
/// - `POST /appointments/{id}/cancel`       - Cancel
/// - `POST /appointments/{id}/complete`     - Mark completed
/// - `POST /appointments/{id}/no-show`      - Mark missed
pub fn booking_routes() -> Router<AppState> {
    Router::new()
        .route("/appointments", post(book_appointment_handler))
        .route(
            "/appointments/{id}/reschedule",
            put(reschedule_appointment_handler),
        )
        .route("/appointments/{id}/cancel", post(cancel_appointment_handler))
        .route(
            "/appointments/{id}/complete",
            post(complete_appointment_handler),
        )
        .route("/appointments/{id}/no-show", post(no_show_appointment_handler))
}
