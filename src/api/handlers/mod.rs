//! HTTP request handlers for API endpoints.
//!
//! [`crud`] holds the generic handlers shared by beneficiaries, holidays and
//! schedules; the per-resource modules bind them to DTOs and services.

pub mod appointments;
pub mod beneficiaries;
pub mod crud;
pub mod health;
pub mod holidays;
pub mod schedules;

pub use appointments::{
    availability_handler, book_appointment_handler, cancel_appointment_handler,
    complete_appointment_handler, get_appointment_handler, no_show_appointment_handler,
    reschedule_appointment_handler, search_appointments_handler,
};
pub use crud::{
    CrudEndpoint, create_handler, delete_handler, get_handler, list_handler, search_handler,
    update_handler,
};
pub use health::health_handler;
