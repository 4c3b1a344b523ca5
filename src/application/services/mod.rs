//! Business logic services for the application layer.

pub mod appointment_service;
pub mod beneficiary_hooks;
pub mod crud_service;
pub mod holiday_hooks;
pub mod schedule_hooks;

pub use appointment_service::{
    AppointmentService, AvailableSlot, BookingRequest, DEFAULT_BOOKING_HORIZON_DAYS,
    RescheduleRequest,
};
pub use beneficiary_hooks::BeneficiaryHooks;
pub use crud_service::{CrudHooks, CrudService};
pub use holiday_hooks::HolidayHooks;
pub use schedule_hooks::ScheduleHooks;
