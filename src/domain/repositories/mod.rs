//! Repository trait definitions for the domain layer (the ports).
//!
//! Generic ports cover what every entity shares: lookup by id, structured
//! search, versioned update and soft delete. Entity-specific ports add the
//! queries that business rules need (uniqueness, overlaps, slot usage).
//!
//! # Architecture
//!
//! - Traits define the contract for data operations
//! - Implementations live in `crate::infrastructure::persistence`
//! - Mock implementations of the entity-specific ports are auto-generated via
//!   `mockall` for testing
//!
//! # Available Repositories
//!
//! - [`ReadRepository`] / [`CrudRepository`] - Generic CRUD over [`Resource`] / [`Editable`]
//! - [`BeneficiaryRepository`] - National id lookup, existence checks
//! - [`HolidayRepository`] - Holiday calendar
//! - [`ScheduleRepository`] - Weekly schedules per weekday
//! - [`AppointmentRepository`] - Booking, lifecycle and slot usage
//! - [`HealthRepository`] - Connectivity probe
//!
//! # Testing
//!
//! See integration tests in `tests/repository_*.rs` for usage examples.

pub mod appointment_repository;
pub mod beneficiary_repository;
pub mod crud_repository;
pub mod health_repository;
pub mod holiday_repository;
pub mod schedule_repository;

pub use appointment_repository::AppointmentRepository;
pub use beneficiary_repository::BeneficiaryRepository;
pub use crud_repository::{CrudRepository, Editable, ReadRepository, Resource};
pub use health_repository::HealthRepository;
pub use holiday_repository::HolidayRepository;
pub use schedule_repository::ScheduleRepository;

#[cfg(test)]
pub use appointment_repository::MockAppointmentRepository;
#[cfg(test)]
pub use beneficiary_repository::MockBeneficiaryRepository;
#[cfg(test)]
pub use health_repository::MockHealthRepository;
#[cfg(test)]
pub use holiday_repository::MockHolidayRepository;
#[cfg(test)]
pub use schedule_repository::MockScheduleRepository;
