//! Application layer services implementing business logic.
//!
//! This layer orchestrates domain operations by coordinating repository calls,
//! validation, and business rules. Services consume repository traits and provide
//! a clean API for HTTP handlers.
//!
//! # Available Services
//!
//! - [`services::CrudService`] - Create, read, update, delete and search for
//!   beneficiaries, holidays and schedules, extended per entity by
//!   [`services::BeneficiaryHooks`], [`services::HolidayHooks`] and
//!   [`services::ScheduleHooks`]
//! - [`services::AppointmentService`] - Availability, booking, rescheduling
//!   and status changes

pub mod services;
