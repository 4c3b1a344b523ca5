//! PostgreSQL repository implementations.
//!
//! Concrete implementations of the domain ports using SQLx runtime queries
//! and [`sqlx::QueryBuilder`] for filtered search.
//!
//! # Building blocks
//!
//! - [`specification`] - Whitelisted table descriptions and filter-to-SQL compilation
//! - [`base_repository`] - Search, versioned update and soft delete shared by every table
//!
//! # Repositories
//!
//! - [`PgBeneficiaryRepository`] - Beneficiaries
//! - [`PgHolidayRepository`] - Holiday calendar
//! - [`PgScheduleRepository`] - Weekly schedules
//! - [`PgAppointmentRepository`] - Bookings, numbering and slot usage
//! - [`PgHealthRepository`] - Connectivity probe

pub mod base_repository;
pub mod pg_appointment_repository;
pub mod pg_beneficiary_repository;
pub mod pg_health_repository;
pub mod pg_holiday_repository;
pub mod pg_schedule_repository;
pub mod specification;

pub use base_repository::BaseRepository;
pub use pg_appointment_repository::PgAppointmentRepository;
pub use pg_beneficiary_repository::PgBeneficiaryRepository;
pub use pg_health_repository::PgHealthRepository;
pub use pg_holiday_repository::PgHolidayRepository;
pub use pg_schedule_repository::PgScheduleRepository;
