//! Core domain entities.
//!
//! Entities are plain data structures shared by every layer. Each editable
//! entity comes with a `*Draft` carrying the client-controlled fields used for
//! both creation and full (versioned) updates.
//!
//! # Entity Types
//!
//! - [`Beneficiary`] - A person who can book appointments
//! - [`Holiday`] - An inclusive date range closed for booking
//! - [`Schedule`] - A weekly opening window split into fixed-size slots
//! - [`Appointment`] - A booked slot with its sequential number and status
//!
//! Every entity carries `row_version` for optimistic locking. Soft-deleted
//! rows never leave the persistence layer.

pub mod appointment;
pub mod beneficiary;
pub mod holiday;
pub mod schedule;

pub use appointment::{Appointment, AppointmentStatus, BookedSlot, NewAppointment, SlotUsage};
pub use beneficiary::{Beneficiary, BeneficiaryDraft};
pub use holiday::{Holiday, HolidayDraft};
pub use schedule::{Schedule, ScheduleDraft};
