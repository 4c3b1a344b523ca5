//! Data Transfer Objects for API requests and responses.
//!
//! All DTOs use Serde for JSON serialization/deserialization and validator
//! for input validation. Structured searches accept
//! [`crate::domain::filter::FilterRequest`] directly as their body.

pub mod appointment;
pub mod beneficiary;
pub mod health;
pub mod holiday;
pub mod pagination;
pub mod schedule;
pub mod versioned;
