//! Domain layer containing business entities and rules.
//!
//! This module defines entities, the structured filter model, pure scheduling
//! rules and repository interfaces, independent of infrastructure concerns.
//!
//! # Architecture
//!
//! - [`entities`] - Core business data structures
//! - [`filter`] - Structured search requests and paged results
//! - [`scheduling`] - Calendar, slot and numbering rules
//! - [`repositories`] - Data access trait definitions
//!
//! # Design Principles
//!
//! - Domain layer has no dependencies on infrastructure or presentation layers
//! - Repository traits define contracts implemented by infrastructure layer
//! - Business logic is orchestrated by services (see [`crate::application::services`])

pub mod entities;
pub mod filter;
pub mod repositories;
pub mod scheduling;
