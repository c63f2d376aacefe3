//! Data models representing database entities.
//!
//! This module contains all data structures that map to database tables,
//! plus the validated inputs and response views derived from them.

/// Client (API consumer) model
pub mod client;
/// Course model
pub mod course;
/// Student model
pub mod student;
