//! Request gatekeeping.
//!
//! Runs between route resolution and the controllers: it can reject a
//! request before any business logic sees it.

/// Client credential authentication
pub mod auth;
