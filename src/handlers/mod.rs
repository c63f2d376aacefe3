//! Controllers.
//!
//! Each controller receives the shared state, the request context and, where
//! relevant, the authenticated caller; it validates its input before touching
//! the store and returns a response envelope or an [`AppError`](crate::error::AppError).

/// Client registration and listing
pub mod clients;
/// Course CRUD
pub mod courses;
/// Liveness probe
pub mod health;
/// Student token lookups and photos
pub mod students;
