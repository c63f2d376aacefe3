//! Service layer: logic that is neither routing nor persistence.

/// Client credential derivation
pub mod credentials;
/// Photo files and the photo access log
pub mod photos;
