//! Liveness probe, served outside the API prefix at `GET /health`.

use crate::{error::AppError, response::Envelope, state::AppState};
use axum::extract::State;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthDetail {
    pub servicio: &'static str,

    /// Store connectivity
    pub base_datos: &'static str,

    /// Prefix the API is mounted under
    pub base_path: String,

    pub timestamp: DateTime<Utc>,
}

/// Report liveness after a store round trip.
///
/// ```json
/// {
///   "status": 200,
///   "detalle": {
///     "servicio": "activo",
///     "base_datos": "conectada",
///     "base_path": "api",
///     "timestamp": "2025-12-21T19:00:00Z"
///   }
/// }
/// ```
///
/// An unreachable store yields the generic 500 envelope.
pub async fn health_check(State(state): State<AppState>) -> Result<Envelope, AppError> {
    state.store.ping().await?;

    Ok(Envelope::ok(HealthDetail {
        servicio: "activo",
        base_datos: "conectada",
        base_path: state.base_path.to_string(),
        timestamp: Utc::now(),
    }))
}
