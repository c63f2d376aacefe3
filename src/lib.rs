//! Course marketplace and student credential API.
//!
//! A small REST service with three resources mounted under a configurable
//! base path segment:
//!
//! - `cursos`: courses owned by clients (CRUD, pagination)
//! - `clientes`: external API consumers, registered with derived credentials
//! - `alumnos`: read-only student lookups and photos, guarded by per-student tokens
//!
//! # Architecture
//!
//! - **Web Framework**: Axum, with a single fallback handler doing the routing
//! - **Database**: PostgreSQL with sqlx, behind the [`store::Store`] trait
//! - **Authentication**: client credential pairs compared in constant time
//! - **Format**: JSON envelope `{status, mensaje?, total?, total_registros?, detalle?}`

pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod response;
pub mod router;
pub mod services;
pub mod state;
pub mod store;
pub mod validation;

use axum::{Router, routing::get};
use state::AppState;
use tower_http::trace::TraceLayer;

/// Build the HTTP application.
///
/// `/health` is served directly; everything else goes through
/// [`router::dispatch`].
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .fallback(router::dispatch)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
