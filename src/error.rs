//! Error types and HTTP error response handling.
//!
//! This module defines all application errors and how they are converted
//! into the API's JSON envelope with the appropriate status code.

use crate::{response::Envelope, validation::ValidationError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Application-wide error type.
///
/// Each variant maps to one HTTP status. Messages are user-facing and never
/// carry internal details: storage failures are logged and replaced by a
/// generic text.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Database operation failed (connection error, query error).
    ///
    /// Returns HTTP 500 without leaking the underlying error text.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A field failed validation.
    ///
    /// Returns HTTP 400 with the validator's message verbatim.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Malformed request that is not tied to a single field.
    #[error("{0}")]
    BadRequest(String),

    /// Client credentials missing or not recognized.
    ///
    /// Returns HTTP 401. The message never says which half was wrong.
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated, but not allowed to touch this resource.
    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Método no permitido")]
    MethodNotAllowed,

    /// Uniqueness conflict (duplicate email or course title).
    #[error("{0}")]
    Conflict(String),

    /// Unexpected failure outside the database.
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn route_not_found() -> Self {
        Self::NotFound("Ruta no encontrada".to_string())
    }

    pub fn invalid_page() -> Self {
        Self::BadRequest("Número de página inválido".to_string())
    }

    pub fn invalid_credentials() -> Self {
        Self::Unauthorized("Credenciales de cliente inválidas".to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Convert AppError into an HTTP response.
///
/// # Response Format
///
/// ```json
/// {
///   "status": 404,
///   "mensaje": "Ruta no encontrada"
/// }
/// ```
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = match &self {
            AppError::Database(err) => {
                tracing::error!(error = %err, "database error");
                "Error interno del servidor".to_string()
            }
            AppError::Internal(detail) => {
                tracing::error!(error = %detail, "internal error");
                "Error interno del servidor".to_string()
            }
            other => other.to_string(),
        };

        Envelope::error(status, message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::validate_dni;

    #[test]
    fn status_mapping() {
        assert_eq!(AppError::route_not_found().status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::invalid_credentials().status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::MethodNotAllowed.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            AppError::Conflict("dup".into()).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Database(sqlx::Error::RowNotFound).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn validation_message_is_surfaced_verbatim() {
        let err: AppError = validate_dni("12").unwrap_err().into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "DNI debe contener entre 7 y 8 dígitos");
    }
}
