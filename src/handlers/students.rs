//! Student controllers.
//!
//! Students prove access with their own opaque token rather than with client
//! credentials. Status policy, applied on every token endpoint:
//!
//! - malformed token: 400
//! - well-formed token that matches no student: 404
//! - token valid but for a different legajo: 403

use crate::{
    context::RequestContext,
    error::AppError,
    models::student::StudentResponse,
    response::Envelope,
    services::photos::PhotoAccess,
    state::AppState,
    validation::{field_text, validate_dni, validate_legajo, validate_token},
};
use axum::{
    http::header,
    response::{IntoResponse, Response},
};
use serde_json::json;

fn unknown_token() -> AppError {
    AppError::NotFound("Alumno no encontrado o token inválido".to_string())
}

/// Resolve a student from its token.
///
/// # Endpoint
///
/// `POST /alumnos` with `{ "token": "…" }`
///
/// # Response (200 OK)
///
/// ```json
/// {
///   "status": 200,
///   "detalle": {
///     "alumno": {
///       "legajo": "1234",
///       "nombres": "Ana Perez",
///       "dni": "30111222",
///       "pertenece": true,
///       "foto": "alumnos/foto/1234?token=…"
///     }
///   }
/// }
/// ```
pub async fn find_by_token(state: &AppState, ctx: &RequestContext) -> Result<Envelope, AppError> {
    let body = ctx.json_body()?;
    let raw = field_text(body, "token")
        .ok_or_else(|| AppError::BadRequest("Token requerido".to_string()))?;
    let token = validate_token(&raw)?;

    let student = state
        .store
        .find_student_by_token(&token)
        .await?
        .ok_or_else(unknown_token)?;

    Ok(Envelope::ok(json!({
        "alumno": StudentResponse::new(student, &token)
    })))
}

/// Resolve a student's token from its DNI.
///
/// Public endpoint: only the token is returned, never other student fields.
pub async fn token_by_dni(state: &AppState, ctx: &RequestContext) -> Result<Envelope, AppError> {
    let body = ctx.json_body()?;
    let raw = field_text(body, "dni")
        .ok_or_else(|| AppError::BadRequest("DNI requerido".to_string()))?;
    let dni = validate_dni(&raw)?;

    let token = state
        .store
        .find_token_by_dni(&dni)
        .await?
        .ok_or_else(|| AppError::NotFound("Alumno no encontrado".to_string()))?;

    Ok(Envelope::ok(json!({ "token": token })))
}

/// Stream a student's photo.
///
/// # Endpoint
///
/// `GET /alumnos/foto/{legajo}?token=…`
///
/// On success the body is the raw image (`image/png` or `image/jpeg`), not an
/// envelope, and the access is appended to the photo access log. A failing
/// log append never fails the download.
pub async fn photo(
    state: &AppState,
    raw_legajo: &str,
    ctx: &RequestContext,
) -> Result<Response, AppError> {
    let legajo = validate_legajo(raw_legajo)?;
    let token = validate_token(ctx.query("token").unwrap_or_default())?;

    let student = state
        .store
        .find_student_by_token(&token)
        .await?
        .ok_or_else(unknown_token)?;

    if student.legajo.trim() != legajo {
        tracing::warn!(legajo = %legajo, "photo token belongs to another legajo");
        return Err(AppError::Forbidden(
            "Legajo no coincide con el token".to_string(),
        ));
    }

    let not_found = || AppError::NotFound("Imagen no encontrada".to_string());
    let reference = student
        .foto
        .as_deref()
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .ok_or_else(not_found)?;
    let photo = state.photos.read(reference).await?.ok_or_else(not_found)?;

    let ip = ctx.client_ip();
    state
        .access_log
        .record(&PhotoAccess {
            legajo: &legajo,
            token: &token,
            ip: &ip,
            user_agent: ctx.user_agent(),
        })
        .await;

    Ok((
        [
            (header::CONTENT_TYPE, photo.content_type.to_string()),
            (header::CONTENT_LENGTH, photo.bytes.len().to_string()),
        ],
        photo.bytes,
    )
        .into_response())
}
