//! Course controllers.
//!
//! Every course endpoint requires an authenticated client. Any client may
//! list and read courses; only the owner (`id_creador`) may update or delete.

use crate::{
    context::RequestContext,
    error::AppError,
    middleware::auth::AuthContext,
    models::course::{CourseChanges, NewCourse, Page},
    response::Envelope,
    state::AppState,
    store::DUPLICATE_TITLE,
    validation::{ValidationResult, field_text, validate_price, validate_text},
};
use serde_json::{Map, Value};
use std::num::IntErrorKind;

const REQUIRED_FIELDS: [&str; 4] = ["titulo", "descripcion", "instructor", "precio"];

fn validate_titulo(raw: &str) -> ValidationResult<String> {
    validate_text(raw, "titulo", 3, 100)
}

fn validate_descripcion(raw: &str) -> ValidationResult<String> {
    validate_text(raw, "descripcion", 10, 500)
}

fn validate_instructor(raw: &str) -> ValidationResult<String> {
    validate_text(raw, "instructor", 3, 100)
}

/// A blank image clears it.
fn validate_imagen(raw: &str) -> ValidationResult<Option<String>> {
    if raw.trim().is_empty() {
        return Ok(None);
    }
    validate_text(raw, "imagen", 0, 255).map(Some)
}

fn course_not_found() -> AppError {
    AppError::NotFound("No hay ningún curso registrado".to_string())
}

/// Ids too large for an `i64` cannot name a stored course.
fn parse_course_id(raw: &str) -> Result<i64, AppError> {
    let invalid = || AppError::BadRequest("ID de curso inválido".to_string());
    match raw.parse::<i64>() {
        Ok(id) if id >= 1 => Ok(id),
        Ok(_) => Err(invalid()),
        Err(err) if *err.kind() == IntErrorKind::PosOverflow => Err(course_not_found()),
        Err(_) => Err(invalid()),
    }
}

/// 409 if another course already uses the title.
async fn ensure_title_free(
    state: &AppState,
    titulo: &str,
    except: Option<i64>,
) -> Result<(), AppError> {
    let taken = state
        .store
        .list_courses(None)
        .await?
        .iter()
        .any(|course| course.titulo == titulo && Some(course.id) != except);

    if taken {
        return Err(AppError::Conflict(DUPLICATE_TITLE.to_string()));
    }
    Ok(())
}

/// List courses, optionally one page of ten.
///
/// # Response (200 OK)
///
/// ```json
/// { "status": 200, "total_registros": 2, "detalle": [ { "id": 1, "titulo": "…", "nombre": "Ana", … } ] }
/// ```
pub async fn index(state: &AppState, page: Option<i64>) -> Result<Envelope, AppError> {
    let page = page
        .map(|number| Page::number(number).ok_or_else(AppError::invalid_page))
        .transpose()?;
    let courses = state.store.list_courses(page).await?;

    Ok(Envelope::ok(&courses).with_total_registros(courses.len()))
}

/// Create a course owned by the caller.
///
/// # Request Body
///
/// ```json
/// {
///   "titulo": "Rust desde cero",
///   "descripcion": "Curso introductorio de Rust",
///   "instructor": "Ana Perez",
///   "precio": 1500.5,
///   "imagen": "img/rust.png"
/// }
/// ```
///
/// # Response
///
/// - **201 Created**: the stored course
/// - **400**: missing or invalid field
/// - **409**: title already used
pub async fn create(
    state: &AppState,
    caller: &AuthContext,
    ctx: &RequestContext,
) -> Result<Envelope, AppError> {
    let client = caller.client()?;
    let body = ctx.json_body()?;

    if let Some(missing) = REQUIRED_FIELDS
        .iter()
        .find(|field| field_text(body, field).is_none())
    {
        return Err(AppError::BadRequest(format!("Campo requerido: {missing}")));
    }
    let text = |field: &str| field_text(body, field).unwrap_or_default();

    let titulo = validate_titulo(&text("titulo"))?;
    let descripcion = validate_descripcion(&text("descripcion"))?;
    let instructor = validate_instructor(&text("instructor"))?;
    let precio = validate_price(&text("precio"))?;
    let imagen = match field_text(body, "imagen") {
        Some(raw) => validate_imagen(&raw)?,
        None => None,
    };

    ensure_title_free(state, &titulo, None).await?;

    let course = state
        .store
        .insert_course(NewCourse {
            titulo,
            descripcion,
            instructor,
            imagen,
            precio,
            id_creador: client.id,
        })
        .await?;
    tracing::info!(course_id = course.id, owner = client.id, "course created");

    Ok(Envelope::created(&course).with_message("Curso creado exitosamente"))
}

/// Fetch one course with its owner's name.
///
/// An unknown id is a 404.
pub async fn show(state: &AppState, id: &str) -> Result<Envelope, AppError> {
    let id = parse_course_id(id)?;

    let course = state
        .store
        .find_course(id)
        .await?
        .ok_or_else(course_not_found)?;

    Ok(Envelope::ok(&course))
}

/// Look up a course and insist the caller owns it.
async fn owned_course_id(
    state: &AppState,
    caller: &AuthContext,
    raw_id: &str,
    forbidden: &str,
) -> Result<i64, AppError> {
    let client = caller.client()?;
    let id = parse_course_id(raw_id)?;

    let course = state
        .store
        .find_course(id)
        .await?
        .ok_or_else(course_not_found)?;

    if course.id_creador != client.id {
        tracing::warn!(course_id = id, caller = client.id, "course ownership check failed");
        return Err(AppError::Forbidden(forbidden.to_string()));
    }

    Ok(id)
}

fn collect_changes(body: &Map<String, Value>) -> ValidationResult<CourseChanges> {
    let validate = |field: &str, check: fn(&str) -> ValidationResult<String>| {
        field_text(body, field).map(|raw| check(&raw)).transpose()
    };

    Ok(CourseChanges {
        titulo: validate("titulo", validate_titulo)?,
        descripcion: validate("descripcion", validate_descripcion)?,
        instructor: validate("instructor", validate_instructor)?,
        imagen: field_text(body, "imagen")
            .map(|raw| validate_imagen(&raw))
            .transpose()?,
        precio: field_text(body, "precio")
            .map(|raw| validate_price(&raw))
            .transpose()?,
    })
}

/// Update any subset of a course's fields.
///
/// The ownership check runs before the payload is even looked at, so a
/// non-owner always gets 403 and nothing is written. The body may be JSON or
/// urlencoded form data.
pub async fn update(
    state: &AppState,
    caller: &AuthContext,
    raw_id: &str,
    ctx: &RequestContext,
) -> Result<Envelope, AppError> {
    let id = owned_course_id(
        state,
        caller,
        raw_id,
        "No está autorizado para modificar este curso",
    )
    .await?;

    let body = ctx.json_or_form_body()?;
    let changes = collect_changes(&body)?;

    if let Some(titulo) = &changes.titulo {
        ensure_title_free(state, titulo, Some(id)).await?;
    }

    let course = state
        .store
        .update_course(id, changes)
        .await?
        .ok_or_else(course_not_found)?;
    tracing::info!(course_id = id, "course updated");

    Ok(Envelope::ok(&course).with_message("Registro exitoso, su curso ha sido actualizado"))
}

/// Delete a course owned by the caller.
pub async fn delete(
    state: &AppState,
    caller: &AuthContext,
    raw_id: &str,
) -> Result<Envelope, AppError> {
    let id = owned_course_id(
        state,
        caller,
        raw_id,
        "No está autorizado para eliminar este curso",
    )
    .await?;

    if !state.store.delete_course(id).await? {
        return Err(course_not_found());
    }
    tracing::info!(course_id = id, "course deleted");

    Ok(Envelope::ok_message("Se ha borrado el curso correctamente"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::validate_json_object;

    #[test]
    fn course_ids() {
        use axum::http::StatusCode;

        assert_eq!(parse_course_id("7").unwrap(), 7);
        assert_eq!(
            parse_course_id("0").unwrap_err().status(),
            StatusCode::BAD_REQUEST
        );
        // Too large to exist
        assert_eq!(
            parse_course_id("99999999999999999999999").unwrap_err().status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn changes_validate_only_present_fields() {
        let body = validate_json_object(br#"{"precio": "20", "imagen": ""}"#).unwrap();
        let changes = collect_changes(&body).unwrap();
        assert_eq!(changes.precio, Some(20.0));
        assert_eq!(changes.imagen, Some(None));
        assert!(changes.titulo.is_none());

        let body = validate_json_object(br#"{"titulo": "ab"}"#).unwrap();
        let err = collect_changes(&body).unwrap_err();
        assert_eq!(err.field, "titulo");
    }
}
