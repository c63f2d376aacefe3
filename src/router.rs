//! Request routing and dispatch.
//!
//! The API exposes a fixed table of routes under a configurable base prefix
//! segment:
//!
//! | Method | Path | Operation |
//! |---|---|---|
//! | GET/POST | `/cursos` | list / create courses |
//! | GET | `/cursos?pagina=N` | paginated listing |
//! | GET/PUT/DELETE | `/cursos/{id}` | show / update / delete a course |
//! | GET/POST | `/clientes` | list / create clients |
//! | POST | `/alumnos` | student lookup by token |
//! | POST | `/alumnos/token` | token lookup by DNI |
//! | GET | `/alumnos/foto/{legajo}?token=T` | student photo |
//!
//! [`resolve`] is a pure function from (method, path, query) to a [`Route`] or
//! a terminal error. [`dispatch`] is the single axum handler that resolves,
//! authenticates and hands the request to a controller.

use crate::{
    context::RequestContext,
    error::AppError,
    handlers::{clients, courses, students},
    middleware::auth,
    models::course::Page,
    state::AppState,
};
use axum::{
    extract::{Request, State},
    http::Method,
    response::{IntoResponse, Response},
};

/// Top-level resources.
pub const RESOURCES: [&str; 3] = ["cursos", "clientes", "alumnos"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `page` is already validated (>= 1) when present
    ListCourses { page: Option<i64> },
    CreateCourse,
    ShowCourse { id: String },
    UpdateCourse { id: String },
    DeleteCourse { id: String },
    ListClients,
    CreateClient,
    StudentByToken,
    TokenByDni,
    StudentPhoto { legajo: String },
}

/// A resolved route plus the path segments (after the base prefix) it was
/// resolved from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    pub method: Method,
    pub segments: Vec<String>,
    pub route: Route,
}

/// Resolve a request against the route table.
///
/// Without the base prefix in the path no routing is performed and the
/// request is answered as an unknown route.
pub fn resolve(
    method: &Method,
    path: &str,
    query: Option<&str>,
    base_path: &str,
) -> Result<RouteMatch, AppError> {
    let all: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let base = all
        .iter()
        .position(|s| *s == base_path)
        .ok_or_else(AppError::route_not_found)?;
    let segments: Vec<String> = all[base + 1..].iter().map(|s| s.to_string()).collect();

    let route = match_route(method, &segments, query)?;

    Ok(RouteMatch {
        method: method.clone(),
        segments,
        route,
    })
}

fn match_route(
    method: &Method,
    segments: &[String],
    query: Option<&str>,
) -> Result<Route, AppError> {
    let parts: Vec<&str> = segments.iter().map(String::as_str).collect();

    // Pagination takes priority over every other course route
    if parts.first() == Some(&"cursos") {
        if let Some(raw) = query_param(query, "pagina") {
            return Ok(Route::ListCourses {
                page: Some(parse_page(&raw)?),
            });
        }
    }

    match parts.as_slice() {
        [] => Err(AppError::route_not_found()),
        [top, ..] if !RESOURCES.contains(top) => Err(AppError::route_not_found()),

        ["cursos"] => match *method {
            Method::GET => Ok(Route::ListCourses { page: None }),
            Method::POST => Ok(Route::CreateCourse),
            _ => Err(AppError::MethodNotAllowed),
        },
        ["cursos", id] if is_numeric(id) => {
            let id = id.to_string();
            match *method {
                Method::GET => Ok(Route::ShowCourse { id }),
                Method::PUT => Ok(Route::UpdateCourse { id }),
                Method::DELETE => Ok(Route::DeleteCourse { id }),
                _ => Err(AppError::MethodNotAllowed),
            }
        }

        ["clientes"] => match *method {
            Method::GET => Ok(Route::ListClients),
            Method::POST => Ok(Route::CreateClient),
            _ => Err(AppError::MethodNotAllowed),
        },

        ["alumnos"] => match *method {
            Method::POST => Ok(Route::StudentByToken),
            _ => Err(AppError::MethodNotAllowed),
        },
        ["alumnos", "token"] => match *method {
            Method::POST => Ok(Route::TokenByDni),
            _ => Err(AppError::MethodNotAllowed),
        },
        ["alumnos", "foto", legajo] => match *method {
            Method::GET => Ok(Route::StudentPhoto {
                legajo: legajo.to_string(),
            }),
            _ => Err(AppError::MethodNotAllowed),
        },

        _ => Err(AppError::route_not_found()),
    }
}

fn is_numeric(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

fn query_param(query: Option<&str>, key: &str) -> Option<String> {
    url::form_urlencoded::parse(query?.as_bytes())
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

/// A page is valid when it maps to a representable window.
fn parse_page(raw: &str) -> Result<i64, AppError> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .filter(|page| Page::number(*page).is_some())
        .ok_or_else(AppError::invalid_page)
}

/// Single entry point for every API request.
pub async fn dispatch(State(state): State<AppState>, request: Request) -> Response {
    match handle(&state, request).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

async fn handle(state: &AppState, request: Request) -> Result<Response, AppError> {
    let (parts, body) = request.into_parts();

    let matched = resolve(
        &parts.method,
        parts.uri.path(),
        parts.uri.query(),
        &state.base_path,
    )?;
    tracing::debug!(method = %matched.method, route = ?matched.route, "route resolved");

    auth::ensure_declared_length(&parts.headers)?;
    let ctx = RequestContext::read(parts, body).await?;
    let caller = auth::authenticate(state.store.as_ref(), &matched, &ctx).await?;

    let response = match matched.route {
        Route::ListCourses { page } => courses::index(state, page).await?.into_response(),
        Route::CreateCourse => courses::create(state, &caller, &ctx).await?.into_response(),
        Route::ShowCourse { id } => courses::show(state, &id).await?.into_response(),
        Route::UpdateCourse { id } => {
            courses::update(state, &caller, &id, &ctx).await?.into_response()
        }
        Route::DeleteCourse { id } => courses::delete(state, &caller, &id).await?.into_response(),
        Route::ListClients => clients::index(state).await?.into_response(),
        Route::CreateClient => clients::create(state, &ctx).await?.into_response(),
        Route::StudentByToken => students::find_by_token(state, &ctx).await?.into_response(),
        Route::TokenByDni => students::token_by_dni(state, &ctx).await?.into_response(),
        Route::StudentPhoto { legajo } => students::photo(state, &legajo, &ctx).await?,
    };

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn route(method: Method, path: &str, query: Option<&str>) -> Result<Route, StatusCode> {
        resolve(&method, path, query, "api")
            .map(|m| m.route)
            .map_err(|e| e.status())
    }

    #[test]
    fn prefix_is_located_anywhere_in_the_path() {
        assert_eq!(
            route(Method::GET, "/api/cursos", None),
            Ok(Route::ListCourses { page: None })
        );
        assert_eq!(
            route(Method::GET, "/deploy/v2/api/clientes/", None),
            Ok(Route::ListClients)
        );
        assert_eq!(
            route(Method::GET, "//api//cursos//7", None),
            Ok(Route::ShowCourse { id: "7".into() })
        );
    }

    #[test]
    fn missing_prefix_or_resource_is_not_found() {
        assert_eq!(route(Method::GET, "/cursos", None), Err(StatusCode::NOT_FOUND));
        assert_eq!(route(Method::GET, "/api", None), Err(StatusCode::NOT_FOUND));
        assert_eq!(route(Method::GET, "/api/profesores", None), Err(StatusCode::NOT_FOUND));
    }

    #[test]
    fn course_routes() {
        assert_eq!(route(Method::POST, "/api/cursos", None), Ok(Route::CreateCourse));
        assert_eq!(
            route(Method::PUT, "/api/cursos/12", None),
            Ok(Route::UpdateCourse { id: "12".into() })
        );
        assert_eq!(
            route(Method::DELETE, "/api/cursos/12", None),
            Ok(Route::DeleteCourse { id: "12".into() })
        );
        assert_eq!(route(Method::GET, "/api/cursos/abc", None), Err(StatusCode::NOT_FOUND));
        assert_eq!(route(Method::GET, "/api/cursos/1/x", None), Err(StatusCode::NOT_FOUND));
        assert_eq!(
            route(Method::DELETE, "/api/cursos", None),
            Err(StatusCode::METHOD_NOT_ALLOWED)
        );
        assert_eq!(
            route(Method::POST, "/api/cursos/3", None),
            Err(StatusCode::METHOD_NOT_ALLOWED)
        );
    }

    #[test]
    fn pagination_short_circuits_course_dispatch() {
        assert_eq!(
            route(Method::GET, "/api/cursos", Some("pagina=2")),
            Ok(Route::ListCourses { page: Some(2) })
        );
        // Takes priority even over item routes and other verbs
        assert_eq!(
            route(Method::POST, "/api/cursos/4", Some("pagina=1")),
            Ok(Route::ListCourses { page: Some(1) })
        );
        for bad in [
            "pagina=0",
            "pagina=abc",
            "pagina=",
            "pagina=-3",
            "pagina=1.5",
            "pagina=9223372036854775807",
            "pagina=99999999999999999999",
        ] {
            assert_eq!(
                route(Method::GET, "/api/cursos", Some(bad)),
                Err(StatusCode::BAD_REQUEST),
                "{bad}"
            );
        }
        // Ignored outside cursos
        assert_eq!(
            route(Method::GET, "/api/clientes", Some("pagina=abc")),
            Ok(Route::ListClients)
        );
    }

    #[test]
    fn client_routes() {
        assert_eq!(route(Method::POST, "/api/clientes", None), Ok(Route::CreateClient));
        assert_eq!(
            route(Method::PUT, "/api/clientes", None),
            Err(StatusCode::METHOD_NOT_ALLOWED)
        );
        assert_eq!(route(Method::GET, "/api/clientes/1", None), Err(StatusCode::NOT_FOUND));
    }

    #[test]
    fn student_routes() {
        assert_eq!(route(Method::POST, "/api/alumnos", None), Ok(Route::StudentByToken));
        assert_eq!(
            route(Method::GET, "/api/alumnos", None),
            Err(StatusCode::METHOD_NOT_ALLOWED)
        );
        assert_eq!(route(Method::POST, "/api/alumnos/token", None), Ok(Route::TokenByDni));
        assert_eq!(
            route(Method::GET, "/api/alumnos/token", None),
            Err(StatusCode::METHOD_NOT_ALLOWED)
        );
        assert_eq!(
            route(Method::GET, "/api/alumnos/foto/1234", Some("token=ABCDEFGHIJ")),
            Ok(Route::StudentPhoto { legajo: "1234".into() })
        );
        assert_eq!(
            route(Method::POST, "/api/alumnos/foto/1234", None),
            Err(StatusCode::METHOD_NOT_ALLOWED)
        );
        assert_eq!(route(Method::GET, "/api/alumnos/foto", None), Err(StatusCode::NOT_FOUND));
        assert_eq!(route(Method::POST, "/api/alumnos/otro", None), Err(StatusCode::NOT_FOUND));
    }

    #[test]
    fn segments_after_prefix_are_kept() {
        let matched = resolve(&Method::POST, "/x/api/alumnos/token", None, "api").unwrap();
        assert_eq!(matched.segments, vec!["alumnos", "token"]);
        assert_eq!(matched.method, Method::POST);
    }
}
