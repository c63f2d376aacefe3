//! Client credential authentication.
//!
//! Every route requires a client credential pair except the ones in
//! [`PUBLIC_ROUTES`]. For the rest:
//!
//! 1. Take `X-Client-Id` / `X-Secret-Key` from the headers
//! 2. Failing that, on POST/PUT, take `id_cliente` / `llave_secreta` from the
//!    JSON body (after the declared length was checked)
//! 3. Compare the pair against every stored client in constant time
//! 4. Reject with HTTP 401 when either half is missing or nothing matches
//!
//! Students are not authenticated here: their opaque token is checked by the
//! student controller.

use crate::{
    context::{MAX_BODY_BYTES, RequestContext, payload_too_large},
    error::AppError,
    models::client::Client,
    router::RouteMatch,
    store::Store,
    validation::field_text,
};
use axum::http::{HeaderMap, Method, header::CONTENT_LENGTH};
use subtle::ConstantTimeEq;

pub const CLIENT_ID_HEADER: &str = "x-client-id";
pub const SECRET_KEY_HEADER: &str = "x-secret-key";

/// (method, leading path segments) pairs that skip client authentication.
pub const PUBLIC_ROUTES: [(Method, &[&str]); 2] = [
    // Client registration
    (Method::POST, &["clientes"]),
    // Student DNI -> token lookup
    (Method::POST, &["alumnos", "token"]),
];

/// Who is making the request.
#[derive(Debug, Clone)]
pub enum AuthContext {
    /// Route in the public allowlist
    Public,
    /// Verified client
    Client(Client),
}

impl AuthContext {
    /// The authenticated client, or 401 on a public context.
    pub fn client(&self) -> Result<&Client, AppError> {
        match self {
            AuthContext::Client(client) => Ok(client),
            AuthContext::Public => Err(AppError::invalid_credentials()),
        }
    }
}

/// Whether a request bypasses client authentication.
pub fn is_public(method: &Method, segments: &[String]) -> bool {
    PUBLIC_ROUTES.iter().any(|(public_method, prefix)| {
        public_method == method
            && segments.len() >= prefix.len()
            && prefix.iter().zip(segments).all(|(p, s)| *p == s.as_str())
    })
}

/// Reject bodies whose declared size exceeds [`MAX_BODY_BYTES`] before
/// anything is read or parsed.
pub fn ensure_declared_length(headers: &HeaderMap) -> Result<(), AppError> {
    let declared = headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());

    match declared {
        Some(len) if len > MAX_BODY_BYTES as u64 => {
            Err(AppError::BadRequest(payload_too_large()))
        }
        _ => Ok(()),
    }
}

/// Supplied credential pair, from headers or body.
#[derive(Debug, PartialEq, Eq)]
struct Credentials {
    client_id: String,
    secret_key: String,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Headers take precedence as a pair; the body is only consulted when the
/// header pair is incomplete, and only for POST/PUT.
fn extract_credentials(ctx: &RequestContext) -> Option<Credentials> {
    let from_headers = (
        non_empty(ctx.header(CLIENT_ID_HEADER).map(str::to_string)),
        non_empty(ctx.header(SECRET_KEY_HEADER).map(str::to_string)),
    );
    if let (Some(client_id), Some(secret_key)) = from_headers {
        return Some(Credentials {
            client_id,
            secret_key,
        });
    }

    if ctx.method != Method::POST && ctx.method != Method::PUT {
        return None;
    }

    // A body that is not a JSON object just carries no credentials
    let body = ctx.json_body().ok()?;
    Some(Credentials {
        client_id: non_empty(field_text(body, "id_cliente"))?,
        secret_key: non_empty(field_text(body, "llave_secreta"))?,
    })
}

/// Find the client owning the pair.
///
/// Every client is compared, and both halves are compared in constant time,
/// so the response time does not depend on where or how closely a pair matched.
fn find_client(clients: Vec<Client>, credentials: &Credentials) -> Option<Client> {
    let mut found = None;
    for client in clients {
        let id_ok = client
            .id_cliente
            .as_bytes()
            .ct_eq(credentials.client_id.as_bytes());
        let key_ok = client
            .llave_secreta
            .as_bytes()
            .ct_eq(credentials.secret_key.as_bytes());
        if bool::from(id_ok & key_ok) && found.is_none() {
            found = Some(client);
        }
    }
    found
}

/// Decide who is calling.
pub async fn authenticate(
    store: &dyn Store,
    matched: &RouteMatch,
    ctx: &RequestContext,
) -> Result<AuthContext, AppError> {
    if is_public(&matched.method, &matched.segments) {
        return Ok(AuthContext::Public);
    }

    let credentials = extract_credentials(ctx).ok_or_else(|| {
        AppError::Unauthorized("Credenciales de cliente requeridas".to_string())
    })?;

    let clients = store.list_clients().await?;
    match find_client(clients, &credentials) {
        Some(client) => {
            tracing::debug!(client_id = client.id, "client authenticated");
            Ok(AuthContext::Client(client))
        }
        None => {
            tracing::warn!(route = ?matched.route, "rejected client credentials");
            Err(AppError::invalid_credentials())
        }
    }
}
