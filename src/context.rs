//! Request-scoped context.
//!
//! The body is read exactly once into a buffer owned by [`RequestContext`];
//! the JSON object parsed from it is memoized in the same context. The
//! authenticator (looking for fallback credentials) and the controllers
//! (reading their payload) therefore share one buffer and one parse, and no
//! stage can find the input stream already drained by another.

use crate::{
    error::AppError,
    validation::{ValidationError, validate_json_object},
};
use axum::{
    body::{Body, Bytes},
    extract::ConnectInfo,
    http::{HeaderMap, Method, request::Parts},
};
use serde_json::{Map, Value};
use std::{borrow::Cow, net::SocketAddr, sync::OnceLock};

/// Largest request body accepted, declared or streamed.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

pub struct RequestContext {
    pub method: Method,
    headers: HeaderMap,
    query: Vec<(String, String)>,
    body: Bytes,
    json: OnceLock<Result<Map<String, Value>, ValidationError>>,
    client_addr: Option<SocketAddr>,
}

impl RequestContext {
    /// Build the context, buffering the body up to [`MAX_BODY_BYTES`].
    pub async fn read(parts: Parts, body: Body) -> Result<Self, AppError> {
        let body = axum::body::to_bytes(body, MAX_BODY_BYTES)
            .await
            .map_err(|_| AppError::BadRequest(payload_too_large()))?;

        let client_addr = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);

        let mut context = Self::new(parts.method, parts.uri.query(), parts.headers, body);
        context.client_addr = client_addr;
        Ok(context)
    }

    pub fn new(method: Method, query: Option<&str>, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            method,
            headers,
            query: parse_query(query),
            body,
            json: OnceLock::new(),
            client_addr: None,
        }
    }

    /// First value of a query parameter.
    pub fn query(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn user_agent(&self) -> &str {
        self.header("user-agent").unwrap_or("unknown")
    }

    pub fn client_ip(&self) -> String {
        self.client_addr
            .map(|addr| addr.ip().to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }

    /// The body as a JSON object, parsed on first use and memoized.
    pub fn json_body(&self) -> Result<&Map<String, Value>, ValidationError> {
        self.json
            .get_or_init(|| validate_json_object(&self.body))
            .as_ref()
            .map_err(Clone::clone)
    }

    /// The body as a JSON object or, failing that, as an urlencoded form.
    ///
    /// The form fallback applies only when the buffer decodes to at least one
    /// `key=value` pair with a non-empty value; otherwise the JSON error is
    /// reported.
    pub fn json_or_form_body(&self) -> Result<Cow<'_, Map<String, Value>>, ValidationError> {
        let json_err = match self.json_body() {
            Ok(map) => return Ok(Cow::Borrowed(map)),
            Err(err) => err,
        };

        let pairs: Vec<(String, String)> = url::form_urlencoded::parse(&self.body)
            .into_owned()
            .collect();
        if !pairs.iter().any(|(_, v)| !v.is_empty()) {
            return Err(json_err);
        }

        Ok(Cow::Owned(
            pairs
                .into_iter()
                .map(|(k, v)| (k, Value::String(v)))
                .collect(),
        ))
    }
}

fn parse_query(query: Option<&str>) -> Vec<(String, String)> {
    query
        .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default()
}

pub fn payload_too_large() -> String {
    format!("El cuerpo de la solicitud supera el máximo de {MAX_BODY_BYTES} bytes")
}
