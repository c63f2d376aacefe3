//! Uniform JSON response envelope.
//!
//! Every response except a photo download is a single envelope:
//!
//! ```json
//! {
//!   "status": 200,
//!   "mensaje": "optional message",
//!   "total": 3,
//!   "detalle": [ ... ]
//! }
//! ```
//!
//! `total` accompanies client listings and `total_registros` course listings;
//! both are omitted elsewhere.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Serialize)]
pub struct Envelope {
    pub status: u16,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub mensaje: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_registros: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub detalle: Option<Value>,
}

impl Envelope {
    fn with_status(status: StatusCode) -> Self {
        Self {
            status: status.as_u16(),
            mensaje: None,
            total: None,
            total_registros: None,
            detalle: None,
        }
    }

    /// 200 carrying `detalle`.
    pub fn ok(detalle: impl Serialize) -> Self {
        Self::with_status(StatusCode::OK).with_detail(detalle)
    }

    /// 201 carrying `detalle`.
    pub fn created(detalle: impl Serialize) -> Self {
        Self::with_status(StatusCode::CREATED).with_detail(detalle)
    }

    /// 200 carrying only a message.
    pub fn ok_message(mensaje: impl Into<String>) -> Self {
        Self::with_status(StatusCode::OK).with_message(mensaje)
    }

    /// Error envelope: status and message only.
    pub fn error(status: StatusCode, mensaje: impl Into<String>) -> Self {
        Self::with_status(status).with_message(mensaje)
    }

    pub fn with_message(mut self, mensaje: impl Into<String>) -> Self {
        self.mensaje = Some(mensaje.into());
        self
    }

    pub fn with_total(mut self, total: usize) -> Self {
        self.total = Some(total);
        self
    }

    pub fn with_total_registros(mut self, total: usize) -> Self {
        self.total_registros = Some(total);
        self
    }

    fn with_detail(mut self, detalle: impl Serialize) -> Self {
        self.detalle = match serde_json::to_value(detalle) {
            Ok(Value::Null) => None,
            Ok(value) => Some(value),
            Err(err) => {
                tracing::error!(error = %err, "failed to serialize response detail");
                None
            }
        };
        self
    }
}

impl IntoResponse for Envelope {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn optional_fields_are_omitted() {
        let value = serde_json::to_value(Envelope::error(StatusCode::NOT_FOUND, "x")).unwrap();
        assert_eq!(value, json!({"status": 404, "mensaje": "x"}));
    }

    #[test]
    fn listing_shape() {
        let envelope = Envelope::ok(vec![1, 2]).with_total_registros(2);
        let value = serde_json::to_value(envelope).unwrap();
        assert_eq!(
            value,
            json!({"status": 200, "total_registros": 2, "detalle": [1, 2]})
        );
    }
}
