//! Student data model.
//!
//! Students are read-only here: rows come from the enrollment system and are
//! only looked up by opaque token or by DNI.

use serde::Serialize;

/// Represents a student record from the database.
///
/// # Database Table
///
/// Maps to the `alu_alumnos` table. The opaque token lives in the `qr_code`
/// column.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Student {
    pub legajo: String,

    pub nombres: Option<String>,

    pub dni: Option<String>,

    /// Institutional membership flag
    pub activo: Option<bool>,

    /// Photo path relative to the photo root
    pub foto: Option<String>,
}

/// Public view of a student returned by the token lookup.
#[derive(Debug, Serialize)]
pub struct StudentResponse {
    pub legajo: String,
    pub nombres: String,
    pub dni: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pertenece: Option<bool>,

    /// Relative URL of the photo, carrying the same token
    pub foto: String,
}

impl StudentResponse {
    pub fn new(student: Student, token: &str) -> Self {
        let foto = format!("alumnos/foto/{}?token={}", student.legajo, token);
        Self {
            nombres: student.nombres.unwrap_or_else(|| "Desconocido".to_string()),
            dni: student.dni.unwrap_or_else(|| "Desconocido".to_string()),
            pertenece: student.activo,
            legajo: student.legajo,
            foto,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_fills_unknowns_and_photo_url() {
        let student = Student {
            legajo: "1234".into(),
            nombres: None,
            dni: Some("30111222".into()),
            activo: None,
            foto: Some("1234.jpg".into()),
        };

        let response = StudentResponse::new(student, "ABCDEFGHIJ");
        assert_eq!(response.nombres, "Desconocido");
        assert_eq!(response.dni, "30111222");
        assert_eq!(response.foto, "alumnos/foto/1234?token=ABCDEFGHIJ");

        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("pertenece").is_none());
    }
}
