//! Input validation and normalization.
//!
//! Every function here is pure: it takes the raw text received from the
//! caller and either returns the normalized value or a [`ValidationError`]
//! carrying the field name, a machine-readable reason and the human-readable
//! message surfaced to the caller with a 400 status.
//!
//! Lengths are counted in characters, not bytes, so accented input is not
//! penalized.

use serde_json::{Map, Value};

/// Why a field was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    /// Field absent or empty after trimming
    Missing,
    /// Characters outside the allowed set, or wrong overall shape
    Format,
    /// Length outside the permitted bounds
    Length,
    /// Numeric value outside the permitted range
    Range,
}

/// A rejected input field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    /// Name of the offending field (`"nombre"`, `"token"`, ...)
    pub field: String,

    /// Reason code
    pub reason: Reason,

    message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, reason: Reason, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason,
            message: message.into(),
        }
    }

    /// Standard "required" failure for a named field.
    pub fn required(field: &str) -> Self {
        Self::new(
            field,
            Reason::Missing,
            format!("El campo {field} es requerido"),
        )
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

pub type ValidationResult<T> = Result<T, ValidationError>;

pub const PRICE_MAX: f64 = 999_999.99;

/// Punctuation accepted in free-text fields besides letters, digits and whitespace.
const TEXT_PUNCTUATION: &str = "()=&$;_*\"<>?¿!¡:,.-/'%+";

const ACCENTED: &str = "áéíóúÁÉÍÓÚñÑüÜ";

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphabetic() || c.is_whitespace() || ACCENTED.contains(c)
}

fn is_text_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || c.is_whitespace()
        || ACCENTED.contains(c)
        || TEXT_PUNCTUATION.contains(c)
}

fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Validate a person name or surname.
pub fn validate_name(raw: &str, field: &str) -> ValidationResult<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ValidationError::required(field));
    }

    if !name.chars().all(is_name_char) {
        return Err(ValidationError::new(
            field,
            Reason::Format,
            format!("Error en el campo {field}, ingrese solo letras"),
        ));
    }

    let len = char_len(name);
    if !(2..=50).contains(&len) {
        return Err(ValidationError::new(
            field,
            Reason::Length,
            format!("El campo {field} debe tener entre 2 y 50 caracteres"),
        ));
    }

    Ok(name.to_string())
}

/// Validate and lowercase an email address.
pub fn validate_email(raw: &str) -> ValidationResult<String> {
    let email = raw.trim().to_lowercase();
    if email.is_empty() {
        return Err(ValidationError::required("email"));
    }

    if !is_email_shape(&email) {
        return Err(ValidationError::new(
            "email",
            Reason::Format,
            "Error en el campo email, ingrese un email válido",
        ));
    }

    if email.len() > 100 {
        return Err(ValidationError::new(
            "email",
            Reason::Length,
            "El email es demasiado largo",
        ));
    }

    Ok(email)
}

/// `local@domain` with a dotted domain whose labels are alphanumeric with
/// inner hyphens and whose last label is alphabetic and at least two long.
fn is_email_shape(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    const LOCAL_SPECIALS: &str = "!#$%&'*+/=?^_`{|}~-.";
    let local_ok = !local.is_empty()
        && local.len() <= 64
        && !local.starts_with('.')
        && !local.ends_with('.')
        && !local.contains("..")
        && local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || LOCAL_SPECIALS.contains(c));
    if !local_ok {
        return false;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return false;
    }

    let labels_ok = labels.iter().all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    });

    let tld = labels[labels.len() - 1];
    labels_ok && tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic())
}

/// Validate an opaque student token.
pub fn validate_token(raw: &str) -> ValidationResult<String> {
    let token = raw.trim();
    if token.is_empty() {
        return Err(ValidationError::new(
            "token",
            Reason::Missing,
            "Token requerido",
        ));
    }

    if !token.chars().all(is_token_char) {
        return Err(ValidationError::new(
            "token",
            Reason::Format,
            "Formato de token inválido",
        ));
    }

    if !(10..=200).contains(&token.len()) {
        return Err(ValidationError::new(
            "token",
            Reason::Length,
            "El token debe tener entre 10 y 200 caracteres",
        ));
    }

    Ok(token.to_string())
}

/// Validate a DNI: 7 or 8 digits.
pub fn validate_dni(raw: &str) -> ValidationResult<String> {
    let dni = raw.trim();
    if dni.is_empty() {
        return Err(ValidationError::new("dni", Reason::Missing, "DNI requerido"));
    }

    if !dni.chars().all(|c| c.is_ascii_digit()) || !(7..=8).contains(&dni.len()) {
        return Err(ValidationError::new(
            "dni",
            Reason::Format,
            "DNI debe contener entre 7 y 8 dígitos",
        ));
    }

    Ok(dni.to_string())
}

/// Validate a legajo (student id).
pub fn validate_legajo(raw: &str) -> ValidationResult<String> {
    let legajo = raw.trim();
    if legajo.is_empty() {
        return Err(ValidationError::new(
            "legajo",
            Reason::Missing,
            "Legajo requerido",
        ));
    }

    if !legajo.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ValidationError::new(
            "legajo",
            Reason::Format,
            "Legajo debe contener solo letras y números",
        ));
    }

    if legajo.len() > 20 {
        return Err(ValidationError::new(
            "legajo",
            Reason::Length,
            "El legajo debe tener entre 1 y 20 caracteres",
        ));
    }

    Ok(legajo.to_string())
}

/// Validate a free-text field (course title, description, instructor, image).
pub fn validate_text(raw: &str, field: &str, min: usize, max: usize) -> ValidationResult<String> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(ValidationError::required(field));
    }

    if !text.chars().all(is_text_char) {
        return Err(ValidationError::new(
            field,
            Reason::Format,
            format!("Error en el campo {field}, contiene caracteres no permitidos"),
        ));
    }

    let len = char_len(text);
    if len < min || len > max {
        return Err(ValidationError::new(
            field,
            Reason::Length,
            format!("El campo {field} debe tener entre {min} y {max} caracteres"),
        ));
    }

    Ok(text.to_string())
}

/// Validate a price given as text (JSON numbers arrive already stringified).
pub fn validate_price(raw: &str) -> ValidationResult<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ValidationError::new(
            "precio",
            Reason::Missing,
            "El precio es requerido",
        ));
    }

    let price: f64 = raw
        .parse()
        .ok()
        .filter(|p: &f64| p.is_finite())
        .ok_or_else(|| {
            ValidationError::new("precio", Reason::Format, "El precio debe ser numérico")
        })?;

    if price < 0.0 {
        return Err(ValidationError::new(
            "precio",
            Reason::Range,
            "El precio no puede ser negativo",
        ));
    }

    if price > PRICE_MAX {
        return Err(ValidationError::new(
            "precio",
            Reason::Range,
            "El precio es demasiado alto",
        ));
    }

    Ok(price)
}

/// Parse a raw request body into a JSON object.
pub fn validate_json_object(raw: &[u8]) -> ValidationResult<Map<String, Value>> {
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Err(ValidationError::new(
            "body",
            Reason::Missing,
            "Datos requeridos",
        ));
    }

    let value: Value = serde_json::from_slice(raw).map_err(|_| {
        ValidationError::new("body", Reason::Format, "Formato JSON inválido")
    })?;

    match value {
        Value::Object(map) => Ok(map),
        _ => Err(ValidationError::new(
            "body",
            Reason::Format,
            "Los datos deben ser un objeto JSON",
        )),
    }
}

/// Read a scalar field from a parsed body as text.
///
/// `null` counts as absent. Numbers and booleans are rendered as text so the
/// field validators can apply their own coercion.
pub fn field_text(body: &Map<String, Value>, key: &str) -> Option<String> {
    match body.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_is_trimmed_and_accepts_accents() {
        assert_eq!(validate_name("  José María ", "nombre").unwrap(), "José María");
        assert_eq!(validate_name("Ñandú", "apellido").unwrap(), "Ñandú");
    }

    #[test]
    fn name_rejects_digits_and_bad_length() {
        let err = validate_name("R2D2", "nombre").unwrap_err();
        assert_eq!(err.reason, Reason::Format);
        assert_eq!(err.to_string(), "Error en el campo nombre, ingrese solo letras");

        let err = validate_name("A", "apellido").unwrap_err();
        assert_eq!(err.reason, Reason::Length);
        assert_eq!(err.field, "apellido");

        assert!(validate_name(&"a".repeat(51), "nombre").is_err());
        assert_eq!(
            validate_name("   ", "nombre").unwrap_err().reason,
            Reason::Missing
        );
    }

    #[test]
    fn email_is_lowercased() {
        assert_eq!(
            validate_email("  Ana.Perez@Example.COM ").unwrap(),
            "ana.perez@example.com"
        );
    }

    #[test]
    fn email_shape_rejections() {
        for bad in [
            "plain",
            "@example.com",
            "ana@",
            "ana@localhost",
            "ana@@example.com",
            "ana..p@example.com",
            ".ana@example.com",
            "ana@-example.com",
            "ana@example.c0m",
            "ana perez@example.com",
        ] {
            assert!(validate_email(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn email_too_long() {
        let email = format!("{}@{}.com", "a".repeat(60), "b".repeat(40));
        let err = validate_email(&email).unwrap_err();
        assert_eq!(err.reason, Reason::Length);
    }

    #[test]
    fn token_rules() {
        assert_eq!(validate_token(" ABCDEFGHIJ ").unwrap(), "ABCDEFGHIJ");
        assert_eq!(validate_token("abc_DEF-123").unwrap(), "abc_DEF-123");

        assert_eq!(validate_token("short").unwrap_err().reason, Reason::Length);
        assert_eq!(
            validate_token("abc def ghi jk").unwrap_err().reason,
            Reason::Format
        );
        assert_eq!(validate_token("").unwrap_err().reason, Reason::Missing);
        assert!(validate_token(&"a".repeat(201)).is_err());
        assert!(validate_token(&"a".repeat(200)).is_ok());
    }

    #[test]
    fn dni_rules() {
        assert_eq!(validate_dni(" 1234567 ").unwrap(), "1234567");
        assert_eq!(validate_dni("12345678").unwrap(), "12345678");
        assert!(validate_dni("123456").is_err());
        assert!(validate_dni("123456789").is_err());
        assert!(validate_dni("1234567a").is_err());
    }

    #[test]
    fn legajo_rules() {
        assert_eq!(validate_legajo("A123").unwrap(), "A123");
        assert!(validate_legajo("12-3").is_err());
        assert!(validate_legajo(&"1".repeat(21)).is_err());
        assert_eq!(validate_legajo(" ").unwrap_err().reason, Reason::Missing);
    }

    #[test]
    fn text_allowlist_and_bounds() {
        assert_eq!(
            validate_text(" Rust avanzado: ¡práctico! ", "titulo", 3, 100).unwrap(),
            "Rust avanzado: ¡práctico!"
        );
        assert!(validate_text("img/portada-1.png", "imagen", 0, 255).is_ok());

        let err = validate_text("hola {mundo}", "titulo", 3, 100).unwrap_err();
        assert_eq!(err.reason, Reason::Format);

        let err = validate_text("ab", "titulo", 3, 100).unwrap_err();
        assert_eq!(
            err.to_string(),
            "El campo titulo debe tener entre 3 y 100 caracteres"
        );
    }

    #[test]
    fn price_rules() {
        assert_eq!(validate_price("0").unwrap(), 0.0);
        assert_eq!(validate_price(" 1500.50 ").unwrap(), 1500.5);
        assert_eq!(validate_price("999999.99").unwrap(), PRICE_MAX);

        assert_eq!(validate_price("-1").unwrap_err().reason, Reason::Range);
        assert_eq!(validate_price("1000000").unwrap_err().reason, Reason::Range);
        assert_eq!(validate_price("diez").unwrap_err().reason, Reason::Format);
        assert_eq!(validate_price("NaN").unwrap_err().reason, Reason::Format);
        assert_eq!(validate_price("").unwrap_err().reason, Reason::Missing);
    }

    #[test]
    fn json_body_must_be_an_object() {
        let map = validate_json_object(br#"{"b": 1, "a": "x"}"#).unwrap();
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["a", "b"]);

        assert_eq!(
            validate_json_object(b"").unwrap_err().to_string(),
            "Datos requeridos"
        );
        assert_eq!(
            validate_json_object(b"{nope").unwrap_err().to_string(),
            "Formato JSON inválido"
        );
        assert_eq!(
            validate_json_object(b"[1, 2]").unwrap_err().to_string(),
            "Los datos deben ser un objeto JSON"
        );
    }

    #[test]
    fn field_text_coerces_scalars() {
        let map = validate_json_object(br#"{"precio": 12.5, "x": null, "s": "t"}"#).unwrap();
        assert_eq!(field_text(&map, "precio").as_deref(), Some("12.5"));
        assert_eq!(field_text(&map, "x"), None);
        assert_eq!(field_text(&map, "s").as_deref(), Some("t"));
        assert_eq!(field_text(&map, "missing"), None);
    }
}
