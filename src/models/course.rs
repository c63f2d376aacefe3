//! Course data models.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Represents a course record from the database.
///
/// # Database Table
///
/// Maps to the `cursos` table. `titulo` carries a `UNIQUE` constraint and
/// `id_creador` references `clientes.id`.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Course {
    pub id: i64,

    pub titulo: String,

    pub descripcion: String,

    pub instructor: String,

    /// Optional image reference (URL or relative path)
    pub imagen: Option<String>,

    pub precio: f64,

    /// Owning client id. Only this client may update or delete the course.
    pub id_creador: i64,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Course row joined with its owner's name, as returned by listings and
/// single-course lookups.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct CourseListing {
    pub id: i64,
    pub titulo: String,
    pub descripcion: String,
    pub instructor: String,
    pub imagen: Option<String>,
    pub precio: f64,
    pub id_creador: i64,

    /// Owner's first name (absent if the owner row disappeared)
    pub nombre: Option<String>,

    /// Owner's surname
    pub apellido: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated input for inserting a course.
#[derive(Debug, Clone)]
pub struct NewCourse {
    pub titulo: String,
    pub descripcion: String,
    pub instructor: String,
    pub imagen: Option<String>,
    pub precio: f64,
    pub id_creador: i64,
}

/// Validated partial update. `None` leaves the column untouched.
///
/// `imagen: Some(None)` clears the image.
#[derive(Debug, Clone, Default)]
pub struct CourseChanges {
    pub titulo: Option<String>,
    pub descripcion: Option<String>,
    pub instructor: Option<String>,
    pub imagen: Option<Option<String>>,
    pub precio: Option<f64>,
}

/// Offset/limit window for course listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Page {
    /// Fixed page size.
    pub const SIZE: i64 = 10;

    /// Window for a 1-based page number.
    ///
    /// `None` for pages below 1 or whose offset does not fit in an `i64`.
    pub fn number(page: i64) -> Option<Self> {
        let offset = page.checked_sub(1)?.checked_mul(Self::SIZE)?;
        if offset < 0 {
            return None;
        }
        Some(Self {
            limit: Self::SIZE,
            offset,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::Page;

    #[test]
    fn page_windows() {
        assert_eq!(Page::number(1), Some(Page { limit: 10, offset: 0 }));
        assert_eq!(Page::number(3), Some(Page { limit: 10, offset: 20 }));
        assert_eq!(Page::number(0), None);
        assert_eq!(Page::number(i64::MAX), None);
        assert_eq!(Page::number(i64::MIN), None);
    }
}
