//! PostgreSQL implementation of [`Store`].

use super::{DUPLICATE_EMAIL, DUPLICATE_TITLE, Store};
use crate::{
    db::DbPool,
    error::AppError,
    models::{
        client::{Client, NewClient},
        course::{Course, CourseChanges, CourseListing, NewCourse, Page},
        student::Student,
    },
};
use async_trait::async_trait;

const COURSE_COLUMNS: &str =
    "id, titulo, descripcion, instructor, imagen, precio, id_creador, created_at, updated_at";

const LISTING_SELECT: &str = r#"
    SELECT c.id, c.titulo, c.descripcion, c.instructor, c.imagen, c.precio, c.id_creador,
           cl.nombre, cl.apellido, c.created_at, c.updated_at
    FROM cursos c
    LEFT JOIN clientes cl ON cl.id = c.id_creador
"#;

#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Translate a unique-constraint violation into a 409, anything else into a
/// database error.
fn write_error(err: sqlx::Error) -> AppError {
    if let Some(db_err) = err.as_database_error() {
        if db_err.is_unique_violation() {
            let message = match db_err.constraint() {
                Some("clientes_email_unique") => DUPLICATE_EMAIL,
                Some("cursos_titulo_unique") => DUPLICATE_TITLE,
                _ => "El registro ya existe",
            };
            return AppError::Conflict(message.to_string());
        }
    }
    AppError::Database(err)
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn list_clients(&self) -> Result<Vec<Client>, AppError> {
        let clients = sqlx::query_as::<_, Client>(
            r#"
            SELECT id, nombre, apellido, email, id_cliente, llave_secreta, created_at, updated_at
            FROM clientes
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(clients)
    }

    async fn insert_client(&self, client: NewClient) -> Result<Client, AppError> {
        sqlx::query_as::<_, Client>(
            r#"
            INSERT INTO clientes (nombre, apellido, email, id_cliente, llave_secreta)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, nombre, apellido, email, id_cliente, llave_secreta, created_at, updated_at
            "#,
        )
        .bind(client.nombre)
        .bind(client.apellido)
        .bind(client.email)
        .bind(client.id_cliente)
        .bind(client.llave_secreta)
        .fetch_one(&self.pool)
        .await
        .map_err(write_error)
    }

    async fn list_courses(&self, page: Option<Page>) -> Result<Vec<CourseListing>, AppError> {
        // LIMIT NULL means no limit in PostgreSQL
        let (limit, offset) = match page {
            Some(page) => (Some(page.limit), page.offset),
            None => (None, 0),
        };

        let courses = sqlx::query_as::<_, CourseListing>(&format!(
            "{LISTING_SELECT} ORDER BY c.id LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(courses)
    }

    async fn find_course(&self, id: i64) -> Result<Option<CourseListing>, AppError> {
        let course = sqlx::query_as::<_, CourseListing>(&format!("{LISTING_SELECT} WHERE c.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(course)
    }

    async fn insert_course(&self, course: NewCourse) -> Result<Course, AppError> {
        sqlx::query_as::<_, Course>(&format!(
            r#"
            INSERT INTO cursos (titulo, descripcion, instructor, imagen, precio, id_creador)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {COURSE_COLUMNS}
            "#
        ))
        .bind(course.titulo)
        .bind(course.descripcion)
        .bind(course.instructor)
        .bind(course.imagen)
        .bind(course.precio)
        .bind(course.id_creador)
        .fetch_one(&self.pool)
        .await
        .map_err(write_error)
    }

    async fn update_course(
        &self,
        id: i64,
        changes: CourseChanges,
    ) -> Result<Option<Course>, AppError> {
        let (set_imagen, imagen) = match changes.imagen {
            Some(imagen) => (true, imagen),
            None => (false, None),
        };

        sqlx::query_as::<_, Course>(&format!(
            r#"
            UPDATE cursos
            SET titulo = COALESCE($1, titulo),
                descripcion = COALESCE($2, descripcion),
                instructor = COALESCE($3, instructor),
                imagen = CASE WHEN $4 THEN $5 ELSE imagen END,
                precio = COALESCE($6, precio),
                updated_at = NOW()
            WHERE id = $7
            RETURNING {COURSE_COLUMNS}
            "#
        ))
        .bind(changes.titulo)
        .bind(changes.descripcion)
        .bind(changes.instructor)
        .bind(set_imagen)
        .bind(imagen)
        .bind(changes.precio)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(write_error)
    }

    async fn delete_course(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM cursos WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_student_by_token(&self, token: &str) -> Result<Option<Student>, AppError> {
        let student = sqlx::query_as::<_, Student>(
            "SELECT legajo, nombres, dni, activo, foto FROM alu_alumnos WHERE qr_code = $1",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(student)
    }

    async fn find_token_by_dni(&self, dni: &str) -> Result<Option<String>, AppError> {
        let token: Option<Option<String>> =
            sqlx::query_scalar("SELECT qr_code FROM alu_alumnos WHERE dni = $1")
                .bind(dni)
                .fetch_optional(&self.pool)
                .await?;

        Ok(token.flatten())
    }
}
