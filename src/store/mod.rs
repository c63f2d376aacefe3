//! Persistence adapters.
//!
//! Controllers never touch SQL directly; they go through the [`Store`] trait,
//! which returns typed rows for clients, courses and students. Two
//! implementations exist:
//!
//! - [`postgres::PgStore`]: the production adapter backed by a `sqlx` pool
//! - [`memory::MemoryStore`]: an in-process adapter used by tests and local demos
//!
//! Uniqueness of client emails and course titles is enforced by the adapter
//! itself (a `UNIQUE` constraint in PostgreSQL), surfacing as
//! [`AppError::Conflict`] so that concurrent check-then-insert races still end
//! in a 409 instead of a duplicate row.

pub mod memory;
pub mod postgres;

use crate::{
    error::AppError,
    models::{
        client::{Client, NewClient},
        course::{Course, CourseChanges, CourseListing, NewCourse, Page},
        student::Student,
    },
};
use async_trait::async_trait;

pub const DUPLICATE_EMAIL: &str = "El email ya está registrado";
pub const DUPLICATE_TITLE: &str = "El título ya existe en la base de datos";

#[async_trait]
pub trait Store: Send + Sync {
    /// Check store connectivity.
    async fn ping(&self) -> Result<(), AppError>;

    /// All clients in insertion order.
    async fn list_clients(&self) -> Result<Vec<Client>, AppError>;

    async fn insert_client(&self, client: NewClient) -> Result<Client, AppError>;

    /// Courses joined with their owner, in insertion order.
    ///
    /// `None` returns every course.
    async fn list_courses(&self, page: Option<Page>) -> Result<Vec<CourseListing>, AppError>;

    async fn find_course(&self, id: i64) -> Result<Option<CourseListing>, AppError>;

    async fn insert_course(&self, course: NewCourse) -> Result<Course, AppError>;

    /// Apply a partial update and stamp `updated_at`.
    ///
    /// Returns `None` if the course does not exist.
    async fn update_course(
        &self,
        id: i64,
        changes: CourseChanges,
    ) -> Result<Option<Course>, AppError>;

    /// Returns `false` if the course does not exist.
    async fn delete_course(&self, id: i64) -> Result<bool, AppError>;

    async fn find_student_by_token(&self, token: &str) -> Result<Option<Student>, AppError>;

    async fn find_token_by_dni(&self, dni: &str) -> Result<Option<String>, AppError>;
}
