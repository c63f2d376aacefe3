//! In-process implementation of [`Store`].
//!
//! Mirrors the PostgreSQL adapter's observable behaviour (insertion order,
//! uniqueness of emails and titles, owner join) without a database. Used by
//! the integration tests and handy for running the API locally.

use super::{DUPLICATE_EMAIL, DUPLICATE_TITLE, Store};
use crate::{
    error::AppError,
    models::{
        client::{Client, NewClient},
        course::{Course, CourseChanges, CourseListing, NewCourse, Page},
        student::Student,
    },
};
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct StudentRecord {
    token: Option<String>,
    student: Student,
}

#[derive(Debug, Default)]
struct Tables {
    clients: Vec<Client>,
    courses: Vec<Course>,
    students: Vec<StudentRecord>,
    next_client_id: i64,
    next_course_id: i64,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a student row, as the enrollment system would.
    pub async fn add_student(&self, token: Option<&str>, student: Student) {
        self.tables.write().await.students.push(StudentRecord {
            token: token.map(str::to_string),
            student,
        });
    }

    /// Number of stored clients.
    pub async fn client_count(&self) -> usize {
        self.tables.read().await.clients.len()
    }
}

impl Tables {
    fn listing(&self, course: &Course) -> CourseListing {
        let owner = self.clients.iter().find(|c| c.id == course.id_creador);
        CourseListing {
            id: course.id,
            titulo: course.titulo.clone(),
            descripcion: course.descripcion.clone(),
            instructor: course.instructor.clone(),
            imagen: course.imagen.clone(),
            precio: course.precio,
            id_creador: course.id_creador,
            nombre: owner.map(|o| o.nombre.clone()),
            apellido: owner.map(|o| o.apellido.clone()),
            created_at: course.created_at,
            updated_at: course.updated_at,
        }
    }

    fn title_taken(&self, titulo: &str, except: Option<i64>) -> bool {
        self.courses
            .iter()
            .any(|c| c.titulo == titulo && Some(c.id) != except)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }

    async fn list_clients(&self) -> Result<Vec<Client>, AppError> {
        Ok(self.tables.read().await.clients.clone())
    }

    async fn insert_client(&self, client: NewClient) -> Result<Client, AppError> {
        let mut tables = self.tables.write().await;
        if tables.clients.iter().any(|c| c.email == client.email) {
            return Err(AppError::Conflict(DUPLICATE_EMAIL.to_string()));
        }

        tables.next_client_id += 1;
        let now = Utc::now();
        let client = Client {
            id: tables.next_client_id,
            nombre: client.nombre,
            apellido: client.apellido,
            email: client.email,
            id_cliente: client.id_cliente,
            llave_secreta: client.llave_secreta,
            created_at: now,
            updated_at: now,
        };
        tables.clients.push(client.clone());

        Ok(client)
    }

    async fn list_courses(&self, page: Option<Page>) -> Result<Vec<CourseListing>, AppError> {
        let tables = self.tables.read().await;
        let (skip, take) = match page {
            Some(page) => (page.offset.max(0) as usize, page.limit.max(0) as usize),
            None => (0, usize::MAX),
        };

        Ok(tables
            .courses
            .iter()
            .skip(skip)
            .take(take)
            .map(|course| tables.listing(course))
            .collect())
    }

    async fn find_course(&self, id: i64) -> Result<Option<CourseListing>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .courses
            .iter()
            .find(|c| c.id == id)
            .map(|course| tables.listing(course)))
    }

    async fn insert_course(&self, course: NewCourse) -> Result<Course, AppError> {
        let mut tables = self.tables.write().await;
        if tables.title_taken(&course.titulo, None) {
            return Err(AppError::Conflict(DUPLICATE_TITLE.to_string()));
        }

        tables.next_course_id += 1;
        let now = Utc::now();
        let course = Course {
            id: tables.next_course_id,
            titulo: course.titulo,
            descripcion: course.descripcion,
            instructor: course.instructor,
            imagen: course.imagen,
            precio: course.precio,
            id_creador: course.id_creador,
            created_at: now,
            updated_at: now,
        };
        tables.courses.push(course.clone());

        Ok(course)
    }

    async fn update_course(
        &self,
        id: i64,
        changes: CourseChanges,
    ) -> Result<Option<Course>, AppError> {
        let mut tables = self.tables.write().await;
        if let Some(titulo) = &changes.titulo {
            if tables.title_taken(titulo, Some(id)) {
                return Err(AppError::Conflict(DUPLICATE_TITLE.to_string()));
            }
        }

        let Some(course) = tables.courses.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };

        if let Some(titulo) = changes.titulo {
            course.titulo = titulo;
        }
        if let Some(descripcion) = changes.descripcion {
            course.descripcion = descripcion;
        }
        if let Some(instructor) = changes.instructor {
            course.instructor = instructor;
        }
        if let Some(imagen) = changes.imagen {
            course.imagen = imagen;
        }
        if let Some(precio) = changes.precio {
            course.precio = precio;
        }
        course.updated_at = Utc::now();

        Ok(Some(course.clone()))
    }

    async fn delete_course(&self, id: i64) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        let before = tables.courses.len();
        tables.courses.retain(|c| c.id != id);
        Ok(tables.courses.len() != before)
    }

    async fn find_student_by_token(&self, token: &str) -> Result<Option<Student>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .students
            .iter()
            .find(|r| r.token.as_deref() == Some(token))
            .map(|r| r.student.clone()))
    }

    async fn find_token_by_dni(&self, dni: &str) -> Result<Option<String>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .students
            .iter()
            .find(|r| r.student.dni.as_deref() == Some(dni))
            .and_then(|r| r.token.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_client(email: &str) -> NewClient {
        NewClient {
            nombre: "Ana".into(),
            apellido: "Perez".into(),
            email: email.into(),
            id_cliente: format!("id-{email}"),
            llave_secreta: format!("key-{email}"),
        }
    }

    fn new_course(titulo: &str, owner: i64) -> NewCourse {
        NewCourse {
            titulo: titulo.into(),
            descripcion: "Una descripcion larga".into(),
            instructor: "Profe".into(),
            imagen: None,
            precio: 10.0,
            id_creador: owner,
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let store = MemoryStore::new();
        store.insert_client(new_client("a@b.com")).await.unwrap();
        let err = store.insert_client(new_client("a@b.com")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(store.client_count().await, 1);
    }

    #[tokio::test]
    async fn listing_joins_owner_and_pages() {
        let store = MemoryStore::new();
        let owner = store.insert_client(new_client("a@b.com")).await.unwrap();
        for i in 0..12 {
            store
                .insert_course(new_course(&format!("Curso {i}"), owner.id))
                .await
                .unwrap();
        }

        let second = store.list_courses(Page::number(2)).await.unwrap();
        assert_eq!(second.len(), 2);
        assert_eq!(second[0].titulo, "Curso 10");
        assert_eq!(second[0].nombre.as_deref(), Some("Ana"));

        assert_eq!(store.list_courses(None).await.unwrap().len(), 12);
    }

    #[tokio::test]
    async fn update_rejects_title_of_another_course() {
        let store = MemoryStore::new();
        store.insert_course(new_course("Uno", 1)).await.unwrap();
        let dos = store.insert_course(new_course("Dos", 1)).await.unwrap();

        let changes = CourseChanges {
            titulo: Some("Uno".into()),
            ..Default::default()
        };
        let err = store.update_course(dos.id, changes).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        // Renaming to its own title is fine
        let changes = CourseChanges {
            titulo: Some("Dos".into()),
            imagen: Some(Some("dos.png".into())),
            ..Default::default()
        };
        let updated = store.update_course(dos.id, changes).await.unwrap().unwrap();
        assert_eq!(updated.imagen.as_deref(), Some("dos.png"));
    }
}
