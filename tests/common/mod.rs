//! Shared fixtures for integration tests: an in-memory SQLite database with
//! migrations applied, an in-memory byte store and helpers for users,
//! courses and lessons.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use uuid::Uuid;

use course_hub::commands::{roles, seed};
use course_hub::config::Config;
use course_hub::domain::{Actor, Course, CourseLevel, Lesson, NewCourse, NewLesson, RegisterUser};
use course_hub::errors::{AppError, AppResult};
use course_hub::infra::{
    ByteStream, Database, FileStorage, Persistence, PlainTextExporter, StoredObject,
};
use course_hub::services::{ServiceContainer, Services};

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const PASSWORD: &str = "secret-password";

/// Byte store kept in memory so tests can inspect what was written.
#[derive(Default)]
pub struct MemoryStorage {
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn contains(&self, handle: &str) -> bool {
        self.objects.lock().unwrap().contains_key(handle)
    }

    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn bytes(&self, handle: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(handle).cloned()
    }
}

#[async_trait]
impl FileStorage for MemoryStorage {
    async fn store(&self, bytes: Vec<u8>, original_name: &str) -> AppResult<StoredObject> {
        let handle = format!("{}-{}", Uuid::new_v4(), original_name);
        let size_bytes = bytes.len() as i64;
        self.objects.lock().unwrap().insert(handle.clone(), bytes);
        Ok(StoredObject { handle, size_bytes })
    }

    async fn retrieve(&self, handle: &str) -> AppResult<ByteStream> {
        let bytes = self.bytes(handle).ok_or(AppError::NotFound)?;
        Ok(Box::pin(std::io::Cursor::new(bytes)))
    }

    async fn remove(&self, handle: &str) -> AppResult<()> {
        self.objects.lock().unwrap().remove(handle);
        Ok(())
    }
}

pub struct TestApp {
    pub services: Services,
    pub uow: Persistence,
    pub storage: Arc<MemoryStorage>,
    pub admin: Actor,
}

pub async fn setup() -> TestApp {
    setup_with(Config::default()).await
}

pub async fn setup_with(config: Config) -> TestApp {
    let db = Database::connect_url("sqlite::memory:")
        .await
        .expect("sqlite connection");
    db.run_migrations().await.expect("migrations");

    let uow = Persistence::new(db.get_connection());
    let outcome = seed::seed(
        &uow,
        RegisterUser {
            username: "admin".to_string(),
            email: ADMIN_EMAIL.to_string(),
            password: PASSWORD.to_string(),
        },
    )
    .await
    .expect("seed");

    let storage = Arc::new(MemoryStorage::default());
    let services = Services::with_collaborators(
        db.get_connection(),
        config,
        storage.clone(),
        Arc::new(PlainTextExporter),
    );
    let admin = services
        .auth()
        .resolve_actor(Some(outcome.admin.id))
        .await
        .expect("admin actor");

    TestApp {
        services,
        uow,
        storage,
        admin,
    }
}

impl TestApp {
    /// Register a user (student role) and return the resolved actor.
    pub async fn student(&self, username: &str) -> Actor {
        let registered = self
            .services
            .auth()
            .register(RegisterUser {
                username: username.to_string(),
                email: format!("{}@example.com", username),
                password: PASSWORD.to_string(),
            })
            .await
            .expect("registration");
        self.actor(registered.user.id).await
    }

    /// Register a user and grant the teacher role.
    pub async fn teacher(&self, username: &str) -> Actor {
        let actor = self.student(username).await;
        roles::grant(&self.uow, &format!("{}@example.com", username), "teacher")
            .await
            .expect("grant teacher");
        self.actor(user_id(&actor)).await
    }

    pub async fn actor(&self, user_id: Uuid) -> Actor {
        self.services
            .auth()
            .resolve_actor(Some(user_id))
            .await
            .expect("actor")
    }

    /// A course authored by `author`, with `lessons` published lessons at
    /// order indexes 1..=lessons.
    pub async fn course(&self, author: &Actor, slug: &str, lessons: usize) -> (Course, Vec<Lesson>) {
        let course = self
            .services
            .catalog()
            .create_course(
                author,
                NewCourse {
                    title: format!("Course {}", slug),
                    slug: slug.to_string(),
                    description: None,
                    level: CourseLevel::Beginner,
                    is_published: true,
                },
            )
            .await
            .expect("course");

        let mut created = Vec::with_capacity(lessons);
        for i in 1..=lessons {
            created.push(self.lesson(author, course.id, i as i32).await);
        }
        (course, created)
    }

    pub async fn lesson(&self, author: &Actor, course_id: Uuid, order_index: i32) -> Lesson {
        self.services
            .catalog()
            .add_lesson(
                author,
                course_id,
                NewLesson {
                    title: format!("Lesson {}", order_index),
                    content: Some("Body".to_string()),
                    order_index,
                    is_published: true,
                },
            )
            .await
            .expect("lesson")
    }
}

pub fn user_id(actor: &Actor) -> Uuid {
    actor.user_id().expect("authenticated actor")
}
