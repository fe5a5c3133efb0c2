//! Repository layer - Data access abstraction
//!
//! Every repository borrows a connection generic over [`ConnectionTrait`], so
//! the same code runs against the pool or inside a transaction. [`Store`]
//! hands them out.

mod course_repository;
mod enrollment_repository;
pub(crate) mod entities;
mod file_repository;
mod lesson_repository;
mod material_repository;
mod profile_repository;
mod progress_repository;
mod report_repository;
mod role_repository;
mod user_repository;

use sea_orm::ConnectionTrait;

pub use course_repository::CourseRepository;
pub use enrollment_repository::EnrollmentRepository;
pub use file_repository::FileRepository;
pub use lesson_repository::LessonRepository;
pub use material_repository::MaterialRepository;
pub use profile_repository::ProfileRepository;
pub use progress_repository::ProgressRepository;
pub use report_repository::ReportRepository;
pub use role_repository::RoleRepository;
pub use user_repository::UserRepository;

/// Repository access over one connection
pub struct Store<'c, C> {
    conn: &'c C,
}

impl<'c, C: ConnectionTrait> Store<'c, C> {
    pub fn new(conn: &'c C) -> Self {
        Self { conn }
    }

    pub fn users(&self) -> UserRepository<'c, C> {
        UserRepository::new(self.conn)
    }

    pub fn roles(&self) -> RoleRepository<'c, C> {
        RoleRepository::new(self.conn)
    }

    pub fn profiles(&self) -> ProfileRepository<'c, C> {
        ProfileRepository::new(self.conn)
    }

    pub fn courses(&self) -> CourseRepository<'c, C> {
        CourseRepository::new(self.conn)
    }

    pub fn lessons(&self) -> LessonRepository<'c, C> {
        LessonRepository::new(self.conn)
    }

    pub fn materials(&self) -> MaterialRepository<'c, C> {
        MaterialRepository::new(self.conn)
    }

    pub fn enrollments(&self) -> EnrollmentRepository<'c, C> {
        EnrollmentRepository::new(self.conn)
    }

    pub fn progress(&self) -> ProgressRepository<'c, C> {
        ProgressRepository::new(self.conn)
    }

    pub fn files(&self) -> FileRepository<'c, C> {
        FileRepository::new(self.conn)
    }

    pub fn reports(&self) -> ReportRepository<'c, C> {
        ReportRepository::new(self.conn)
    }
}
