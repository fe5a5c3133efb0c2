//! Catalog service - courses, lessons and lesson materials.

use async_trait::async_trait;
use sea_orm::ConnectionTrait;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::access::{enforce, require_content_access};
use crate::domain::course::validate_slug;
use crate::domain::{
    Actor, Course, EnrolledStudent, Lesson, Material, NewCourse, NewLesson, NewMaterial,
    UpdateCourse, UpdateLesson,
};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::{Store, UnitOfWork};
use crate::policy;
use crate::types::{Paginated, PaginationParams};

#[async_trait]
pub trait CatalogService: Send + Sync {
    /// Create a course authored by the actor
    async fn create_course(&self, actor: &Actor, input: NewCourse) -> AppResult<Course>;

    async fn update_course(
        &self,
        actor: &Actor,
        course_id: Uuid,
        changes: UpdateCourse,
    ) -> AppResult<Course>;

    async fn set_course_published(
        &self,
        actor: &Actor,
        course_id: Uuid,
        is_published: bool,
    ) -> AppResult<Course>;

    /// Delete a course; lessons, enrollments and progress go with it
    async fn delete_course(&self, actor: &Actor, course_id: Uuid) -> AppResult<()>;

    /// Public catalog: published courses, newest first
    async fn list_courses(&self, params: PaginationParams) -> AppResult<Paginated<Course>>;

    async fn list_courses_by_author(&self, actor: &Actor, author_id: Uuid) -> AppResult<Vec<Course>>;

    async fn get_course(&self, actor: &Actor, course_id: Uuid) -> AppResult<Course>;

    async fn get_course_by_slug(&self, actor: &Actor, slug: &str) -> AppResult<Course>;

    async fn add_lesson(&self, actor: &Actor, course_id: Uuid, input: NewLesson) -> AppResult<Lesson>;

    async fn update_lesson(
        &self,
        actor: &Actor,
        lesson_id: Uuid,
        changes: UpdateLesson,
    ) -> AppResult<Lesson>;

    /// Give a lesson a new `order_index`; a taken index is a conflict
    async fn move_lesson(&self, actor: &Actor, lesson_id: Uuid, order_index: i32) -> AppResult<Lesson>;

    async fn delete_lesson(&self, actor: &Actor, lesson_id: Uuid) -> AppResult<()>;

    /// Lessons in order. Unpublished lessons are only listed for the author or an admin.
    async fn list_lessons(&self, actor: &Actor, course_id: Uuid) -> AppResult<Vec<Lesson>>;

    async fn get_lesson(&self, actor: &Actor, lesson_id: Uuid) -> AppResult<Lesson>;

    async fn attach_material(
        &self,
        actor: &Actor,
        lesson_id: Uuid,
        input: NewMaterial,
    ) -> AppResult<Material>;

    async fn list_materials(&self, actor: &Actor, lesson_id: Uuid) -> AppResult<Vec<Material>>;

    async fn detach_material(&self, actor: &Actor, material_id: Uuid) -> AppResult<()>;

    /// Everyone holding an enrollment row, dropped included
    async fn course_students(&self, actor: &Actor, course_id: Uuid) -> AppResult<Vec<EnrolledStudent>>;
}

pub struct CatalogManager<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> CatalogManager<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }
}

async fn load_course<C: ConnectionTrait>(store: &Store<'_, C>, id: Uuid) -> AppResult<Course> {
    store.courses().find_by_id(id).await?.ok_or_not_found()
}

async fn load_lesson<C: ConnectionTrait>(
    store: &Store<'_, C>,
    id: Uuid,
) -> AppResult<(Lesson, Course)> {
    let lesson = store.lessons().find_by_id(id).await?.ok_or_not_found()?;
    let course = load_course(store, lesson.course_id).await?;
    Ok((lesson, course))
}

/// Readers who cannot manage the course only see published lessons of
/// published courses, and only with content access.
async fn check_lesson_readable<C: ConnectionTrait>(
    store: &Store<'_, C>,
    actor: &Actor,
    lesson: &Lesson,
    course: &Course,
) -> AppResult<()> {
    if policy::can_manage_course(actor, course).is_allowed() {
        return Ok(());
    }
    if !course.is_published || !lesson.is_published {
        return Err(AppError::NotFound);
    }
    require_content_access(store, actor, course).await
}

#[async_trait]
impl<U: UnitOfWork> CatalogService for CatalogManager<U> {
    async fn create_course(&self, actor: &Actor, input: NewCourse) -> AppResult<Course> {
        enforce(actor, policy::can_create_course(actor), "courses.create")?;
        input.validate()?;
        validate_slug(&input.slug)?;
        let author_id = actor.user_id().ok_or(AppError::Unauthenticated)?;

        let store = self.uow.store();
        if store.courses().find_by_slug(&input.slug).await?.is_some() {
            return Err(AppError::conflict("Course"));
        }

        let course = store.courses().create(input, Some(author_id)).await?;
        info!(course_id = %course.id, slug = %course.slug, author_id = %author_id, "Course created");
        Ok(course)
    }

    async fn update_course(
        &self,
        actor: &Actor,
        course_id: Uuid,
        changes: UpdateCourse,
    ) -> AppResult<Course> {
        let store = self.uow.store();
        let course = load_course(&store, course_id).await?;
        enforce(actor, policy::can_manage_course(actor, &course), "courses.update")?;

        changes.validate()?;
        if let Some(slug) = &changes.slug {
            validate_slug(slug)?;
            if let Some(existing) = store.courses().find_by_slug(slug).await? {
                if existing.id != course_id {
                    return Err(AppError::conflict("Course"));
                }
            }
        }

        let course = store.courses().update(course_id, changes).await?;
        info!(course_id = %course_id, "Course updated");
        Ok(course)
    }

    async fn set_course_published(
        &self,
        actor: &Actor,
        course_id: Uuid,
        is_published: bool,
    ) -> AppResult<Course> {
        let store = self.uow.store();
        let course = load_course(&store, course_id).await?;
        enforce(actor, policy::can_manage_course(actor, &course), "courses.publish")?;

        let course = store.courses().set_published(course_id, is_published).await?;
        info!(course_id = %course_id, is_published, "Course publication changed");
        Ok(course)
    }

    async fn delete_course(&self, actor: &Actor, course_id: Uuid) -> AppResult<()> {
        let store = self.uow.store();
        let course = load_course(&store, course_id).await?;
        enforce(actor, policy::can_manage_course(actor, &course), "courses.delete")?;

        store.courses().delete(course_id).await?;
        info!(course_id = %course_id, slug = %course.slug, "Course deleted");
        Ok(())
    }

    async fn list_courses(&self, params: PaginationParams) -> AppResult<Paginated<Course>> {
        let (courses, total) = self.uow.store().courses().list_published(&params).await?;
        Ok(Paginated::new(courses, &params, total))
    }

    async fn list_courses_by_author(&self, actor: &Actor, author_id: Uuid) -> AppResult<Vec<Course>> {
        enforce(actor, policy::can_act_for_user(actor, author_id), "courses.by_author")?;
        self.uow.store().courses().list_by_author(author_id).await
    }

    async fn get_course(&self, actor: &Actor, course_id: Uuid) -> AppResult<Course> {
        let course = load_course(&self.uow.store(), course_id).await?;
        enforce(actor, policy::can_preview_course(actor, &course), "courses.get")?;
        Ok(course)
    }

    async fn get_course_by_slug(&self, actor: &Actor, slug: &str) -> AppResult<Course> {
        let course = self
            .uow
            .store()
            .courses()
            .find_by_slug(slug)
            .await?
            .ok_or_not_found()?;
        enforce(actor, policy::can_preview_course(actor, &course), "courses.get")?;
        Ok(course)
    }

    async fn add_lesson(&self, actor: &Actor, course_id: Uuid, input: NewLesson) -> AppResult<Lesson> {
        let store = self.uow.store();
        let course = load_course(&store, course_id).await?;
        enforce(actor, policy::can_manage_course(actor, &course), "lessons.add")?;
        input.validate()?;

        let lesson = store.lessons().create(course_id, input).await?;
        info!(
            course_id = %course_id,
            lesson_id = %lesson.id,
            order_index = lesson.order_index,
            "Lesson added"
        );
        Ok(lesson)
    }

    async fn update_lesson(
        &self,
        actor: &Actor,
        lesson_id: Uuid,
        changes: UpdateLesson,
    ) -> AppResult<Lesson> {
        let store = self.uow.store();
        let (_, course) = load_lesson(&store, lesson_id).await?;
        enforce(actor, policy::can_manage_course(actor, &course), "lessons.update")?;
        changes.validate()?;

        store.lessons().update(lesson_id, changes).await
    }

    async fn move_lesson(&self, actor: &Actor, lesson_id: Uuid, order_index: i32) -> AppResult<Lesson> {
        let store = self.uow.store();
        let (_, course) = load_lesson(&store, lesson_id).await?;
        enforce(actor, policy::can_manage_course(actor, &course), "lessons.move")?;
        if order_index < 0 {
            return Err(AppError::validation("Order index must not be negative"));
        }

        let lesson = store.lessons().set_order_index(lesson_id, order_index).await?;
        info!(lesson_id = %lesson_id, order_index, "Lesson moved");
        Ok(lesson)
    }

    async fn delete_lesson(&self, actor: &Actor, lesson_id: Uuid) -> AppResult<()> {
        let store = self.uow.store();
        let (_, course) = load_lesson(&store, lesson_id).await?;
        enforce(actor, policy::can_manage_course(actor, &course), "lessons.delete")?;

        store.lessons().delete(lesson_id).await?;
        info!(course_id = %course.id, lesson_id = %lesson_id, "Lesson deleted");
        Ok(())
    }

    async fn list_lessons(&self, actor: &Actor, course_id: Uuid) -> AppResult<Vec<Lesson>> {
        let store = self.uow.store();
        let course = load_course(&store, course_id).await?;
        enforce(actor, policy::can_preview_course(actor, &course), "lessons.list")?;

        let lessons = store.lessons().list_for_course(course_id).await?;
        if policy::can_manage_course(actor, &course).is_allowed() {
            return Ok(lessons);
        }
        Ok(lessons.into_iter().filter(|l| l.is_published).collect())
    }

    async fn get_lesson(&self, actor: &Actor, lesson_id: Uuid) -> AppResult<Lesson> {
        let store = self.uow.store();
        let (lesson, course) = load_lesson(&store, lesson_id).await?;
        check_lesson_readable(&store, actor, &lesson, &course).await?;
        Ok(lesson)
    }

    async fn attach_material(
        &self,
        actor: &Actor,
        lesson_id: Uuid,
        input: NewMaterial,
    ) -> AppResult<Material> {
        let store = self.uow.store();
        let (_, course) = load_lesson(&store, lesson_id).await?;
        enforce(actor, policy::can_manage_course(actor, &course), "materials.attach")?;
        input.check()?;

        if let Some(file_id) = input.file_id {
            let file = store.files().find_by_id(file_id).await?.ok_or_not_found()?;
            enforce(actor, policy::can_manage_file(actor, &file), "materials.attach_file")?;
        }

        let material = store.materials().create(lesson_id, input).await?;
        info!(lesson_id = %lesson_id, material_id = %material.id, "Material attached");
        Ok(material)
    }

    async fn list_materials(&self, actor: &Actor, lesson_id: Uuid) -> AppResult<Vec<Material>> {
        let store = self.uow.store();
        let (lesson, course) = load_lesson(&store, lesson_id).await?;
        check_lesson_readable(&store, actor, &lesson, &course).await?;

        store.materials().list_for_lesson(lesson_id).await
    }

    async fn detach_material(&self, actor: &Actor, material_id: Uuid) -> AppResult<()> {
        let store = self.uow.store();
        let material = store.materials().find_by_id(material_id).await?.ok_or_not_found()?;
        let (_, course) = load_lesson(&store, material.lesson_id).await?;
        enforce(actor, policy::can_manage_course(actor, &course), "materials.detach")?;

        store.materials().delete(material_id).await?;
        info!(material_id = %material_id, "Material detached");
        Ok(())
    }

    async fn course_students(&self, actor: &Actor, course_id: Uuid) -> AppResult<Vec<EnrolledStudent>> {
        let store = self.uow.store();
        let course = load_course(&store, course_id).await?;
        enforce(actor, policy::can_view_course_students(actor, &course), "courses.students")?;

        let rows = store.enrollments().list_for_course(course_id).await?;
        Ok(rows
            .into_iter()
            .map(|(enrollment, user)| EnrolledStudent { user, enrollment })
            .collect())
    }
}
