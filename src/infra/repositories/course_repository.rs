//! Course repository.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use super::entities::course::{self, ActiveModel, Entity as CourseEntity};
use crate::domain::{Course, NewCourse, UpdateCourse};
use crate::errors::{AppError, AppResult};
use crate::types::PaginationParams;

pub struct CourseRepository<'c, C> {
    conn: &'c C,
}

impl<'c, C: ConnectionTrait> CourseRepository<'c, C> {
    pub(crate) fn new(conn: &'c C) -> Self {
        Self { conn }
    }

    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Course>> {
        let result = CourseEntity::find_by_id(id)
            .one(self.conn)
            .await
            .map_err(AppError::from)?;

        result.map(Course::try_from).transpose()
    }

    pub async fn find_by_slug(&self, slug: &str) -> AppResult<Option<Course>> {
        let result = CourseEntity::find()
            .filter(course::Column::Slug.eq(slug))
            .one(self.conn)
            .await
            .map_err(AppError::from)?;

        result.map(Course::try_from).transpose()
    }

    /// Insert a course. A taken slug is a conflict.
    pub async fn create(&self, input: NewCourse, created_by: Option<Uuid>) -> AppResult<Course> {
        let now = Utc::now();
        let active_model = ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(input.title),
            slug: Set(input.slug),
            description: Set(input.description),
            level: Set(input.level.as_str().to_string()),
            is_published: Set(input.is_published),
            created_by: Set(created_by),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = active_model
            .insert(self.conn)
            .await
            .map_err(|e| AppError::from_db_unique(e, "Course"))?;

        Course::try_from(model)
    }

    pub async fn update(&self, id: Uuid, changes: UpdateCourse) -> AppResult<Course> {
        let model = CourseEntity::find_by_id(id)
            .one(self.conn)
            .await?
            .ok_or(AppError::NotFound)?;

        let mut active: ActiveModel = model.into();
        if let Some(title) = changes.title {
            active.title = Set(title);
        }
        if let Some(slug) = changes.slug {
            active.slug = Set(slug);
        }
        if let Some(description) = changes.description {
            active.description = Set(Some(description));
        }
        if let Some(level) = changes.level {
            active.level = Set(level.as_str().to_string());
        }
        active.updated_at = Set(Utc::now());

        let model = active
            .update(self.conn)
            .await
            .map_err(|e| AppError::from_db_unique(e, "Course"))?;

        Course::try_from(model)
    }

    pub async fn set_published(&self, id: Uuid, is_published: bool) -> AppResult<Course> {
        let model = CourseEntity::find_by_id(id)
            .one(self.conn)
            .await?
            .ok_or(AppError::NotFound)?;

        let mut active: ActiveModel = model.into();
        active.is_published = Set(is_published);
        active.updated_at = Set(Utc::now());

        let model = active.update(self.conn).await.map_err(AppError::from)?;
        Course::try_from(model)
    }

    /// Delete a course with its lessons, materials, enrollments and progress.
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = CourseEntity::delete_by_id(id)
            .exec(self.conn)
            .await
            .map_err(AppError::from)?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound);
        }

        Ok(())
    }

    /// Published courses, newest first
    pub async fn list_published(&self, params: &PaginationParams) -> AppResult<(Vec<Course>, u64)> {
        let paginator = CourseEntity::find()
            .filter(course::Column::IsPublished.eq(true))
            .order_by_desc(course::Column::CreatedAt)
            .order_by_asc(course::Column::Id)
            .paginate(self.conn, params.limit());
        let total = paginator.num_items().await?;
        let models = paginator.fetch_page(params.page_index()).await?;

        let courses = models
            .into_iter()
            .map(Course::try_from)
            .collect::<AppResult<Vec<_>>>()?;
        Ok((courses, total))
    }

    pub async fn list_by_author(&self, author_id: Uuid) -> AppResult<Vec<Course>> {
        let models = CourseEntity::find()
            .filter(course::Column::CreatedBy.eq(author_id))
            .order_by_desc(course::Column::CreatedAt)
            .all(self.conn)
            .await
            .map_err(AppError::from)?;

        models.into_iter().map(Course::try_from).collect()
    }

    pub async fn list_all(&self) -> AppResult<Vec<Course>> {
        let models = CourseEntity::find()
            .order_by_asc(course::Column::Title)
            .all(self.conn)
            .await
            .map_err(AppError::from)?;

        models.into_iter().map(Course::try_from).collect()
    }
}
