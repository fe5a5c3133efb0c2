//! Lesson repository. Order positions are unique within a course; a clash
//! surfaces as `Conflict` whether caught by the pre-check or the constraint.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use super::entities::lesson::{self, ActiveModel, Entity as LessonEntity};
use crate::domain::{Lesson, NewLesson, UpdateLesson};
use crate::errors::{AppError, AppResult};

const ORDER_CONFLICT: &str = "Lesson with this order index";

pub struct LessonRepository<'c, C> {
    conn: &'c C,
}

impl<'c, C: ConnectionTrait> LessonRepository<'c, C> {
    pub(crate) fn new(conn: &'c C) -> Self {
        Self { conn }
    }

    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Lesson>> {
        let result = LessonEntity::find_by_id(id)
            .one(self.conn)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(Lesson::from))
    }

    /// Lessons of a course in `order_index` order
    pub async fn list_for_course(&self, course_id: Uuid) -> AppResult<Vec<Lesson>> {
        let models = LessonEntity::find()
            .filter(lesson::Column::CourseId.eq(course_id))
            .order_by_asc(lesson::Column::OrderIndex)
            .all(self.conn)
            .await
            .map_err(AppError::from)?;

        Ok(models.into_iter().map(Lesson::from).collect())
    }

    pub async fn count_for_course(&self, course_id: Uuid) -> AppResult<u64> {
        LessonEntity::find()
            .filter(lesson::Column::CourseId.eq(course_id))
            .count(self.conn)
            .await
            .map_err(AppError::from)
    }

    pub async fn order_index_taken(&self, course_id: Uuid, order_index: i32) -> AppResult<bool> {
        let count = LessonEntity::find()
            .filter(lesson::Column::CourseId.eq(course_id))
            .filter(lesson::Column::OrderIndex.eq(order_index))
            .count(self.conn)
            .await
            .map_err(AppError::from)?;

        Ok(count > 0)
    }

    pub async fn create(&self, course_id: Uuid, input: NewLesson) -> AppResult<Lesson> {
        if self.order_index_taken(course_id, input.order_index).await? {
            return Err(AppError::conflict(ORDER_CONFLICT));
        }

        let now = Utc::now();
        let active_model = ActiveModel {
            id: Set(Uuid::new_v4()),
            course_id: Set(course_id),
            title: Set(input.title),
            content: Set(input.content),
            order_index: Set(input.order_index),
            is_published: Set(input.is_published),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = active_model
            .insert(self.conn)
            .await
            .map_err(|e| AppError::from_db_unique(e, ORDER_CONFLICT))?;

        Ok(Lesson::from(model))
    }

    pub async fn update(&self, id: Uuid, changes: UpdateLesson) -> AppResult<Lesson> {
        let model = LessonEntity::find_by_id(id)
            .one(self.conn)
            .await?
            .ok_or(AppError::NotFound)?;

        let mut active: ActiveModel = model.into();
        if let Some(title) = changes.title {
            active.title = Set(title);
        }
        if let Some(content) = changes.content {
            active.content = Set(Some(content));
        }
        if let Some(is_published) = changes.is_published {
            active.is_published = Set(is_published);
        }
        active.updated_at = Set(Utc::now());

        let model = active.update(self.conn).await.map_err(AppError::from)?;
        Ok(Lesson::from(model))
    }

    /// Move a lesson to a new position within its course.
    pub async fn set_order_index(&self, id: Uuid, order_index: i32) -> AppResult<Lesson> {
        let model = LessonEntity::find_by_id(id)
            .one(self.conn)
            .await?
            .ok_or(AppError::NotFound)?;

        if model.order_index == order_index {
            return Ok(Lesson::from(model));
        }
        if self.order_index_taken(model.course_id, order_index).await? {
            return Err(AppError::conflict(ORDER_CONFLICT));
        }

        let mut active: ActiveModel = model.into();
        active.order_index = Set(order_index);
        active.updated_at = Set(Utc::now());

        let model = active
            .update(self.conn)
            .await
            .map_err(|e| AppError::from_db_unique(e, ORDER_CONFLICT))?;

        Ok(Lesson::from(model))
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = LessonEntity::delete_by_id(id)
            .exec(self.conn)
            .await
            .map_err(AppError::from)?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound);
        }

        Ok(())
    }
}
