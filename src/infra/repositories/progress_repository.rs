//! Lesson progress repository.
//!
//! Writes are upserts keyed on `(user_id, lesson_id)`: a seed row is inserted
//! with `ON CONFLICT DO NOTHING` and then updated in place, so concurrent
//! first visits never create duplicates. Status only ever moves forward and
//! `completed_at` keeps its first value.

use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, Func, OnConflict, SimpleExpr};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter, Set,
};
use uuid::Uuid;

use super::entities::lesson::{self, Entity as LessonEntity};
use super::entities::progress::{self, ActiveModel, Entity as ProgressEntity};
use crate::domain::{LessonProgressMap, ProgressRecord, ProgressStatus};
use crate::errors::{AppError, AppResult};

pub struct ProgressRepository<'c, C> {
    conn: &'c C,
}

impl<'c, C: ConnectionTrait> ProgressRepository<'c, C> {
    pub(crate) fn new(conn: &'c C) -> Self {
        Self { conn }
    }

    pub async fn find(&self, user_id: Uuid, lesson_id: Uuid) -> AppResult<Option<ProgressRecord>> {
        let result = ProgressEntity::find()
            .filter(progress::Column::UserId.eq(user_id))
            .filter(progress::Column::LessonId.eq(lesson_id))
            .one(self.conn)
            .await
            .map_err(AppError::from)?;

        result.map(ProgressRecord::try_from).transpose()
    }

    /// Progress rows of one user for every lesson of a course, keyed by lesson
    pub async fn map_for_course(&self, user_id: Uuid, course_id: Uuid) -> AppResult<LessonProgressMap> {
        let models = ProgressEntity::find()
            .inner_join(LessonEntity)
            .filter(progress::Column::UserId.eq(user_id))
            .filter(lesson::Column::CourseId.eq(course_id))
            .all(self.conn)
            .await
            .map_err(AppError::from)?;

        models
            .into_iter()
            .map(|m| -> AppResult<(Uuid, ProgressRecord)> {
                let record = ProgressRecord::try_from(m)?;
                Ok((record.lesson_id, record))
            })
            .collect()
    }

    /// Number of lessons of a course the user has completed
    pub async fn count_completed(&self, user_id: Uuid, course_id: Uuid) -> AppResult<u64> {
        ProgressEntity::find()
            .inner_join(LessonEntity)
            .filter(progress::Column::UserId.eq(user_id))
            .filter(lesson::Column::CourseId.eq(course_id))
            .filter(progress::Column::Status.eq(ProgressStatus::Completed.as_str()))
            .count(self.conn)
            .await
            .map_err(AppError::from)
    }

    /// Record a view: creates the row as in-progress, promotes not-started,
    /// and always refreshes `last_viewed_at`.
    pub async fn mark_viewed(
        &self,
        user_id: Uuid,
        lesson_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<ProgressRecord> {
        self.insert_if_missing(user_id, lesson_id, ProgressStatus::InProgress, now)
            .await?;

        ProgressEntity::update_many()
            .col_expr(progress::Column::LastViewedAt, Expr::value(now))
            .col_expr(progress::Column::UpdatedAt, Expr::value(now))
            .filter(progress::Column::UserId.eq(user_id))
            .filter(progress::Column::LessonId.eq(lesson_id))
            .exec(self.conn)
            .await?;

        ProgressEntity::update_many()
            .col_expr(
                progress::Column::Status,
                Expr::value(ProgressStatus::InProgress.as_str()),
            )
            .filter(progress::Column::UserId.eq(user_id))
            .filter(progress::Column::LessonId.eq(lesson_id))
            .filter(progress::Column::Status.eq(ProgressStatus::NotStarted.as_str()))
            .exec(self.conn)
            .await?;

        self.find(user_id, lesson_id).await?.ok_or(AppError::NotFound)
    }

    /// Record a completion. Repeating it keeps the original `completed_at`;
    /// a supplied score replaces the previous one.
    pub async fn mark_completed(
        &self,
        user_id: Uuid,
        lesson_id: Uuid,
        score: Option<f64>,
        now: DateTime<Utc>,
    ) -> AppResult<ProgressRecord> {
        self.insert_if_missing(user_id, lesson_id, ProgressStatus::NotStarted, now)
            .await?;

        let first_completion: [SimpleExpr; 2] = [
            Expr::col(progress::Column::CompletedAt).into(),
            Expr::value(now),
        ];

        let mut update = ProgressEntity::update_many()
            .col_expr(
                progress::Column::Status,
                Expr::value(ProgressStatus::Completed.as_str()),
            )
            .col_expr(
                progress::Column::CompletedAt,
                SimpleExpr::from(Func::coalesce(first_completion)),
            )
            .col_expr(progress::Column::UpdatedAt, Expr::value(now));
        if let Some(score) = score {
            update = update.col_expr(progress::Column::Score, Expr::value(score));
        }

        update
            .filter(progress::Column::UserId.eq(user_id))
            .filter(progress::Column::LessonId.eq(lesson_id))
            .exec(self.conn)
            .await?;

        self.find(user_id, lesson_id).await?.ok_or(AppError::NotFound)
    }

    async fn insert_if_missing(
        &self,
        user_id: Uuid,
        lesson_id: Uuid,
        status: ProgressStatus,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        let seed = ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            lesson_id: Set(lesson_id),
            status: Set(status.as_str().to_string()),
            score: Set(None),
            completed_at: Set(None),
            last_viewed_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let result = ProgressEntity::insert(seed)
            .on_conflict(
                OnConflict::columns([progress::Column::UserId, progress::Column::LessonId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(self.conn)
            .await;

        match result {
            Ok(_) | Err(DbErr::RecordNotInserted) => Ok(()),
            Err(e) => Err(AppError::from(e)),
        }
    }
}
