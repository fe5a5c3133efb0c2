use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use super::entities::course::{self, Entity as CourseEntity};
use super::entities::report::{self, ActiveModel, Entity as ReportEntity};
use crate::domain::{Report, ReportKind, ReportStatus};
use crate::errors::{AppError, AppResult};

pub struct ReportRepository<'c, C> {
    conn: &'c C,
}

impl<'c, C: ConnectionTrait> ReportRepository<'c, C> {
    pub(crate) fn new(conn: &'c C) -> Self {
        Self { conn }
    }

    pub async fn create(
        &self,
        user_id: Uuid,
        course_id: Option<Uuid>,
        kind: ReportKind,
        status: ReportStatus,
        file_id: Option<Uuid>,
    ) -> AppResult<Report> {
        let active_model = ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            course_id: Set(course_id),
            kind: Set(kind.as_str().to_string()),
            status: Set(status.as_str().to_string()),
            file_id: Set(file_id),
            created_at: Set(Utc::now()),
        };

        let model = active_model.insert(self.conn).await.map_err(AppError::from)?;
        Report::try_from(model)
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<Report>> {
        let models = ReportEntity::find()
            .filter(report::Column::UserId.eq(user_id))
            .order_by_desc(report::Column::CreatedAt)
            .all(self.conn)
            .await
            .map_err(AppError::from)?;

        models.into_iter().map(Report::try_from).collect()
    }

    /// Reports attached to courses authored by `author_id`
    pub async fn list_for_author(&self, author_id: Uuid) -> AppResult<Vec<Report>> {
        let models = ReportEntity::find()
            .inner_join(CourseEntity)
            .filter(course::Column::CreatedBy.eq(author_id))
            .order_by_desc(report::Column::CreatedAt)
            .all(self.conn)
            .await
            .map_err(AppError::from)?;

        models.into_iter().map(Report::try_from).collect()
    }
}
