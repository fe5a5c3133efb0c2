//! Enrollment repository.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use super::entities::course::Entity as CourseEntity;
use super::entities::enrollment::{self, ActiveModel, Entity as EnrollmentEntity};
use super::entities::user::Entity as UserEntity;
use crate::domain::{Course, Enrollment, EnrollmentStatus, User};
use crate::errors::{AppError, AppResult};

pub struct EnrollmentRepository<'c, C> {
    conn: &'c C,
}

impl<'c, C: ConnectionTrait> EnrollmentRepository<'c, C> {
    pub(crate) fn new(conn: &'c C) -> Self {
        Self { conn }
    }

    pub async fn find(&self, user_id: Uuid, course_id: Uuid) -> AppResult<Option<Enrollment>> {
        let result = EnrollmentEntity::find()
            .filter(enrollment::Column::UserId.eq(user_id))
            .filter(enrollment::Column::CourseId.eq(course_id))
            .one(self.conn)
            .await
            .map_err(AppError::from)?;

        result.map(Enrollment::try_from).transpose()
    }

    /// Insert an active enrollment. A second row for the same pair is a conflict.
    pub async fn create(&self, user_id: Uuid, course_id: Uuid) -> AppResult<Enrollment> {
        let now = Utc::now();
        let active_model = ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            course_id: Set(course_id),
            status: Set(EnrollmentStatus::Active.as_str().to_string()),
            enrolled_at: Set(now),
            updated_at: Set(now),
        };

        let model = active_model
            .insert(self.conn)
            .await
            .map_err(|e| AppError::from_db_unique(e, "Enrollment"))?;

        Enrollment::try_from(model)
    }

    pub async fn set_status(&self, id: Uuid, status: EnrollmentStatus) -> AppResult<Enrollment> {
        let model = EnrollmentEntity::find_by_id(id)
            .one(self.conn)
            .await?
            .ok_or(AppError::NotFound)?;

        let mut active: ActiveModel = model.into();
        active.status = Set(status.as_str().to_string());
        active.updated_at = Set(Utc::now());

        let model = active.update(self.conn).await.map_err(AppError::from)?;
        Enrollment::try_from(model)
    }

    /// A user's enrollments with their courses, most recent first
    pub async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<(Enrollment, Course)>> {
        let rows = EnrollmentEntity::find()
            .filter(enrollment::Column::UserId.eq(user_id))
            .order_by_desc(enrollment::Column::EnrolledAt)
            .find_also_related(CourseEntity)
            .all(self.conn)
            .await
            .map_err(AppError::from)?;

        rows.into_iter()
            .filter_map(|(enrollment, course)| course.map(|c| (enrollment, c)))
            .map(|(enrollment, course)| -> AppResult<(Enrollment, Course)> {
                Ok((Enrollment::try_from(enrollment)?, Course::try_from(course)?))
            })
            .collect()
    }

    /// Enrollments of a course with their students, oldest first
    pub async fn list_for_course(&self, course_id: Uuid) -> AppResult<Vec<(Enrollment, User)>> {
        let rows = EnrollmentEntity::find()
            .filter(enrollment::Column::CourseId.eq(course_id))
            .order_by_asc(enrollment::Column::EnrolledAt)
            .find_also_related(UserEntity)
            .all(self.conn)
            .await
            .map_err(AppError::from)?;

        rows.into_iter()
            .filter_map(|(enrollment, user)| user.map(|u| (enrollment, u)))
            .map(|(enrollment, user)| -> AppResult<(Enrollment, User)> {
                Ok((Enrollment::try_from(enrollment)?, User::from(user)))
            })
            .collect()
    }

    pub async fn count_by_status(&self, course_id: Uuid, status: EnrollmentStatus) -> AppResult<u64> {
        EnrollmentEntity::find()
            .filter(enrollment::Column::CourseId.eq(course_id))
            .filter(enrollment::Column::Status.eq(status.as_str()))
            .count(self.conn)
            .await
            .map_err(AppError::from)
    }
}
