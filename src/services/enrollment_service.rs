//! Enrollment service - the (none) -> active -> {completed, dropped} lifecycle.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::access::{enforce, has_content_access};
use crate::domain::{Actor, CourseEnrollment, Enrollment, EnrollmentStatus};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::{TransactionContext, UnitOfWork};
use crate::policy;

#[async_trait]
pub trait EnrollmentService: Send + Sync {
    /// Enroll the actor in a published course
    async fn enroll(&self, actor: &Actor, course_id: Uuid) -> AppResult<Enrollment>;

    /// Enroll someone else; course author or admin
    async fn enroll_user(&self, actor: &Actor, user_id: Uuid, course_id: Uuid) -> AppResult<Enrollment>;

    /// Mark an active enrollment completed; course author or admin
    async fn complete(&self, actor: &Actor, user_id: Uuid, course_id: Uuid) -> AppResult<Enrollment>;

    /// Drop an active enrollment; the student, the course author or an admin
    async fn drop_enrollment(&self, actor: &Actor, user_id: Uuid, course_id: Uuid) -> AppResult<Enrollment>;

    /// Reactivate the actor's dropped enrollment
    async fn re_enroll(&self, actor: &Actor, course_id: Uuid) -> AppResult<Enrollment>;

    async fn list_my_enrollments(&self, actor: &Actor) -> AppResult<Vec<CourseEnrollment>>;

    /// Whether the actor may read the course's lessons
    async fn can_access_content(&self, actor: &Actor, course_id: Uuid) -> AppResult<bool>;
}

pub struct EnrollmentManager<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> EnrollmentManager<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }

    async fn transition(
        &self,
        user_id: Uuid,
        course_id: Uuid,
        to: EnrollmentStatus,
    ) -> AppResult<Enrollment> {
        let enrollment = self
            .uow
            .transaction(move |tx| Box::pin(transition_in(tx, user_id, course_id, to)))
            .await?;

        info!(
            user_id = %user_id,
            course_id = %course_id,
            status = %enrollment.status,
            "Enrollment status changed"
        );
        Ok(enrollment)
    }
}

/// Apply a status transition inside an open transaction.
pub(crate) async fn transition_in(
    tx: TransactionContext<'_>,
    user_id: Uuid,
    course_id: Uuid,
    to: EnrollmentStatus,
) -> AppResult<Enrollment> {
    let enrollment = tx
        .enrollments()
        .find(user_id, course_id)
        .await?
        .ok_or_not_found()?;
    let status = enrollment.status.transition(to)?;
    tx.enrollments().set_status(enrollment.id, status).await
}

#[async_trait]
impl<U: UnitOfWork> EnrollmentService for EnrollmentManager<U> {
    async fn enroll(&self, actor: &Actor, course_id: Uuid) -> AppResult<Enrollment> {
        enforce(actor, policy::authenticated(actor), "enrollments.enroll")?;
        let user_id = actor.user_id().ok_or(AppError::Unauthenticated)?;

        let store = self.uow.store();
        let course = store.courses().find_by_id(course_id).await?.ok_or_not_found()?;
        if !course.is_published {
            return Err(AppError::NotFound);
        }
        if store.enrollments().find(user_id, course_id).await?.is_some() {
            return Err(AppError::conflict("Enrollment"));
        }

        let enrollment = store.enrollments().create(user_id, course_id).await?;
        info!(user_id = %user_id, course_id = %course_id, "Enrolled");
        Ok(enrollment)
    }

    async fn enroll_user(&self, actor: &Actor, user_id: Uuid, course_id: Uuid) -> AppResult<Enrollment> {
        let store = self.uow.store();
        let course = store.courses().find_by_id(course_id).await?.ok_or_not_found()?;
        enforce(actor, policy::can_manage_course(actor, &course), "enrollments.enroll_user")?;

        store.users().find_by_id(user_id).await?.ok_or_not_found()?;
        if store.enrollments().find(user_id, course_id).await?.is_some() {
            return Err(AppError::conflict("Enrollment"));
        }

        let enrollment = store.enrollments().create(user_id, course_id).await?;
        info!(
            user_id = %user_id,
            course_id = %course_id,
            enrolled_by = ?actor.user_id(),
            "Enrolled on behalf"
        );
        Ok(enrollment)
    }

    async fn complete(&self, actor: &Actor, user_id: Uuid, course_id: Uuid) -> AppResult<Enrollment> {
        let course = self
            .uow
            .store()
            .courses()
            .find_by_id(course_id)
            .await?
            .ok_or_not_found()?;
        enforce(actor, policy::can_manage_course(actor, &course), "enrollments.complete")?;

        self.transition(user_id, course_id, EnrollmentStatus::Completed).await
    }

    async fn drop_enrollment(&self, actor: &Actor, user_id: Uuid, course_id: Uuid) -> AppResult<Enrollment> {
        let course = self
            .uow
            .store()
            .courses()
            .find_by_id(course_id)
            .await?
            .ok_or_not_found()?;
        let decision = policy::can_act_for_user(actor, user_id)
            .or(policy::can_manage_course(actor, &course));
        enforce(actor, decision, "enrollments.drop")?;

        self.transition(user_id, course_id, EnrollmentStatus::Dropped).await
    }

    async fn re_enroll(&self, actor: &Actor, course_id: Uuid) -> AppResult<Enrollment> {
        enforce(actor, policy::authenticated(actor), "enrollments.re_enroll")?;
        let user_id = actor.user_id().ok_or(AppError::Unauthenticated)?;

        let course = self
            .uow
            .store()
            .courses()
            .find_by_id(course_id)
            .await?
            .ok_or_not_found()?;
        if !course.is_published {
            return Err(AppError::NotFound);
        }

        self.transition(user_id, course_id, EnrollmentStatus::Active).await
    }

    async fn list_my_enrollments(&self, actor: &Actor) -> AppResult<Vec<CourseEnrollment>> {
        enforce(actor, policy::authenticated(actor), "enrollments.mine")?;
        let user_id = actor.user_id().ok_or(AppError::Unauthenticated)?;

        let rows = self.uow.store().enrollments().list_for_user(user_id).await?;
        Ok(rows
            .into_iter()
            .map(|(enrollment, course)| CourseEnrollment { course, enrollment })
            .collect())
    }

    async fn can_access_content(&self, actor: &Actor, course_id: Uuid) -> AppResult<bool> {
        let store = self.uow.store();
        let course = store.courses().find_by_id(course_id).await?.ok_or_not_found()?;
        has_content_access(&store, actor, &course).await
    }
}
