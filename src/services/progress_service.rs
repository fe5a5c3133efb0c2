//! Progress service - lesson views, completions and course completion.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::ConnectionTrait;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::access::{enforce, require_content_access};
use crate::config::Config;
use crate::domain::progress::validate_score;
use crate::domain::{
    Actor, Course, CourseCompletion, CourseProgress, EnrollmentStatus, Lesson, LessonProgressMap,
    ProgressRecord,
};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::{Store, UnitOfWork};
use crate::policy;

#[async_trait]
pub trait ProgressService: Send + Sync {
    /// Completion percentage of `user_id` in a course
    async fn course_completion(
        &self,
        actor: &Actor,
        user_id: Uuid,
        course_id: Uuid,
    ) -> AppResult<CourseCompletion>;

    /// Existing progress rows of `user_id` for the course's lessons
    async fn lesson_progress_map(
        &self,
        actor: &Actor,
        user_id: Uuid,
        course_id: Uuid,
    ) -> AppResult<LessonProgressMap>;

    /// Record that the actor opened a lesson
    async fn mark_lesson_viewed(&self, actor: &Actor, lesson_id: Uuid) -> AppResult<ProgressRecord>;

    /// Record that the actor finished a lesson, optionally with a score
    async fn mark_lesson_completed(
        &self,
        actor: &Actor,
        lesson_id: Uuid,
        score: Option<f64>,
    ) -> AppResult<ProgressRecord>;

    /// Completion for every course `user_id` is enrolled in
    async fn course_progress_overview(&self, actor: &Actor, user_id: Uuid) -> AppResult<Vec<CourseProgress>>;
}

pub struct ProgressTracker<U: UnitOfWork> {
    uow: Arc<U>,
    config: Config,
}

impl<U: UnitOfWork> ProgressTracker<U> {
    pub fn new(uow: Arc<U>, config: Config) -> Self {
        Self { uow, config }
    }

    /// The lesson and its course, checked readable by the actor.
    async fn lesson_for_learner(&self, actor: &Actor, lesson_id: Uuid) -> AppResult<(Lesson, Course)> {
        enforce(actor, policy::authenticated(actor), "progress.record")?;

        let store = self.uow.store();
        let lesson = store.lessons().find_by_id(lesson_id).await?.ok_or_not_found()?;
        let course = store
            .courses()
            .find_by_id(lesson.course_id)
            .await?
            .ok_or_not_found()?;

        require_content_access(&store, actor, &course).await?;
        if !lesson.is_published && !policy::can_manage_course(actor, &course).is_allowed() {
            return Err(AppError::NotFound);
        }
        Ok((lesson, course))
    }

    /// Reading someone's progress: the user themself, the course author or an admin.
    async fn check_progress_readable(
        &self,
        actor: &Actor,
        user_id: Uuid,
        course_id: Uuid,
    ) -> AppResult<()> {
        let decision = policy::can_act_for_user(actor, user_id);
        if decision.is_allowed() {
            return Ok(());
        }

        let course = self
            .uow
            .store()
            .courses()
            .find_by_id(course_id)
            .await?
            .ok_or_not_found()?;
        enforce(
            actor,
            decision.or(policy::can_view_course_students(actor, &course)),
            "progress.read",
        )
    }
}

/// `completed / total` for one user and course.
pub(crate) async fn completion_of<C: ConnectionTrait>(
    store: &Store<'_, C>,
    user_id: Uuid,
    course_id: Uuid,
) -> AppResult<CourseCompletion> {
    let total = store.lessons().count_for_course(course_id).await?;
    if total == 0 {
        return Ok(CourseCompletion::new(course_id, 0, 0));
    }
    let completed = store.progress().count_completed(user_id, course_id).await?;
    Ok(CourseCompletion::new(course_id, completed, total))
}

#[async_trait]
impl<U: UnitOfWork> ProgressService for ProgressTracker<U> {
    async fn course_completion(
        &self,
        actor: &Actor,
        user_id: Uuid,
        course_id: Uuid,
    ) -> AppResult<CourseCompletion> {
        self.check_progress_readable(actor, user_id, course_id).await?;

        let store = self.uow.store();
        store.courses().find_by_id(course_id).await?.ok_or_not_found()?;
        completion_of(&store, user_id, course_id).await
    }

    async fn lesson_progress_map(
        &self,
        actor: &Actor,
        user_id: Uuid,
        course_id: Uuid,
    ) -> AppResult<LessonProgressMap> {
        self.check_progress_readable(actor, user_id, course_id).await?;
        self.uow.store().progress().map_for_course(user_id, course_id).await
    }

    async fn mark_lesson_viewed(&self, actor: &Actor, lesson_id: Uuid) -> AppResult<ProgressRecord> {
        let (lesson, _) = self.lesson_for_learner(actor, lesson_id).await?;
        let user_id = actor.user_id().ok_or(AppError::Unauthenticated)?;

        let now = Utc::now();
        self.uow
            .transaction(move |tx| {
                Box::pin(async move { tx.progress().mark_viewed(user_id, lesson.id, now).await })
            })
            .await
    }

    async fn mark_lesson_completed(
        &self,
        actor: &Actor,
        lesson_id: Uuid,
        score: Option<f64>,
    ) -> AppResult<ProgressRecord> {
        validate_score(score)?;
        let (lesson, course) = self.lesson_for_learner(actor, lesson_id).await?;
        let user_id = actor.user_id().ok_or(AppError::Unauthenticated)?;

        let now = Utc::now();
        let auto_complete = self.config.auto_complete_enrollment;
        let course_id = course.id;

        let (record, enrollment_completed) = self
            .uow
            .transaction(move |tx| {
                Box::pin(async move {
                    let record = tx
                        .progress()
                        .mark_completed(user_id, lesson.id, score, now)
                        .await?;
                    if !auto_complete {
                        return Ok((record, false));
                    }

                    let completion = completion_of(&tx, user_id, course_id).await?;
                    let enrollment = tx.enrollments().find(user_id, course_id).await?;
                    match enrollment {
                        Some(e) if completion.is_complete() && e.status == EnrollmentStatus::Active => {
                            tx.enrollments()
                                .set_status(e.id, EnrollmentStatus::Completed)
                                .await?;
                            Ok((record, true))
                        }
                        _ => Ok((record, false)),
                    }
                })
            })
            .await?;

        info!(user_id = %user_id, lesson_id = %lesson_id, score = ?score, "Lesson completed");
        if enrollment_completed {
            info!(user_id = %user_id, course_id = %course_id, "Enrollment completed");
        }
        Ok(record)
    }

    async fn course_progress_overview(&self, actor: &Actor, user_id: Uuid) -> AppResult<Vec<CourseProgress>> {
        enforce(actor, policy::can_act_for_user(actor, user_id), "progress.overview")?;

        let store = self.uow.store();
        let enrollments = store.enrollments().list_for_user(user_id).await?;

        let mut overview = Vec::with_capacity(enrollments.len());
        for (enrollment, course) in enrollments {
            let completion = completion_of(&store, user_id, course.id).await?;
            overview.push(CourseProgress {
                course,
                enrollment_status: enrollment.status,
                completion,
            });
        }
        Ok(overview)
    }
}
