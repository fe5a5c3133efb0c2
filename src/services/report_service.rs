//! Report service - certificates and CSV exports.
//!
//! Every artifact is rendered by the [`DocumentExporter`], written through
//! [`FileStorage`] and recorded as a File row plus a Report row in one
//! transaction. Stored bytes are removed again if that transaction fails.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use super::access::enforce;
use super::progress_service::completion_of;
use crate::config::Config;
use crate::domain::{
    Actor, CertificateData, EnrollmentStatus, IssuedArtifact, NewFile, ProgressReportRow, Report,
    ReportKind, ReportStatus, StatsReportRow, Visibility,
};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::{DocumentExporter, FileStorage, RenderedDocument, UnitOfWork};
use crate::policy;

#[async_trait]
pub trait ReportService: Send + Sync {
    /// Certificate for `user_id` in a course they are enrolled in
    async fn issue_certificate(
        &self,
        actor: &Actor,
        user_id: Uuid,
        course_id: Uuid,
    ) -> AppResult<IssuedArtifact>;

    /// One CSV row per enrolled student, dropped enrollments included
    async fn export_course_progress(&self, actor: &Actor, course_id: Uuid) -> AppResult<IssuedArtifact>;

    /// One CSV row per course with lesson and enrollment counts
    async fn export_stats(&self, actor: &Actor) -> AppResult<IssuedArtifact>;

    async fn list_reports_for_user(&self, actor: &Actor, user_id: Uuid) -> AppResult<Vec<Report>>;

    /// Reports generated for courses the author created
    async fn list_reports_for_author(&self, actor: &Actor, author_id: Uuid) -> AppResult<Vec<Report>>;
}

pub struct ReportManager<U: UnitOfWork> {
    uow: Arc<U>,
    storage: Arc<dyn FileStorage>,
    exporter: Arc<dyn DocumentExporter>,
    config: Config,
}

impl<U: UnitOfWork> ReportManager<U> {
    pub fn new(
        uow: Arc<U>,
        storage: Arc<dyn FileStorage>,
        exporter: Arc<dyn DocumentExporter>,
        config: Config,
    ) -> Self {
        Self {
            uow,
            storage,
            exporter,
            config,
        }
    }

    /// Store rendered bytes and record them. The file belongs to `owner_id`.
    async fn persist(
        &self,
        owner_id: Uuid,
        course_id: Option<Uuid>,
        kind: ReportKind,
        document: RenderedDocument,
    ) -> AppResult<IssuedArtifact> {
        let RenderedDocument {
            bytes,
            content_type,
            file_name,
        } = document;
        let stored = self.storage.store(bytes, &file_name).await?;

        let new_file = NewFile {
            owner_user_id: Some(owner_id),
            original_name: file_name,
            path: stored.handle.clone(),
            content_type,
            size_bytes: stored.size_bytes,
            visibility: Visibility::Private,
        };

        let outcome = self
            .uow
            .transaction(move |tx| {
                Box::pin(async move {
                    let file = tx.files().create(new_file).await?;
                    let report = tx
                        .reports()
                        .create(owner_id, course_id, kind, ReportStatus::Ready, Some(file.id))
                        .await?;
                    Ok(IssuedArtifact { report, file })
                })
            })
            .await;

        match outcome {
            Ok(artifact) => Ok(artifact),
            Err(e) => {
                if let Err(cleanup) = self.storage.remove(&stored.handle).await {
                    error!(handle = %stored.handle, error = %cleanup, "Failed to remove orphaned report bytes");
                }
                Err(e)
            }
        }
    }
}

#[async_trait]
impl<U: UnitOfWork> ReportService for ReportManager<U> {
    async fn issue_certificate(
        &self,
        actor: &Actor,
        user_id: Uuid,
        course_id: Uuid,
    ) -> AppResult<IssuedArtifact> {
        enforce(actor, policy::can_issue_certificate(actor, user_id), "reports.certificate")?;

        let store = self.uow.store();
        let user = store.users().find_by_id(user_id).await?.ok_or_not_found()?;
        let course = store.courses().find_by_id(course_id).await?.ok_or_not_found()?;
        store
            .enrollments()
            .find(user_id, course_id)
            .await?
            .ok_or_not_found()?;

        if self.config.require_completion_for_certificate {
            let completion = completion_of(&store, user_id, course_id).await?;
            if !completion.is_complete() {
                return Err(AppError::invalid_state(format!(
                    "Course is {}% complete; certificates require 100%",
                    completion.percent
                )));
            }
        }

        let document = self.exporter.render_certificate(&CertificateData {
            username: user.username,
            email: user.email,
            course_title: course.title,
            course_slug: course.slug,
            issuer: self.config.certificate_issuer.clone(),
            issued_at: Utc::now(),
        })?;

        let artifact = self
            .persist(user_id, Some(course_id), ReportKind::Certificate, document)
            .await?;
        info!(
            user_id = %user_id,
            course_id = %course_id,
            report_id = %artifact.report.id,
            issued_by = ?actor.user_id(),
            "Certificate issued"
        );
        Ok(artifact)
    }

    async fn export_course_progress(&self, actor: &Actor, course_id: Uuid) -> AppResult<IssuedArtifact> {
        let store = self.uow.store();
        let course = store.courses().find_by_id(course_id).await?.ok_or_not_found()?;
        enforce(
            actor,
            policy::can_export_course_progress(actor, &course),
            "reports.progress_export",
        )?;
        let requester = actor.user_id().ok_or(AppError::Unauthenticated)?;

        let students = store.enrollments().list_for_course(course_id).await?;
        let mut rows = Vec::with_capacity(students.len());
        for (enrollment, user) in students {
            let completion = completion_of(&store, user.id, course_id).await?;
            rows.push(ProgressReportRow {
                user_id: user.id,
                username: user.username,
                email: user.email,
                enrollment_status: enrollment.status,
                enrolled_at: enrollment.enrolled_at,
                completed_lessons: completion.completed_lessons,
                total_lessons: completion.total_lessons,
                percent: completion.percent,
            });
        }

        let document = self.exporter.render_progress_report(&course.slug, &rows)?;
        let artifact = self
            .persist(requester, Some(course_id), ReportKind::ProgressExport, document)
            .await?;
        info!(course_id = %course_id, rows = rows.len(), "Progress report exported");
        Ok(artifact)
    }

    async fn export_stats(&self, actor: &Actor) -> AppResult<IssuedArtifact> {
        enforce(actor, policy::can_export_stats(actor), "reports.stats_export")?;
        let requester = actor.user_id().ok_or(AppError::Unauthenticated)?;

        let store = self.uow.store();
        let courses = store.courses().list_all().await?;
        let mut rows = Vec::with_capacity(courses.len());
        for course in courses {
            let enrollments = store.enrollments();
            rows.push(StatsReportRow {
                course_id: course.id,
                lessons: store.lessons().count_for_course(course.id).await?,
                active_enrollments: enrollments
                    .count_by_status(course.id, EnrollmentStatus::Active)
                    .await?,
                completed_enrollments: enrollments
                    .count_by_status(course.id, EnrollmentStatus::Completed)
                    .await?,
                dropped_enrollments: enrollments
                    .count_by_status(course.id, EnrollmentStatus::Dropped)
                    .await?,
                title: course.title,
                is_published: course.is_published,
            });
        }

        let document = self.exporter.render_stats_report(&rows)?;
        let artifact = self
            .persist(requester, None, ReportKind::StatsExport, document)
            .await?;
        info!(courses = rows.len(), "Platform statistics exported");
        Ok(artifact)
    }

    async fn list_reports_for_user(&self, actor: &Actor, user_id: Uuid) -> AppResult<Vec<Report>> {
        enforce(actor, policy::can_act_for_user(actor, user_id), "reports.list_for_user")?;
        self.uow.store().reports().list_for_user(user_id).await
    }

    async fn list_reports_for_author(&self, actor: &Actor, author_id: Uuid) -> AppResult<Vec<Report>> {
        enforce(actor, policy::can_act_for_user(actor, author_id), "reports.list_for_author")?;
        self.uow.store().reports().list_for_author(author_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ROLE_STUDENT;
    use crate::domain::{CourseLevel, NewCourse, Principal};
    use crate::infra::{Database, MockDocumentExporter, MockFileStorage, Persistence, StoredObject};

    async fn persistence() -> Arc<Persistence> {
        let db = Database::connect_url("sqlite::memory:").await.unwrap();
        db.run_migrations().await.unwrap();
        Arc::new(Persistence::new(db.get_connection()))
    }

    fn student(user_id: Uuid) -> Actor {
        Actor::Authenticated(Principal {
            user_id,
            username: "student".to_string(),
            email: "student@example.com".to_string(),
            roles: policy::roles(&[ROLE_STUDENT]),
        })
    }

    #[tokio::test]
    async fn test_nothing_rendered_or_stored_when_forbidden() {
        let uow = persistence().await;

        let mut exporter = MockDocumentExporter::new();
        exporter.expect_render_certificate().times(0);
        exporter.expect_render_progress_report().times(0);
        exporter.expect_render_stats_report().times(0);
        let mut storage = MockFileStorage::new();
        storage.expect_store().times(0);

        let service = ReportManager::new(uow, Arc::new(storage), Arc::new(exporter), Config::default());
        let caller = student(Uuid::new_v4());

        let certificate = service
            .issue_certificate(&caller, Uuid::new_v4(), Uuid::new_v4())
            .await;
        assert!(matches!(certificate, Err(AppError::Forbidden)));

        let stats = service.export_stats(&caller).await;
        assert!(matches!(stats, Err(AppError::Forbidden)));

        let anonymous = service.export_stats(&Actor::Anonymous).await;
        assert!(matches!(anonymous, Err(AppError::Unauthenticated)));
    }

    #[tokio::test]
    async fn test_stored_bytes_removed_when_database_write_fails() {
        let uow = persistence().await;
        let store = uow.store();
        let user = store
            .users()
            .create("ann@example.com".into(), "ann".into(), "hash".into())
            .await
            .unwrap();
        let course = store
            .courses()
            .create(
                NewCourse {
                    title: "Rust".to_string(),
                    slug: "rust".to_string(),
                    description: None,
                    level: CourseLevel::Beginner,
                    is_published: true,
                },
                None,
            )
            .await
            .unwrap();
        store.enrollments().create(user.id, course.id).await.unwrap();

        let mut exporter = MockDocumentExporter::new();
        exporter.expect_render_certificate().times(2).returning(|_| {
            Ok(RenderedDocument {
                bytes: b"certificate".to_vec(),
                content_type: "text/plain".to_string(),
                file_name: "certificate.txt".to_string(),
            })
        });

        // Every stored object gets the same handle, so the second file row
        // violates the unique path constraint.
        let mut storage = MockFileStorage::new();
        storage.expect_store().times(2).returning(|bytes, _| {
            Ok(StoredObject {
                handle: "fixed-handle".to_string(),
                size_bytes: bytes.len() as i64,
            })
        });
        storage
            .expect_remove()
            .withf(|handle| handle == "fixed-handle")
            .times(1)
            .returning(|_| Ok(()));

        let service = ReportManager::new(
            uow.clone(),
            Arc::new(storage),
            Arc::new(exporter),
            Config::default(),
        );
        let caller = student(user.id);

        let first = service.issue_certificate(&caller, user.id, course.id).await;
        assert!(first.is_ok());

        let second = service.issue_certificate(&caller, user.id, course.id).await;
        assert!(matches!(second, Err(AppError::Conflict(_))));

        let reports = uow.store().reports().list_for_user(user.id).await.unwrap();
        assert_eq!(reports.len(), 1);
    }
}
