//! Certificates and CSV exports.

mod common;

use tokio::io::AsyncReadExt;

use course_hub::config::Config;
use course_hub::domain::{Actor, ReportKind, ReportStatus, Visibility};
use course_hub::errors::ErrorKind;
use course_hub::services::ServiceContainer;

use common::{setup, setup_with, user_id, TestApp};

async fn download_text(app: &TestApp, actor: &Actor, file_id: uuid::Uuid) -> String {
    let (_, mut stream) = app.services.files().download(actor, file_id).await.unwrap();
    let mut body = String::new();
    stream.read_to_string(&mut body).await.unwrap();
    body
}

#[tokio::test]
async fn test_student_gets_own_certificate() {
    let app = setup().await;
    let teacher = app.teacher("tina").await;
    let student = app.student("sam").await;
    let other = app.student("olga").await;
    let (course, _) = app.course(&teacher, "rust-101", 1).await;
    app.services.enrollments().enroll(&student, course.id).await.unwrap();

    let reports = app.services.reports();
    let artifact = reports
        .issue_certificate(&student, user_id(&student), course.id)
        .await
        .unwrap();
    assert_eq!(artifact.report.kind, ReportKind::Certificate);
    assert_eq!(artifact.report.status, ReportStatus::Ready);
    assert_eq!(artifact.report.user_id, user_id(&student));
    assert_eq!(artifact.report.course_id, Some(course.id));
    assert_eq!(artifact.report.file_id, Some(artifact.file.id));
    assert_eq!(artifact.file.visibility, Visibility::Private);
    assert_eq!(artifact.file.owner_user_id, Some(user_id(&student)));

    let text = download_text(&app, &student, artifact.file.id).await;
    assert!(text.contains("sam"));
    assert!(text.contains("Course rust-101"));

    let err = app
        .services
        .files()
        .get_file(&other, artifact.file.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let mine = reports
        .list_reports_for_user(&student, user_id(&student))
        .await
        .unwrap();
    assert_eq!(mine.len(), 1);
    let authored = reports
        .list_reports_for_author(&teacher, user_id(&teacher))
        .await
        .unwrap();
    assert_eq!(authored.len(), 1);
}

#[tokio::test]
async fn test_certificate_rules() {
    let app = setup().await;
    let teacher = app.teacher("tina").await;
    let student = app.student("sam").await;
    let other = app.student("olga").await;
    let (course, _) = app.course(&teacher, "rules", 1).await;
    let reports = app.services.reports();

    // Not enrolled
    let err = reports
        .issue_certificate(&student, user_id(&student), course.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    app.services.enrollments().enroll(&student, course.id).await.unwrap();

    let err = reports
        .issue_certificate(&other, user_id(&student), course.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let err = reports
        .issue_certificate(&Actor::Anonymous, user_id(&student), course.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthenticated);

    // Staff may issue on a student's behalf
    assert!(reports
        .issue_certificate(&teacher, user_id(&student), course.id)
        .await
        .is_ok());
    assert_eq!(app.storage.len(), 1);
}

#[tokio::test]
async fn test_certificate_can_require_full_completion() {
    let app = setup_with(Config {
        require_completion_for_certificate: true,
        ..Config::default()
    })
    .await;
    let teacher = app.teacher("tina").await;
    let student = app.student("sam").await;
    let (course, lessons) = app.course(&teacher, "strict", 2).await;
    app.services.enrollments().enroll(&student, course.id).await.unwrap();
    let reports = app.services.reports();

    app.services
        .progress()
        .mark_lesson_completed(&student, lessons[0].id, None)
        .await
        .unwrap();
    let err = reports
        .issue_certificate(&student, user_id(&student), course.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(app.storage.len(), 0);

    app.services
        .progress()
        .mark_lesson_completed(&student, lessons[1].id, None)
        .await
        .unwrap();
    assert!(reports
        .issue_certificate(&student, user_id(&student), course.id)
        .await
        .is_ok());
}

#[tokio::test]
async fn test_progress_export_lists_every_enrollment() {
    let app = setup().await;
    let teacher = app.teacher("tina").await;
    let other_teacher = app.teacher("theo").await;
    let active = app.student("sam").await;
    let dropped = app.student("dora").await;
    let (course, lessons) = app.course(&teacher, "export", 2).await;

    let enrollments = app.services.enrollments();
    enrollments.enroll(&active, course.id).await.unwrap();
    enrollments.enroll(&dropped, course.id).await.unwrap();
    app.services
        .progress()
        .mark_lesson_completed(&active, lessons[0].id, None)
        .await
        .unwrap();
    enrollments
        .drop_enrollment(&dropped, user_id(&dropped), course.id)
        .await
        .unwrap();

    let reports = app.services.reports();
    let err = reports
        .export_course_progress(&other_teacher, course.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let artifact = reports.export_course_progress(&teacher, course.id).await.unwrap();
    assert_eq!(artifact.report.kind, ReportKind::ProgressExport);
    assert_eq!(artifact.file.owner_user_id, Some(user_id(&teacher)));

    let csv = download_text(&app, &teacher, artifact.file.id).await;
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("user_id,username,email"));
    let sam = lines.iter().find(|l| l.contains(",sam,")).unwrap();
    assert!(sam.contains(",active,"));
    assert!(sam.ends_with(",1,2,50"));
    let dora = lines.iter().find(|l| l.contains(",dora,")).unwrap();
    assert!(dora.contains(",dropped,"));
}

#[tokio::test]
async fn test_stats_export_is_admin_only() {
    let app = setup().await;
    let teacher = app.teacher("tina").await;
    app.course(&teacher, "stats-a", 3).await;
    app.course(&teacher, "stats-b", 0).await;
    let reports = app.services.reports();

    let err = reports.export_stats(&teacher).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let artifact = reports.export_stats(&app.admin).await.unwrap();
    assert_eq!(artifact.report.kind, ReportKind::StatsExport);
    assert_eq!(artifact.report.course_id, None);

    let csv = download_text(&app, &app.admin, artifact.file.id).await;
    assert_eq!(csv.lines().count(), 3);
    assert!(csv.contains("Course stats-a"));
}
