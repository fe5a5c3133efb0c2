//! Enrollment lifecycle and content access.

mod common;

use course_hub::domain::{Actor, EnrollmentStatus, UpdateCourse};
use course_hub::errors::ErrorKind;
use course_hub::services::ServiceContainer;

use common::{setup, user_id};

#[tokio::test]
async fn test_duplicate_enrollment_is_conflict_and_keeps_row() {
    let app = setup().await;
    let teacher = app.teacher("tina").await;
    let student = app.student("sam").await;
    let (course, _) = app.course(&teacher, "dup", 1).await;

    let enrollments = app.services.enrollments();
    let first = enrollments.enroll(&student, course.id).await.unwrap();
    let err = enrollments.enroll(&student, course.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let mine = enrollments.list_my_enrollments(&student).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].enrollment.id, first.id);
    assert_eq!(mine[0].enrollment.status, EnrollmentStatus::Active);
    assert_eq!(mine[0].enrollment.enrolled_at, first.enrolled_at);
}

#[tokio::test]
async fn test_enroll_requires_login_and_published_course() {
    let app = setup().await;
    let teacher = app.teacher("tina").await;
    let student = app.student("sam").await;
    let (course, _) = app.course(&teacher, "draft", 1).await;
    app.services
        .catalog()
        .set_course_published(&teacher, course.id, false)
        .await
        .unwrap();

    let enrollments = app.services.enrollments();
    let err = enrollments.enroll(&Actor::Anonymous, course.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthenticated);

    let err = enrollments.enroll(&student, course.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_drop_revokes_access_and_re_enroll_restores_it() {
    let app = setup().await;
    let teacher = app.teacher("tina").await;
    let student = app.student("sam").await;
    let (course, lessons) = app.course(&teacher, "cycle", 2).await;
    let enrollments = app.services.enrollments();

    enrollments.enroll(&student, course.id).await.unwrap();
    assert!(enrollments.can_access_content(&student, course.id).await.unwrap());

    let dropped = enrollments
        .drop_enrollment(&student, user_id(&student), course.id)
        .await
        .unwrap();
    assert_eq!(dropped.status, EnrollmentStatus::Dropped);
    assert!(!enrollments.can_access_content(&student, course.id).await.unwrap());

    let err = app
        .services
        .catalog()
        .get_lesson(&student, lessons[0].id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    // The dropped row still blocks a plain enroll
    let err = enrollments.enroll(&student, course.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let active = enrollments.re_enroll(&student, course.id).await.unwrap();
    assert_eq!(active.id, dropped.id);
    assert_eq!(active.status, EnrollmentStatus::Active);
    assert!(app
        .services
        .catalog()
        .get_lesson(&student, lessons[0].id)
        .await
        .is_ok());
}

#[tokio::test]
async fn test_completed_is_terminal() {
    let app = setup().await;
    let teacher = app.teacher("tina").await;
    let student = app.student("sam").await;
    let (course, _) = app.course(&teacher, "final", 1).await;
    let enrollments = app.services.enrollments();

    enrollments.enroll(&student, course.id).await.unwrap();
    let completed = enrollments
        .complete(&teacher, user_id(&student), course.id)
        .await
        .unwrap();
    assert_eq!(completed.status, EnrollmentStatus::Completed);
    assert!(enrollments.can_access_content(&student, course.id).await.unwrap());

    let err = enrollments
        .drop_enrollment(&student, user_id(&student), course.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let err = enrollments.re_enroll(&student, course.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn test_only_course_managers_complete_or_enroll_others() {
    let app = setup().await;
    let teacher = app.teacher("tina").await;
    let other_teacher = app.teacher("theo").await;
    let student = app.student("sam").await;
    let (course, _) = app.course(&teacher, "managed", 1).await;
    let enrollments = app.services.enrollments();

    let err = enrollments
        .enroll_user(&other_teacher, user_id(&student), course.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    enrollments
        .enroll_user(&teacher, user_id(&student), course.id)
        .await
        .unwrap();

    let err = enrollments
        .complete(&student, user_id(&student), course.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let students = app.services.catalog().course_students(&teacher, course.id).await.unwrap();
    assert_eq!(students.len(), 1);
    assert_eq!(students[0].user.id, user_id(&student));
}

#[tokio::test]
async fn test_author_and_admin_access_content_without_enrollment() {
    let app = setup().await;
    let teacher = app.teacher("tina").await;
    let stranger = app.student("sam").await;
    let (course, _) = app.course(&teacher, "owned", 1).await;
    let enrollments = app.services.enrollments();

    assert!(enrollments.can_access_content(&teacher, course.id).await.unwrap());
    assert!(enrollments.can_access_content(&app.admin, course.id).await.unwrap());
    assert!(!enrollments.can_access_content(&stranger, course.id).await.unwrap());
    assert!(!enrollments
        .can_access_content(&Actor::Anonymous, course.id)
        .await
        .unwrap());

    // Renaming the course does not change who may read it
    app.services
        .catalog()
        .update_course(
            &teacher,
            course.id,
            UpdateCourse {
                title: Some("Renamed".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(enrollments.can_access_content(&teacher, course.id).await.unwrap());
}
