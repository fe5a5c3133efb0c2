//! Registration, login, role assignment and account administration.

mod common;

use course_hub::commands::{roles, seed};
use course_hub::config::SEEDED_ROLES;
use course_hub::domain::{Actor, RegisterUser, UpdateProfile};
use course_hub::errors::{AppError, ErrorKind};
use course_hub::infra::UnitOfWork;
use course_hub::services::{ServiceContainer, Upload};
use course_hub::types::PaginationParams;

use common::{setup, user_id, ADMIN_EMAIL, PASSWORD};

fn registration(username: &str, email: &str) -> RegisterUser {
    RegisterUser {
        username: username.to_string(),
        email: email.to_string(),
        password: PASSWORD.to_string(),
    }
}

#[tokio::test]
async fn test_register_assigns_student_role_and_rejects_duplicates() {
    let app = setup().await;
    let auth = app.services.auth();

    let registered = auth
        .register(registration("  alice ", "Alice@Example.com"))
        .await
        .unwrap();
    assert_eq!(registered.user.username, "alice");
    assert_eq!(registered.user.email, "alice@example.com");
    assert!(registered.roles.contains("student"));
    assert_eq!(registered.roles.len(), 1);

    let err = auth
        .register(registration("alice2", "ALICE@example.com"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let err = auth
        .register(registration("alice", "other@example.com"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let err = auth
        .register(RegisterUser {
            password: "short".to_string(),
            ..registration("bob", "bob@example.com")
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn test_authenticate() {
    let app = setup().await;
    let auth = app.services.auth();
    let student = app.student("sam").await;

    let principal = auth.authenticate("SAM@example.com", PASSWORD).await.unwrap();
    assert_eq!(principal.user_id, user_id(&student));
    assert!(principal.has_role("student"));

    let err = auth.authenticate("sam@example.com", "wrong-password").await.unwrap_err();
    assert!(matches!(err, AppError::InvalidCredentials));
    let err = auth.authenticate("nobody@example.com", PASSWORD).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidCredentials));

    app.services
        .users()
        .set_active(&app.admin, user_id(&student), false)
        .await
        .unwrap();
    let err = auth.authenticate("sam@example.com", PASSWORD).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
    assert_eq!(
        auth.resolve_actor(Some(user_id(&student))).await.unwrap(),
        Actor::Anonymous
    );
}

#[tokio::test]
async fn test_change_password() {
    let app = setup().await;
    let auth = app.services.auth();
    let student = app.student("sam").await;

    let err = auth
        .change_password(&student, "not-my-password", "new-password")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidCredentials));

    auth.change_password(&student, PASSWORD, "new-password")
        .await
        .unwrap();
    assert!(auth.authenticate("sam@example.com", "new-password").await.is_ok());
    assert!(auth.authenticate("sam@example.com", PASSWORD).await.is_err());

    let err = auth
        .change_password(&Actor::Anonymous, PASSWORD, "new-password")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthenticated);
}

#[tokio::test]
async fn test_role_assignment_is_admin_only() {
    let app = setup().await;
    let student = app.student("sam").await;
    let teacher = app.teacher("tina").await;
    let users = app.services.users();
    let sam = user_id(&student);

    let err = users.assign_role(&teacher, sam, "teacher").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let roles = users.assign_role(&app.admin, sam, "teacher").await.unwrap();
    assert!(roles.contains("teacher"));
    assert!(roles.contains("student"));

    let err = users.assign_role(&app.admin, sam, "teacher").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let err = users.assign_role(&app.admin, sam, "wizard").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let roles = users.revoke_role(&app.admin, sam, "teacher").await.unwrap();
    assert!(!roles.contains("teacher"));

    let err = users.revoke_role(&app.admin, sam, "teacher").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    // Admin holds no implicit teacher role
    let admin_roles = users
        .roles_of(&app.admin, user_id(&app.admin))
        .await
        .unwrap();
    assert!(admin_roles.contains("admin"));
    assert!(!admin_roles.contains("teacher"));
}

#[tokio::test]
async fn test_user_administration() {
    let app = setup().await;
    let student = app.student("sam").await;
    let users = app.services.users();

    let err = users
        .list_users(&student, PaginationParams::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let page = users
        .list_users(&app.admin, PaginationParams::default())
        .await
        .unwrap();
    assert_eq!(page.meta.total, 2);

    let roles = users.list_roles(&app.admin).await.unwrap();
    assert_eq!(roles.len(), SEEDED_ROLES.len());

    // Users see themselves, not each other
    let other = app.student("olga").await;
    assert!(users.get_user(&student, user_id(&student)).await.is_ok());
    let err = users.get_user(&student, user_id(&other)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
}

#[tokio::test]
async fn test_profile_and_avatar_ownership() {
    let app = setup().await;
    let student = app.student("sam").await;
    let other = app.student("olga").await;
    let users = app.services.users();
    let sam = user_id(&student);

    assert!(users.get_profile(&student, sam).await.unwrap().is_none());

    let theirs = app
        .services
        .files()
        .register_upload(
            &other,
            Upload {
                bytes: b"avatar".to_vec(),
                original_name: "avatar.pdf".to_string(),
                content_type: None,
            },
        )
        .await
        .unwrap();
    let err = users
        .update_profile(
            &student,
            sam,
            UpdateProfile {
                avatar_file_id: Some(Some(theirs.id)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let profile = users
        .update_profile(
            &student,
            sam,
            UpdateProfile {
                full_name: Some("Sam Student".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(profile.full_name.as_deref(), Some("Sam Student"));

    let err = users
        .update_profile(&other, sam, UpdateProfile::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
}

#[tokio::test]
async fn test_delete_user_removes_owned_files() {
    let app = setup().await;
    let student = app.student("sam").await;
    let sam = user_id(&student);

    let file = app
        .services
        .files()
        .register_upload(
            &student,
            Upload {
                bytes: b"homework".to_vec(),
                original_name: "homework.docx".to_string(),
                content_type: None,
            },
        )
        .await
        .unwrap();

    let err = app.services.users().delete_user(&student, sam).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    app.services.users().delete_user(&app.admin, sam).await.unwrap();

    assert!(!app.storage.contains(&file.path));
    let store = app.uow.store();
    assert!(store.users().find_by_id(sam).await.unwrap().is_none());
    assert!(store.files().find_by_id(file.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_author_cascades_to_courses_and_student_progress() {
    let app = setup().await;
    let teacher = app.teacher("tina").await;
    let student = app.student("sam").await;
    let (course, lessons) = app.course(&teacher, "orphaned", 2).await;
    app.services.enrollments().enroll(&student, course.id).await.unwrap();
    app.services
        .progress()
        .mark_lesson_completed(&student, lessons[0].id, None)
        .await
        .unwrap();

    app.services
        .users()
        .delete_user(&app.admin, user_id(&teacher))
        .await
        .unwrap();

    let err = app
        .services
        .catalog()
        .get_course(&app.admin, course.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let store = app.uow.store();
    for lesson in &lessons {
        assert!(store.lessons().find_by_id(lesson.id).await.unwrap().is_none());
        assert!(store
            .progress()
            .find(user_id(&student), lesson.id)
            .await
            .unwrap()
            .is_none());
    }
    let mine = app.services.enrollments().list_my_enrollments(&student).await.unwrap();
    assert!(mine.is_empty());
}

#[tokio::test]
async fn test_seed_is_idempotent() {
    let app = setup().await;

    let again = seed::seed(&app.uow, registration("admin", ADMIN_EMAIL))
        .await
        .unwrap();
    assert!(!again.admin_created);
    assert_eq!(again.admin.id, user_id(&app.admin));

    let store = app.uow.store();
    assert_eq!(store.roles().list().await.unwrap().len(), SEEDED_ROLES.len());
    assert_eq!(store.users().count().await.unwrap(), 1);
    let admin_roles = store.roles().roles_of(again.admin.id).await.unwrap();
    assert_eq!(admin_roles.len(), 1);
    assert!(admin_roles.contains("admin"));
}

#[tokio::test]
async fn test_roles_command_grant_and_revoke() {
    let app = setup().await;
    app.student("sam").await;

    let granted = roles::grant(&app.uow, " SAM@example.com ", "manager").await.unwrap();
    assert!(granted.contains("manager"));

    let err = roles::grant(&app.uow, "nobody@example.com", "manager").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let revoked = roles::revoke(&app.uow, "sam@example.com", "manager").await.unwrap();
    assert!(!revoked.contains("manager"));
    assert!(revoked.contains("student"));
}
