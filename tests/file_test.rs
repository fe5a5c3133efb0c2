//! Uploaded files: visibility, downloads and deletion.

mod common;

use tokio::io::AsyncReadExt;

use course_hub::domain::{Actor, NewMaterial, Visibility};
use course_hub::errors::ErrorKind;
use course_hub::infra::UnitOfWork;
use course_hub::services::{ServiceContainer, Upload};

use common::{setup, user_id};

fn pdf(name: &str, body: &[u8]) -> Upload {
    Upload {
        bytes: body.to_vec(),
        original_name: name.to_string(),
        content_type: Some("application/pdf".to_string()),
    }
}

#[tokio::test]
async fn test_private_file_visible_to_owner_and_admin_only() {
    let app = setup().await;
    let owner = app.student("olivia").await;
    let other = app.student("oscar").await;
    let files = app.services.files();

    let file = files
        .register_upload(&owner, pdf("notes.pdf", b"%PDF-1.4 notes"))
        .await
        .unwrap();
    assert_eq!(file.visibility, Visibility::Private);
    assert_eq!(file.owner_user_id, Some(user_id(&owner)));
    assert_eq!(file.size_bytes, 14);
    assert!(app.storage.contains(&file.path));

    assert!(files.get_file(&owner, file.id).await.is_ok());
    assert!(files.get_file(&app.admin, file.id).await.is_ok());

    let err = files.get_file(&other, file.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
    let Err(err) = files.download(&Actor::Anonymous, file.id).await else {
        panic!("anonymous download must fail");
    };
    assert_eq!(err.kind(), ErrorKind::Unauthenticated);

    assert!(files.list_visible_files(&other).await.unwrap().is_empty());
    assert_eq!(files.list_visible_files(&owner).await.unwrap().len(), 1);
    assert_eq!(files.list_visible_files(&app.admin).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_public_file_downloadable_by_any_user() {
    let app = setup().await;
    let owner = app.student("olivia").await;
    let other = app.student("oscar").await;
    let files = app.services.files();

    let file = files
        .register_upload(&owner, pdf("handout.pdf", b"shared handout"))
        .await
        .unwrap();

    let err = files
        .set_visibility(&other, file.id, Visibility::Public)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let updated = files
        .set_visibility(&owner, file.id, Visibility::Public)
        .await
        .unwrap();
    assert_eq!(updated.visibility, Visibility::Public);

    let (record, mut stream) = files.download(&other, file.id).await.unwrap();
    assert_eq!(record.original_name, "handout.pdf");
    let mut body = Vec::new();
    stream.read_to_end(&mut body).await.unwrap();
    assert_eq!(body, b"shared handout");

    assert_eq!(files.list_visible_files(&other).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_upload_rules() {
    let app = setup().await;
    let owner = app.student("olivia").await;
    let files = app.services.files();

    let err = files
        .register_upload(&owner, pdf("script.exe", b"MZ"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = files
        .register_upload(&owner, pdf("empty.pdf", b""))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = files
        .register_upload(&Actor::Anonymous, pdf("notes.pdf", b"data"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthenticated);

    // Extensions are matched case-insensitively
    assert!(files
        .register_upload(&owner, pdf("REPORT.PDF", b"data"))
        .await
        .is_ok());
    assert_eq!(app.storage.len(), 1);
}

#[tokio::test]
async fn test_delete_file_removes_bytes_and_clears_material_reference() {
    let app = setup().await;
    let teacher = app.teacher("tina").await;
    let (_, lessons) = app.course(&teacher, "files", 1).await;
    let files = app.services.files();

    let file = files
        .register_upload(&teacher, pdf("slides.pdf", b"slides"))
        .await
        .unwrap();
    let material = app
        .services
        .catalog()
        .attach_material(
            &teacher,
            lessons[0].id,
            NewMaterial {
                title: "Slides".to_string(),
                file_id: Some(file.id),
                url: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(material.file_id, Some(file.id));

    files.delete_file(&teacher, file.id).await.unwrap();

    assert!(!app.storage.contains(&file.path));
    let err = files.get_file(&teacher, file.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let material = app
        .uow
        .store()
        .materials()
        .find_by_id(material.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(material.file_id, None);
}

#[tokio::test]
async fn test_attaching_someone_elses_file_is_forbidden() {
    let app = setup().await;
    let teacher = app.teacher("tina").await;
    let student = app.student("sam").await;
    let (_, lessons) = app.course(&teacher, "borrowed", 1).await;

    let file = app
        .services
        .files()
        .register_upload(&student, pdf("essay.pdf", b"essay"))
        .await
        .unwrap();

    let err = app
        .services
        .catalog()
        .attach_material(
            &teacher,
            lessons[0].id,
            NewMaterial {
                title: "Essay".to_string(),
                file_id: Some(file.id),
                url: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
}
