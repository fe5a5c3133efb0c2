//! File service - uploads, visibility and downloads.
//!
//! Bytes go through [`FileStorage`]; the database only records metadata and
//! the opaque storage handle.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use super::access::enforce;
use crate::config::{Config, CONTENT_TYPE_OCTET_STREAM};
use crate::domain::file::file_extension;
use crate::domain::{Actor, FileRecord, NewFile, Visibility};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::{ByteStream, FileStorage, UnitOfWork};
use crate::policy;

/// An upload as received from the client
#[derive(Debug, Clone)]
pub struct Upload {
    pub bytes: Vec<u8>,
    pub original_name: String,
    pub content_type: Option<String>,
}

#[async_trait]
pub trait FileService: Send + Sync {
    /// Store an upload owned by the actor. New files are private.
    async fn register_upload(&self, actor: &Actor, upload: Upload) -> AppResult<FileRecord>;

    /// Files the actor owns plus every non-private file. Admins see all.
    async fn list_visible_files(&self, actor: &Actor) -> AppResult<Vec<FileRecord>>;

    async fn get_file(&self, actor: &Actor, file_id: Uuid) -> AppResult<FileRecord>;

    /// Metadata plus a stream over the stored bytes
    async fn download(&self, actor: &Actor, file_id: Uuid) -> AppResult<(FileRecord, ByteStream)>;

    async fn set_visibility(
        &self,
        actor: &Actor,
        file_id: Uuid,
        visibility: Visibility,
    ) -> AppResult<FileRecord>;

    /// Delete the row (references are cleared by the database) and the bytes
    async fn delete_file(&self, actor: &Actor, file_id: Uuid) -> AppResult<()>;
}

pub struct FileManager<U: UnitOfWork> {
    uow: Arc<U>,
    storage: Arc<dyn FileStorage>,
    config: Config,
}

impl<U: UnitOfWork> FileManager<U> {
    pub fn new(uow: Arc<U>, storage: Arc<dyn FileStorage>, config: Config) -> Self {
        Self {
            uow,
            storage,
            config,
        }
    }

    fn check_upload(&self, upload: &Upload) -> AppResult<()> {
        let extension = file_extension(&upload.original_name)
            .ok_or_else(|| AppError::validation("File name needs an extension"))?;
        if !self.config.is_allowed_extension(&extension) {
            return Err(AppError::validation(format!(
                "File type .{} is not allowed",
                extension
            )));
        }
        if upload.bytes.is_empty() {
            return Err(AppError::validation("File is empty"));
        }
        if upload.bytes.len() as u64 > self.config.max_upload_bytes {
            return Err(AppError::validation(format!(
                "File exceeds the {} byte limit",
                self.config.max_upload_bytes
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl<U: UnitOfWork> FileService for FileManager<U> {
    async fn register_upload(&self, actor: &Actor, upload: Upload) -> AppResult<FileRecord> {
        enforce(actor, policy::authenticated(actor), "files.upload")?;
        let owner_id = actor.user_id().ok_or(AppError::Unauthenticated)?;
        self.check_upload(&upload)?;

        let Upload {
            bytes,
            original_name,
            content_type,
        } = upload;
        let stored = self.storage.store(bytes, &original_name).await?;

        let new_file = NewFile {
            owner_user_id: Some(owner_id),
            original_name,
            path: stored.handle.clone(),
            content_type: content_type.unwrap_or_else(|| CONTENT_TYPE_OCTET_STREAM.to_string()),
            size_bytes: stored.size_bytes,
            visibility: Visibility::Private,
        };

        match self.uow.store().files().create(new_file).await {
            Ok(file) => {
                info!(
                    file_id = %file.id,
                    owner_id = %owner_id,
                    size_bytes = file.size_bytes,
                    "File uploaded"
                );
                Ok(file)
            }
            Err(e) => {
                if let Err(cleanup) = self.storage.remove(&stored.handle).await {
                    error!(handle = %stored.handle, error = %cleanup, "Failed to remove orphaned upload");
                }
                Err(e)
            }
        }
    }

    async fn list_visible_files(&self, actor: &Actor) -> AppResult<Vec<FileRecord>> {
        enforce(actor, policy::authenticated(actor), "files.list")?;
        let user_id = actor.user_id().ok_or(AppError::Unauthenticated)?;

        let files = self.uow.store().files();
        if policy::can_manage_users(actor).is_allowed() {
            return files.list_all().await;
        }
        files.list_visible_to(user_id).await
    }

    async fn get_file(&self, actor: &Actor, file_id: Uuid) -> AppResult<FileRecord> {
        let file = self.uow.store().files().find_by_id(file_id).await?.ok_or_not_found()?;
        enforce(actor, policy::can_download_file(actor, &file), "files.get")?;
        Ok(file)
    }

    async fn download(&self, actor: &Actor, file_id: Uuid) -> AppResult<(FileRecord, ByteStream)> {
        let file = self.get_file(actor, file_id).await?;
        let stream = self.storage.retrieve(&file.path).await?;

        info!(file_id = %file_id, user_id = ?actor.user_id(), "File downloaded");
        Ok((file, stream))
    }

    async fn set_visibility(
        &self,
        actor: &Actor,
        file_id: Uuid,
        visibility: Visibility,
    ) -> AppResult<FileRecord> {
        let files = self.uow.store().files();
        let file = files.find_by_id(file_id).await?.ok_or_not_found()?;
        enforce(actor, policy::can_manage_file(actor, &file), "files.set_visibility")?;

        let file = files.set_visibility(file_id, visibility).await?;
        info!(file_id = %file_id, visibility = %visibility.as_str(), "File visibility changed");
        Ok(file)
    }

    async fn delete_file(&self, actor: &Actor, file_id: Uuid) -> AppResult<()> {
        let files = self.uow.store().files();
        let file = files.find_by_id(file_id).await?.ok_or_not_found()?;
        enforce(actor, policy::can_manage_file(actor, &file), "files.delete")?;

        files.delete(file_id).await?;
        if let Err(e) = self.storage.remove(&file.path).await {
            error!(file_id = %file_id, handle = %file.path, error = %e, "Failed to remove stored bytes");
        }

        info!(file_id = %file_id, "File deleted");
        Ok(())
    }
}
