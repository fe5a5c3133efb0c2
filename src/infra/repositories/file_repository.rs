use chrono::Utc;
use sea_orm::{
    sea_query::Condition, ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use super::entities::file::{self, ActiveModel, Entity as FileEntity};
use crate::domain::{FileRecord, NewFile, Visibility};
use crate::errors::{AppError, AppResult};

pub struct FileRepository<'c, C> {
    conn: &'c C,
}

impl<'c, C: ConnectionTrait> FileRepository<'c, C> {
    pub(crate) fn new(conn: &'c C) -> Self {
        Self { conn }
    }

    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<FileRecord>> {
        let result = FileEntity::find_by_id(id)
            .one(self.conn)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(FileRecord::from))
    }

    pub async fn create(&self, input: NewFile) -> AppResult<FileRecord> {
        let active_model = ActiveModel {
            id: Set(Uuid::new_v4()),
            owner_user_id: Set(input.owner_user_id),
            original_name: Set(input.original_name),
            path: Set(input.path),
            content_type: Set(input.content_type),
            size_bytes: Set(input.size_bytes),
            visibility: Set(input.visibility.as_str().to_string()),
            created_at: Set(Utc::now()),
        };

        let model = active_model
            .insert(self.conn)
            .await
            .map_err(|e| AppError::from_db_unique(e, "File"))?;

        Ok(FileRecord::from(model))
    }

    /// Files the user owns plus every non-private file, newest first
    pub async fn list_visible_to(&self, user_id: Uuid) -> AppResult<Vec<FileRecord>> {
        let models = FileEntity::find()
            .filter(
                Condition::any()
                    .add(file::Column::OwnerUserId.eq(user_id))
                    .add(file::Column::Visibility.ne(Visibility::Private.as_str())),
            )
            .order_by_desc(file::Column::CreatedAt)
            .all(self.conn)
            .await
            .map_err(AppError::from)?;

        Ok(models.into_iter().map(FileRecord::from).collect())
    }

    pub async fn list_owned_by(&self, user_id: Uuid) -> AppResult<Vec<FileRecord>> {
        let models = FileEntity::find()
            .filter(file::Column::OwnerUserId.eq(user_id))
            .all(self.conn)
            .await
            .map_err(AppError::from)?;

        Ok(models.into_iter().map(FileRecord::from).collect())
    }

    pub async fn list_all(&self) -> AppResult<Vec<FileRecord>> {
        let models = FileEntity::find()
            .order_by_desc(file::Column::CreatedAt)
            .all(self.conn)
            .await
            .map_err(AppError::from)?;

        Ok(models.into_iter().map(FileRecord::from).collect())
    }

    pub async fn set_visibility(&self, id: Uuid, visibility: Visibility) -> AppResult<FileRecord> {
        let model = FileEntity::find_by_id(id)
            .one(self.conn)
            .await?
            .ok_or(AppError::NotFound)?;

        let mut active: ActiveModel = model.into();
        active.visibility = Set(visibility.as_str().to_string());

        let model = active.update(self.conn).await.map_err(AppError::from)?;
        Ok(FileRecord::from(model))
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = FileEntity::delete_by_id(id)
            .exec(self.conn)
            .await
            .map_err(AppError::from)?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound);
        }

        Ok(())
    }
}
