//! User repository.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use super::entities::user::{self, ActiveModel, Entity as UserEntity};
use crate::domain::User;
use crate::errors::{AppError, AppResult};
use crate::types::PaginationParams;

/// User data access over any connection or transaction
pub struct UserRepository<'c, C> {
    conn: &'c C,
}

impl<'c, C: ConnectionTrait> UserRepository<'c, C> {
    pub(crate) fn new(conn: &'c C) -> Self {
        Self { conn }
    }

    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let result = UserEntity::find_by_id(id)
            .one(self.conn)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(User::from))
    }

    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let result = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(self.conn)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(User::from))
    }

    pub async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let result = UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .one(self.conn)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(User::from))
    }

    /// Insert a new active user. Duplicate email or username is a conflict.
    pub async fn create(
        &self,
        email: String,
        username: String,
        password_hash: String,
    ) -> AppResult<User> {
        let now = Utc::now();
        let active_model = ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(email),
            username: Set(username),
            password_hash: Set(password_hash),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = active_model
            .insert(self.conn)
            .await
            .map_err(|e| AppError::from_db_unique(e, "User"))?;

        Ok(User::from(model))
    }

    pub async fn set_active(&self, id: Uuid, is_active: bool) -> AppResult<User> {
        let user = UserEntity::find_by_id(id)
            .one(self.conn)
            .await?
            .ok_or(AppError::NotFound)?;

        let mut active: ActiveModel = user.into();
        active.is_active = Set(is_active);
        active.updated_at = Set(Utc::now());

        let model = active.update(self.conn).await.map_err(AppError::from)?;
        Ok(User::from(model))
    }

    pub async fn set_password_hash(&self, id: Uuid, password_hash: String) -> AppResult<()> {
        let user = UserEntity::find_by_id(id)
            .one(self.conn)
            .await?
            .ok_or(AppError::NotFound)?;

        let mut active: ActiveModel = user.into();
        active.password_hash = Set(password_hash);
        active.updated_at = Set(Utc::now());

        active.update(self.conn).await.map_err(AppError::from)?;
        Ok(())
    }

    /// Permanently delete a user. Dependent rows go with it through the
    /// schema's cascade rules.
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = UserEntity::delete_by_id(id)
            .exec(self.conn)
            .await
            .map_err(AppError::from)?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound);
        }

        Ok(())
    }

    /// Users ordered by username
    pub async fn list(&self, params: &PaginationParams) -> AppResult<(Vec<User>, u64)> {
        let paginator = UserEntity::find()
            .order_by_asc(user::Column::Username)
            .paginate(self.conn, params.limit());
        let total = paginator.num_items().await?;
        let models = paginator.fetch_page(params.page_index()).await?;

        Ok((models.into_iter().map(User::from).collect(), total))
    }

    pub async fn count(&self) -> AppResult<u64> {
        UserEntity::find()
            .count(self.conn)
            .await
            .map_err(AppError::from)
    }
}
