//! Roles and user-role assignments.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use super::entities::role::{self, ActiveModel, Entity as RoleEntity};
use super::entities::user_role::{self, Entity as UserRoleEntity};
use crate::domain::{Role, RoleName, RoleSet};
use crate::errors::{AppError, AppResult};

pub struct RoleRepository<'c, C> {
    conn: &'c C,
}

impl<'c, C: ConnectionTrait> RoleRepository<'c, C> {
    pub(crate) fn new(conn: &'c C) -> Self {
        Self { conn }
    }

    pub async fn find_by_name(&self, name: &RoleName) -> AppResult<Option<Role>> {
        let result = RoleEntity::find()
            .filter(role::Column::Name.eq(name.as_str()))
            .one(self.conn)
            .await
            .map_err(AppError::from)?;

        result.map(Role::try_from).transpose()
    }

    pub async fn list(&self) -> AppResult<Vec<Role>> {
        let models = RoleEntity::find()
            .order_by_asc(role::Column::Name)
            .all(self.conn)
            .await
            .map_err(AppError::from)?;

        models.into_iter().map(Role::try_from).collect()
    }

    pub async fn create(&self, name: &RoleName, description: Option<String>) -> AppResult<Role> {
        let active_model = ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.as_str().to_string()),
            description: Set(description),
        };

        let model = active_model
            .insert(self.conn)
            .await
            .map_err(|e| AppError::from_db_unique(e, "Role"))?;

        Role::try_from(model)
    }

    /// Return the named role, creating it when missing.
    pub async fn ensure(&self, name: &RoleName, description: Option<String>) -> AppResult<Role> {
        match self.find_by_name(name).await? {
            Some(role) => Ok(role),
            None => self.create(name, description).await,
        }
    }

    /// Role names currently assigned to a user
    pub async fn roles_of(&self, user_id: Uuid) -> AppResult<RoleSet> {
        let models = RoleEntity::find()
            .inner_join(UserRoleEntity)
            .filter(user_role::Column::UserId.eq(user_id))
            .all(self.conn)
            .await
            .map_err(AppError::from)?;

        Ok(RoleSet::from_names(models.iter().map(|m| m.name.as_str())))
    }

    pub async fn is_assigned(&self, user_id: Uuid, role_id: Uuid) -> AppResult<bool> {
        let found = UserRoleEntity::find_by_id((user_id, role_id))
            .one(self.conn)
            .await
            .map_err(AppError::from)?;

        Ok(found.is_some())
    }

    /// Assign a role. Assigning twice is a conflict.
    pub async fn assign(&self, user_id: Uuid, role_id: Uuid) -> AppResult<()> {
        let active_model = user_role::ActiveModel {
            user_id: Set(user_id),
            role_id: Set(role_id),
            created_at: Set(Utc::now()),
        };

        UserRoleEntity::insert(active_model)
            .exec_without_returning(self.conn)
            .await
            .map_err(|e| AppError::from_db_unique(e, "Role assignment"))?;

        Ok(())
    }

    /// Remove an assignment. Returns false when it did not exist.
    pub async fn revoke(&self, user_id: Uuid, role_id: Uuid) -> AppResult<bool> {
        let result = UserRoleEntity::delete_by_id((user_id, role_id))
            .exec(self.conn)
            .await
            .map_err(AppError::from)?;

        Ok(result.rows_affected > 0)
    }
}
