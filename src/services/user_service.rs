//! User service - account administration, role assignment and profiles.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;
use validator::Validate;

use super::access::enforce;
use crate::domain::{Actor, Profile, Role, RoleName, RoleSet, UpdateProfile, User, UserWithRoles};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::{FileStorage, TransactionContext, UnitOfWork};
use crate::policy;
use crate::types::{Paginated, PaginationParams};

/// User service trait for dependency injection.
///
/// Administration requires the `admin` role; reads of a single account and
/// profile edits are also open to the account holder.
#[async_trait]
pub trait UserService: Send + Sync {
    async fn get_user(&self, actor: &Actor, id: Uuid) -> AppResult<UserWithRoles>;

    async fn list_users(&self, actor: &Actor, params: PaginationParams) -> AppResult<Paginated<User>>;

    async fn list_roles(&self, actor: &Actor) -> AppResult<Vec<Role>>;

    async fn set_active(&self, actor: &Actor, id: Uuid, is_active: bool) -> AppResult<User>;

    /// Grant a role. Unknown role names are a validation error.
    async fn assign_role(&self, actor: &Actor, user_id: Uuid, role: &str) -> AppResult<RoleSet>;

    /// Remove a role. `NotFound` when the user does not hold it.
    async fn revoke_role(&self, actor: &Actor, user_id: Uuid, role: &str) -> AppResult<RoleSet>;

    async fn roles_of(&self, actor: &Actor, user_id: Uuid) -> AppResult<RoleSet>;

    /// Delete the account; owned rows follow the foreign-key cascade and the
    /// bytes of owned files are removed from storage.
    async fn delete_user(&self, actor: &Actor, id: Uuid) -> AppResult<()>;

    async fn get_profile(&self, actor: &Actor, user_id: Uuid) -> AppResult<Option<Profile>>;

    async fn update_profile(
        &self,
        actor: &Actor,
        user_id: Uuid,
        changes: UpdateProfile,
    ) -> AppResult<Profile>;
}

/// Concrete implementation of UserService using Unit of Work.
pub struct UserManager<U: UnitOfWork> {
    uow: Arc<U>,
    storage: Arc<dyn FileStorage>,
}

impl<U: UnitOfWork> UserManager<U> {
    pub fn new(uow: Arc<U>, storage: Arc<dyn FileStorage>) -> Self {
        Self { uow, storage }
    }
}

/// Grant a role inside an open transaction. Unknown roles are a validation
/// error, duplicates a conflict.
pub(crate) async fn grant_role_in(
    tx: TransactionContext<'_>,
    user_id: Uuid,
    name: RoleName,
) -> AppResult<RoleSet> {
    tx.users().find_by_id(user_id).await?.ok_or_not_found()?;
    let role = tx
        .roles()
        .find_by_name(&name)
        .await?
        .ok_or_else(|| AppError::validation(format!("Unknown role: {}", name)))?;

    if tx.roles().is_assigned(user_id, role.id).await? {
        return Err(AppError::conflict("Role assignment"));
    }
    tx.roles().assign(user_id, role.id).await?;
    tx.roles().roles_of(user_id).await
}

/// Revoke a role inside an open transaction. `NotFound` when not held.
pub(crate) async fn revoke_role_in(
    tx: TransactionContext<'_>,
    user_id: Uuid,
    name: RoleName,
) -> AppResult<RoleSet> {
    let role = tx.roles().find_by_name(&name).await?.ok_or_not_found()?;
    if !tx.roles().revoke(user_id, role.id).await? {
        return Err(AppError::NotFound);
    }
    tx.roles().roles_of(user_id).await
}

#[async_trait]
impl<U: UnitOfWork> UserService for UserManager<U> {
    async fn get_user(&self, actor: &Actor, id: Uuid) -> AppResult<UserWithRoles> {
        enforce(actor, policy::can_act_for_user(actor, id), "users.get")?;

        let store = self.uow.store();
        let user = store.users().find_by_id(id).await?.ok_or_not_found()?;
        let roles = store.roles().roles_of(id).await?;
        Ok(UserWithRoles { user, roles })
    }

    async fn list_users(&self, actor: &Actor, params: PaginationParams) -> AppResult<Paginated<User>> {
        enforce(actor, policy::can_manage_users(actor), "users.list")?;

        let (users, total) = self.uow.store().users().list(&params).await?;
        Ok(Paginated::new(users, &params, total))
    }

    async fn list_roles(&self, actor: &Actor) -> AppResult<Vec<Role>> {
        enforce(actor, policy::can_manage_users(actor), "roles.list")?;
        self.uow.store().roles().list().await
    }

    async fn set_active(&self, actor: &Actor, id: Uuid, is_active: bool) -> AppResult<User> {
        enforce(actor, policy::can_manage_users(actor), "users.set_active")?;

        let user = self.uow.store().users().set_active(id, is_active).await?;
        info!(user_id = %id, is_active, "User activation changed");
        Ok(user)
    }

    async fn assign_role(&self, actor: &Actor, user_id: Uuid, role: &str) -> AppResult<RoleSet> {
        enforce(actor, policy::can_manage_users(actor), "roles.assign")?;
        let name = RoleName::parse(role)?;

        let roles = self
            .uow
            .transaction(move |tx| Box::pin(grant_role_in(tx, user_id, name)))
            .await?;

        info!(user_id = %user_id, role = %role, "Role granted");
        Ok(roles)
    }

    async fn revoke_role(&self, actor: &Actor, user_id: Uuid, role: &str) -> AppResult<RoleSet> {
        enforce(actor, policy::can_manage_users(actor), "roles.revoke")?;
        let name = RoleName::parse(role)?;

        let roles = self
            .uow
            .transaction(move |tx| Box::pin(revoke_role_in(tx, user_id, name)))
            .await?;

        info!(user_id = %user_id, role = %role, "Role revoked");
        Ok(roles)
    }

    async fn roles_of(&self, actor: &Actor, user_id: Uuid) -> AppResult<RoleSet> {
        enforce(actor, policy::can_act_for_user(actor, user_id), "roles.of")?;
        self.uow.store().roles().roles_of(user_id).await
    }

    async fn delete_user(&self, actor: &Actor, id: Uuid) -> AppResult<()> {
        enforce(actor, policy::can_manage_users(actor), "users.delete")?;

        let handles = self
            .uow
            .transaction(move |tx| {
                Box::pin(async move {
                    let files = tx.files().list_owned_by(id).await?;
                    tx.users().delete(id).await?;
                    Ok(files.into_iter().map(|f| f.path).collect::<Vec<_>>())
                })
            })
            .await?;

        for handle in &handles {
            if let Err(e) = self.storage.remove(handle).await {
                error!(user_id = %id, handle = %handle, error = %e, "Failed to remove stored file");
            }
        }

        info!(user_id = %id, removed_files = handles.len(), "User deleted");
        Ok(())
    }

    async fn get_profile(&self, actor: &Actor, user_id: Uuid) -> AppResult<Option<Profile>> {
        enforce(actor, policy::can_act_for_user(actor, user_id), "profiles.get")?;
        self.uow.store().profiles().find(user_id).await
    }

    async fn update_profile(
        &self,
        actor: &Actor,
        user_id: Uuid,
        changes: UpdateProfile,
    ) -> AppResult<Profile> {
        enforce(actor, policy::can_act_for_user(actor, user_id), "profiles.update")?;
        changes.validate()?;

        let store = self.uow.store();
        store.users().find_by_id(user_id).await?.ok_or_not_found()?;

        if let Some(Some(file_id)) = changes.avatar_file_id {
            let file = store.files().find_by_id(file_id).await?.ok_or_not_found()?;
            if !file.is_owned_by(user_id) {
                return Err(AppError::validation("Avatar must be a file owned by the user"));
            }
        }

        let profile = store.profiles().upsert(user_id, changes).await?;
        info!(user_id = %user_id, "Profile updated");
        Ok(profile)
    }
}
