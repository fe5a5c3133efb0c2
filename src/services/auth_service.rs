//! Authentication service - registration, login and actor resolution.
//!
//! Credential transport (sessions, cookies, tokens) lives outside the core;
//! callers hand in an email and password and get back a [`Principal`].

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use super::access::enforce;
use crate::domain::password::DUMMY_HASH;
use crate::domain::{Actor, Password, Principal, RegisterUser, RoleName, UserWithRoles};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::UnitOfWork;
use crate::policy;

/// Authentication service trait for dependency injection.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Register a new account with the `student` role
    async fn register(&self, input: RegisterUser) -> AppResult<UserWithRoles>;

    /// Check credentials and return the principal with its roles
    async fn authenticate(&self, email: &str, password: &str) -> AppResult<Principal>;

    /// Rebuild the actor for a session that only remembers a user id.
    /// Missing or deactivated users resolve to [`Actor::Anonymous`].
    async fn resolve_actor(&self, user_id: Option<Uuid>) -> AppResult<Actor>;

    /// Change the caller's own password
    async fn change_password(&self, actor: &Actor, current: &str, new: &str) -> AppResult<()>;
}

/// Concrete implementation of AuthService using Unit of Work.
pub struct Authenticator<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> Authenticator<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }
}

#[async_trait]
impl<U: UnitOfWork> AuthService for Authenticator<U> {
    async fn register(&self, input: RegisterUser) -> AppResult<UserWithRoles> {
        let input = input.normalized();
        input.validate()?;

        let password_hash = Password::new(&input.password)?.into_string();
        let RegisterUser { username, email, .. } = input;

        let registered = self
            .uow
            .transaction(move |tx| {
                Box::pin(async move {
                    if tx.users().find_by_email(&email).await?.is_some() {
                        return Err(AppError::conflict("User with this email"));
                    }
                    if tx.users().find_by_username(&username).await?.is_some() {
                        return Err(AppError::conflict("User with this username"));
                    }

                    let user = tx.users().create(email, username, password_hash).await?;
                    let student = tx.roles().ensure(&RoleName::student(), None).await?;
                    tx.roles().assign(user.id, student.id).await?;
                    let roles = tx.roles().roles_of(user.id).await?;

                    Ok(UserWithRoles { user, roles })
                })
            })
            .await?;

        info!(
            user_id = %registered.user.id,
            username = %registered.user.username,
            "User registered"
        );
        Ok(registered)
    }

    async fn authenticate(&self, email: &str, password: &str) -> AppResult<Principal> {
        let email = email.trim().to_ascii_lowercase();
        let store = self.uow.store();
        let user = store.users().find_by_email(&email).await?;

        // Verify against a dummy hash when the email is unknown so both
        // failure paths take comparable time.
        let stored_hash = user
            .as_ref()
            .map(|u| u.password_hash.clone())
            .unwrap_or_else(|| DUMMY_HASH.to_string());
        let password_valid = Password::from_hash(stored_hash).verify(password);

        let user = match user {
            Some(user) if password_valid => user,
            _ => {
                warn!("Failed login attempt");
                return Err(AppError::InvalidCredentials);
            }
        };

        if !user.is_active {
            warn!(user_id = %user.id, "Login refused for inactive account");
            return Err(AppError::Forbidden);
        }

        let roles = store.roles().roles_of(user.id).await?;
        Ok(Principal {
            user_id: user.id,
            username: user.username,
            email: user.email,
            roles,
        })
    }

    async fn resolve_actor(&self, user_id: Option<Uuid>) -> AppResult<Actor> {
        let Some(user_id) = user_id else {
            return Ok(Actor::Anonymous);
        };

        let store = self.uow.store();
        let user = match store.users().find_by_id(user_id).await? {
            Some(user) if user.is_active => user,
            _ => return Ok(Actor::Anonymous),
        };
        let roles = store.roles().roles_of(user.id).await?;

        Ok(Actor::Authenticated(Principal {
            user_id: user.id,
            username: user.username,
            email: user.email,
            roles,
        }))
    }

    async fn change_password(&self, actor: &Actor, current: &str, new: &str) -> AppResult<()> {
        enforce(actor, policy::authenticated(actor), "auth.change_password")?;
        let user_id = actor.user_id().ok_or(AppError::Unauthenticated)?;

        let store = self.uow.store();
        let user = store.users().find_by_id(user_id).await?.ok_or_not_found()?;
        if !Password::from_hash(user.password_hash).verify(current) {
            return Err(AppError::InvalidCredentials);
        }

        let password_hash = Password::new(new)?.into_string();
        store.users().set_password_hash(user_id, password_hash).await?;

        info!(user_id = %user_id, "Password changed");
        Ok(())
    }
}
