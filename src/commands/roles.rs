//! Roles command - role inspection and assignment from the shell.
//!
//! The shell operator is trusted, so these bypass the service-level policy
//! but keep the same validation and conflict rules.

use crate::cli::args::{RolesAction, RolesArgs};
use crate::config::Config;
use crate::domain::{RoleName, RoleSet};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::{Database, Persistence, UnitOfWork};
use crate::services::{grant_role_in, revoke_role_in};

/// Grant `role` to the user with `email` and return their roles.
pub async fn grant<U: UnitOfWork>(uow: &U, email: &str, role: &str) -> AppResult<RoleSet> {
    let name = RoleName::parse(role)?;
    let email = email.trim().to_ascii_lowercase();

    uow.transaction(move |tx| {
        Box::pin(async move {
            let user = tx.users().find_by_email(&email).await?.ok_or_not_found()?;
            grant_role_in(tx, user.id, name).await
        })
    })
    .await
}

/// Revoke `role` from the user with `email` and return their roles.
pub async fn revoke<U: UnitOfWork>(uow: &U, email: &str, role: &str) -> AppResult<RoleSet> {
    let name = RoleName::parse(role)?;
    let email = email.trim().to_ascii_lowercase();

    uow.transaction(move |tx| {
        Box::pin(async move {
            let user = tx.users().find_by_email(&email).await?.ok_or_not_found()?;
            revoke_role_in(tx, user.id, name).await
        })
    })
    .await
}

fn format_roles(roles: &RoleSet) -> String {
    roles
        .iter()
        .map(|r| r.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Execute the roles command
pub async fn execute(args: RolesArgs, config: Config) -> AppResult<()> {
    let db = Database::connect(&config)
        .await
        .map_err(|e| AppError::internal(format!("Database connection failed: {}", e)))?;
    let uow = Persistence::new(db.get_connection());

    match args.action {
        RolesAction::List => {
            for role in uow.store().roles().list().await? {
                println!(
                    "{}: {}",
                    role.name,
                    role.description.as_deref().unwrap_or("-")
                );
            }
        }
        RolesAction::Grant { email, role } => {
            let roles = grant(&uow, &email, &role).await?;
            tracing::info!(email = %email, role = %role, "Role granted");
            println!("{}: {}", email, format_roles(&roles));
        }
        RolesAction::Revoke { email, role } => {
            let roles = revoke(&uow, &email, &role).await?;
            tracing::info!(email = %email, role = %role, "Role revoked");
            println!("{}: {}", email, format_roles(&roles));
        }
    }

    Ok(())
}
