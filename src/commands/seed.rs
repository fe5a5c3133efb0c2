//! Seed command - role vocabulary and initial admin account.

use validator::Validate;

use crate::cli::args::SeedArgs;
use crate::config::{Config, ROLE_ADMIN, ROLE_MANAGER, ROLE_STUDENT, ROLE_TEACHER, SEEDED_ROLES};
use crate::domain::{Password, RegisterUser, RoleName, User};
use crate::errors::{AppError, AppResult};
use crate::infra::{Database, Persistence, UnitOfWork};

/// What a seed run changed
#[derive(Debug, Clone)]
pub struct SeedOutcome {
    pub admin: User,
    pub admin_created: bool,
}

fn role_description(name: &str) -> Option<String> {
    let text = match name {
        ROLE_ADMIN => "Full administrative access",
        ROLE_TEACHER => "Creates and manages own courses",
        ROLE_STUDENT => "Enrolls in courses and tracks progress",
        ROLE_MANAGER => "Back-office staff",
        _ => return None,
    };
    Some(text.to_string())
}

/// Create every seeded role and make sure the admin account exists and holds
/// the `admin` role. Running it twice changes nothing.
pub async fn seed<U: UnitOfWork>(uow: &U, admin: RegisterUser) -> AppResult<SeedOutcome> {
    let admin = admin.normalized();
    admin.validate()?;
    let password_hash = Password::new(&admin.password)?.into_string();
    let RegisterUser { username, email, .. } = admin;

    uow.transaction(move |tx| {
        Box::pin(async move {
            for name in SEEDED_ROLES {
                let role = RoleName::parse(name)?;
                tx.roles().ensure(&role, role_description(name)).await?;
            }

            let (user, admin_created) = match tx.users().find_by_email(&email).await? {
                Some(user) => (user, false),
                None => (tx.users().create(email, username, password_hash).await?, true),
            };

            let admin_role = tx
                .roles()
                .find_by_name(&RoleName::admin())
                .await?
                .ok_or_else(|| AppError::internal("Admin role missing after seeding"))?;
            if !tx.roles().is_assigned(user.id, admin_role.id).await? {
                tx.roles().assign(user.id, admin_role.id).await?;
            }

            Ok(SeedOutcome {
                admin: user,
                admin_created,
            })
        })
    })
    .await
}

/// Execute the seed command
pub async fn execute(args: SeedArgs, config: Config) -> AppResult<()> {
    let db = Database::connect(&config)
        .await
        .map_err(|e| AppError::internal(format!("Database connection failed: {}", e)))?;
    let uow = Persistence::new(db.get_connection());

    let outcome = seed(
        &uow,
        RegisterUser {
            username: args.admin_username,
            email: args.admin_email,
            password: args.admin_password,
        },
    )
    .await?;

    if outcome.admin_created {
        tracing::info!(user_id = %outcome.admin.id, email = %outcome.admin.email, "Admin account created");
    } else {
        tracing::info!(email = %outcome.admin.email, "Admin account already present");
    }
    tracing::info!(roles = SEEDED_ROLES.len(), "Seeding completed");

    Ok(())
}
