//! CLI argument definitions.
//!
//! Uses clap derive macros for type-safe argument parsing.

use clap::{Parser, Subcommand};

use crate::config::{DEFAULT_ADMIN_EMAIL, DEFAULT_ADMIN_USERNAME};

/// Course Hub - course catalog, enrollment and progress core
#[derive(Parser, Debug)]
#[command(name = "course-hub")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run database migrations
    Migrate(MigrateArgs),

    /// Create the role vocabulary and an initial admin account
    Seed(SeedArgs),

    /// Inspect and assign roles
    Roles(RolesArgs),
}

/// Arguments for the migrate command
#[derive(Parser, Debug)]
pub struct MigrateArgs {
    #[command(subcommand)]
    pub action: MigrateAction,
}

/// Migration actions
#[derive(Subcommand, Debug)]
pub enum MigrateAction {
    /// Run pending migrations
    Up,
    /// Rollback last migration
    Down,
    /// Show migration status
    Status,
    /// Reset and re-run all migrations
    Fresh,
}

/// Arguments for the seed command
#[derive(Parser, Debug)]
pub struct SeedArgs {
    /// Email of the initial admin
    #[arg(long, default_value = DEFAULT_ADMIN_EMAIL, env = "ADMIN_EMAIL")]
    pub admin_email: String,

    /// Username of the initial admin
    #[arg(long, default_value = DEFAULT_ADMIN_USERNAME, env = "ADMIN_USERNAME")]
    pub admin_username: String,

    /// Password of the initial admin
    #[arg(long, env = "ADMIN_PASSWORD", hide_env_values = true)]
    pub admin_password: String,
}

/// Arguments for the roles command
#[derive(Parser, Debug)]
pub struct RolesArgs {
    #[command(subcommand)]
    pub action: RolesAction,
}

/// Role management actions
#[derive(Subcommand, Debug)]
pub enum RolesAction {
    /// List defined roles
    List,
    /// Grant a role to a user
    Grant {
        /// User email
        email: String,
        /// Role name (e.g., "teacher")
        role: String,
    },
    /// Revoke a role from a user
    Revoke {
        /// User email
        email: String,
        /// Role name
        role: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roles_grant() {
        let cli = Cli::try_parse_from(["course-hub", "roles", "grant", "ann@example.com", "teacher"])
            .unwrap();
        match cli.command {
            Commands::Roles(RolesArgs {
                action: RolesAction::Grant { email, role },
            }) => {
                assert_eq!(email, "ann@example.com");
                assert_eq!(role, "teacher");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_verbose_migrate() {
        let cli = Cli::try_parse_from(["course-hub", "-v", "migrate", "status"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(
            cli.command,
            Commands::Migrate(MigrateArgs {
                action: MigrateAction::Status
            })
        ));
    }

    #[test]
    fn test_seed_uses_default_admin_identity() {
        let cli = Cli::try_parse_from(["course-hub", "seed", "--admin-password", "secret1"]).unwrap();
        match cli.command {
            Commands::Seed(args) => {
                assert_eq!(args.admin_email, DEFAULT_ADMIN_EMAIL);
                assert_eq!(args.admin_password, "secret1");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
