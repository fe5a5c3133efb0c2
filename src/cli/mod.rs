//! CLI module - Command-line interface for the application.
//!
//! Provides commands for:
//! - `migrate` - Database migrations
//! - `seed` - Role vocabulary and initial admin
//! - `roles` - Role inspection and assignment

pub mod args;

pub use args::{Cli, Commands};
