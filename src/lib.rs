//! Course Hub - access control and progress tracking for a course catalog.
//!
//! The crate is the core of a learning platform: users and roles, courses
//! with ordered lessons, enrollments, per-lesson progress, uploaded files and
//! generated certificates/exports. Transport (HTTP, sessions, templates) is
//! left to the embedding application.
//!
//! # Architecture Layers
//!
//! - **config**: Environment settings and controlled vocabularies
//! - **domain**: Entities, value objects and pure rules
//! - **policy**: Role and ownership checks
//! - **services**: Use cases, one trait per area
//! - **infra**: Database, migrations, repositories, file storage, rendering
//! - **cli** / **commands**: `course-hub` binary
//! - **types**: Pagination
//! - **errors**: Centralized error handling
//!
//! # CLI Usage
//!
//! ```bash
//! course-hub migrate up
//! ADMIN_PASSWORD=changeme course-hub seed
//! course-hub roles grant teacher@example.com teacher
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod domain;
pub mod errors;
pub mod infra;
pub mod policy;
pub mod services;
pub mod types;

// Re-export commonly used types at crate root
pub use config::Config;
pub use domain::{Actor, Principal};
pub use errors::{AppError, AppResult, ErrorKind};
pub use services::{ServiceContainer, Services};
