//! SeaORM entity definitions
//!
//! These are database-specific entities separate from domain models.
//! Status, level and visibility columns are stored as strings and parsed
//! into domain enums on the way out.

pub mod course;
pub mod enrollment;
pub mod file;
pub mod lesson;
pub mod material;
pub mod profile;
pub mod progress;
pub mod report;
pub mod role;
pub mod user;
pub mod user_role;
