//! Commands module - CLI command implementations.

pub mod migrate;
pub mod roles;
pub mod seed;
