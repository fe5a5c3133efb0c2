//! Shared types used across services.

mod pagination;

pub use pagination::{Paginated, PaginationMeta, PaginationParams};
