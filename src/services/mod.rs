//! Application services layer - use cases and business logic.
//!
//! Operations take the calling [`Actor`](crate::domain::Actor) explicitly
//! and start with a policy check before touching state. Services
//! are generic over [`UnitOfWork`](crate::infra::UnitOfWork) and exposed
//! through traits for dependency inversion.

mod access;
mod auth_service;
mod catalog_service;
pub mod container;
mod enrollment_service;
mod file_service;
mod progress_service;
mod report_service;
mod user_service;

// Service Container
pub use container::{ServiceContainer, Services};

// Service traits and implementations
pub use auth_service::{AuthService, Authenticator};
pub use catalog_service::{CatalogManager, CatalogService};
pub use enrollment_service::{EnrollmentManager, EnrollmentService};
pub use file_service::{FileManager, FileService, Upload};
pub use progress_service::{ProgressService, ProgressTracker};
pub use report_service::{ReportManager, ReportService};
pub use user_service::{UserManager, UserService};

pub(crate) use user_service::{grant_role_in, revoke_role_in};

#[cfg(any(test, feature = "test-utils"))]
pub use container::MockServiceContainer;
