//! Service Container - centralized service access.
//!
//! Services are built once over a shared [`Persistence`] and handed out as
//! trait objects, so callers depend on the service traits only.

use std::sync::Arc;

use super::{
    AuthService, Authenticator, CatalogManager, CatalogService, EnrollmentManager,
    EnrollmentService, FileManager, FileService, ProgressService, ProgressTracker, ReportManager,
    ReportService, UserManager, UserService,
};
use crate::config::Config;
use crate::infra::{
    DocumentExporter, FileStorage, LocalDiskStorage, Persistence, PlainTextExporter,
};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Service container trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
pub trait ServiceContainer: Send + Sync {
    fn auth(&self) -> Arc<dyn AuthService>;

    fn users(&self) -> Arc<dyn UserService>;

    fn catalog(&self) -> Arc<dyn CatalogService>;

    fn enrollments(&self) -> Arc<dyn EnrollmentService>;

    fn progress(&self) -> Arc<dyn ProgressService>;

    fn files(&self) -> Arc<dyn FileService>;

    fn reports(&self) -> Arc<dyn ReportService>;
}

/// Concrete implementation of ServiceContainer
pub struct Services {
    auth_service: Arc<dyn AuthService>,
    user_service: Arc<dyn UserService>,
    catalog_service: Arc<dyn CatalogService>,
    enrollment_service: Arc<dyn EnrollmentService>,
    progress_service: Arc<dyn ProgressService>,
    file_service: Arc<dyn FileService>,
    report_service: Arc<dyn ReportService>,
}

impl Services {
    /// Build every service with the default collaborators: files on local
    /// disk under `UPLOAD_DIR` and plain-text documents.
    pub fn from_connection(db: sea_orm::DatabaseConnection, config: Config) -> Self {
        let storage: Arc<dyn FileStorage> =
            Arc::new(LocalDiskStorage::new(config.upload_dir.clone()));
        let exporter: Arc<dyn DocumentExporter> = Arc::new(PlainTextExporter);

        Self::with_collaborators(db, config, storage, exporter)
    }

    /// Build every service with explicit storage and rendering backends.
    pub fn with_collaborators(
        db: sea_orm::DatabaseConnection,
        config: Config,
        storage: Arc<dyn FileStorage>,
        exporter: Arc<dyn DocumentExporter>,
    ) -> Self {
        let uow = Arc::new(Persistence::new(db));

        Self {
            auth_service: Arc::new(Authenticator::new(uow.clone())),
            user_service: Arc::new(UserManager::new(uow.clone(), storage.clone())),
            catalog_service: Arc::new(CatalogManager::new(uow.clone())),
            enrollment_service: Arc::new(EnrollmentManager::new(uow.clone())),
            progress_service: Arc::new(ProgressTracker::new(uow.clone(), config.clone())),
            file_service: Arc::new(FileManager::new(uow.clone(), storage.clone(), config.clone())),
            report_service: Arc::new(ReportManager::new(uow, storage, exporter, config)),
        }
    }
}

impl ServiceContainer for Services {
    fn auth(&self) -> Arc<dyn AuthService> {
        self.auth_service.clone()
    }

    fn users(&self) -> Arc<dyn UserService> {
        self.user_service.clone()
    }

    fn catalog(&self) -> Arc<dyn CatalogService> {
        self.catalog_service.clone()
    }

    fn enrollments(&self) -> Arc<dyn EnrollmentService> {
        self.enrollment_service.clone()
    }

    fn progress(&self) -> Arc<dyn ProgressService> {
        self.progress_service.clone()
    }

    fn files(&self) -> Arc<dyn FileService> {
        self.file_service.clone()
    }

    fn reports(&self) -> Arc<dyn ReportService> {
        self.report_service.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::Database;

    #[tokio::test]
    async fn test_container_hands_out_shared_services() {
        let db = Database::connect_url("sqlite::memory:").await.unwrap();
        db.run_migrations().await.unwrap();

        let services = Services::from_connection(db.get_connection(), Config::default());
        assert!(Arc::ptr_eq(&services.catalog(), &services.catalog()));

        let page = services
            .catalog()
            .list_courses(Default::default())
            .await
            .unwrap();
        assert_eq!(page.meta.total, 0);
    }
}
