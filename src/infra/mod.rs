//! Infrastructure layer - External systems integration
//!
//! - Database connection, migrations and repositories
//! - Unit of Work for transaction management
//! - Byte storage for uploaded and generated files
//! - Document rendering for certificates and exports

pub mod db;
pub mod export;
pub mod repositories;
pub mod storage;
pub mod unit_of_work;

pub use db::{Database, Migrator};
pub use export::{DocumentExporter, PlainTextExporter, RenderedDocument};
pub use repositories::Store;
pub use storage::{ByteStream, FileStorage, LocalDiskStorage, StoredObject};
pub use unit_of_work::{Persistence, TransactionContext, TxFuture, UnitOfWork};

#[cfg(any(test, feature = "test-utils"))]
pub use export::MockDocumentExporter;
#[cfg(any(test, feature = "test-utils"))]
pub use storage::MockFileStorage;
