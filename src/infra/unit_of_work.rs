//! Unit of Work: repository access plus closure-scoped transactions.
//!
//! Reads go through [`UnitOfWork::store`]. Multi-step writes run inside
//! [`UnitOfWork::transaction`], which commits when the closure returns `Ok`
//! and rolls back otherwise. The closure receives a [`TransactionContext`]
//! exposing the same repositories bound to the open transaction.

use async_trait::async_trait;
use futures::future::BoxFuture;
use sea_orm::{
    AccessMode, ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbBackend,
    IsolationLevel, TransactionTrait,
};

use super::repositories::Store;
use crate::errors::{AppError, AppResult};

/// Repositories bound to an open transaction
pub type TransactionContext<'a> = Store<'a, DatabaseTransaction>;

/// Boxed future returned by transaction closures
pub type TxFuture<'a, T> = BoxFuture<'a, AppResult<T>>;

/// Unit of Work trait for dependency injection.
///
/// Not object safe because of the generic transaction methods; services are
/// generic over it instead.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    /// Repositories on the shared connection
    fn store(&self) -> Store<'_, DatabaseConnection>;

    /// Execute a closure within a read-committed transaction.
    async fn transaction<F, T>(&self, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> TxFuture<'a, T> + Send,
        T: Send;
}

/// SeaORM-backed implementation of [`UnitOfWork`]
#[derive(Clone)]
pub struct Persistence {
    db: DatabaseConnection,
}

impl Persistence {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn begin(&self) -> AppResult<DatabaseTransaction> {
        // SQLite has a single isolation mode and rejects the configuration statements.
        let txn = match self.db.get_database_backend() {
            DbBackend::Sqlite => self.db.begin().await,
            _ => {
                self.db
                    .begin_with_config(
                        Some(IsolationLevel::ReadCommitted),
                        Some(AccessMode::ReadWrite),
                    )
                    .await
            }
        };

        txn.map_err(AppError::from)
    }

    async fn execute_transaction<F, T>(&self, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> TxFuture<'a, T> + Send,
        T: Send,
    {
        let txn = self.begin().await?;

        let outcome = f(Store::new(&txn)).await;

        match outcome {
            Ok(result) => {
                txn.commit().await.map_err(AppError::from)?;
                Ok(result)
            }
            Err(e) => {
                if let Err(rollback_err) = txn.rollback().await {
                    tracing::error!("Transaction rollback failed: {}", rollback_err);
                }
                Err(e)
            }
        }
    }
}

#[async_trait]
impl UnitOfWork for Persistence {
    fn store(&self) -> Store<'_, DatabaseConnection> {
        Store::new(&self.db)
    }

    async fn transaction<F, T>(&self, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> TxFuture<'a, T> + Send,
        T: Send,
    {
        self.execute_transaction(f).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RoleName;
    use crate::infra::Database;

    async fn persistence() -> Persistence {
        let db = Database::connect_url("sqlite::memory:").await.unwrap();
        db.run_migrations().await.unwrap();
        Persistence::new(db.get_connection())
    }

    #[tokio::test]
    async fn test_transaction_commits_on_ok() {
        let uow = persistence().await;
        let name = RoleName::parse("auditor").unwrap();

        let created = uow
            .transaction(|tx| {
                let name = name.clone();
                Box::pin(async move { tx.roles().create(&name, None).await })
            })
            .await
            .unwrap();

        let found = uow.store().roles().find_by_name(&name).await.unwrap();
        assert_eq!(found.map(|r| r.id), Some(created.id));
    }

    #[tokio::test]
    async fn test_transaction_rolls_back_on_err() {
        let uow = persistence().await;
        let name = RoleName::parse("auditor").unwrap();

        let result: AppResult<()> = uow
            .transaction(|tx| {
                let name = name.clone();
                Box::pin(async move {
                    tx.roles().create(&name, None).await?;
                    Err(AppError::Conflict("abort".to_string()))
                })
            })
            .await;

        assert!(result.is_err());
        assert!(uow.store().roles().find_by_name(&name).await.unwrap().is_none());
    }
}
