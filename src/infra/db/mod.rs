//! Database connection and schema management.

use std::collections::HashSet;

use sea_orm::{Database as SeaDatabase, DatabaseConnection, DbErr, EntityTrait};
use sea_orm_migration::{seaql_migrations, MigratorTrait};

use crate::config::Config;

pub mod migrations;

pub use migrations::Migrator;

/// Owns the pooled connection shared by every service
#[derive(Clone)]
pub struct Database {
    connection: DatabaseConnection,
}

impl Database {
    /// Connect to `DATABASE_URL` and bring the schema up to date.
    pub async fn connect(config: &Config) -> Result<Self, DbErr> {
        let db = Self::connect_url(&config.database_url).await?;
        db.run_migrations().await?;

        tracing::info!("Database connected and migrations applied");
        Ok(db)
    }

    /// Connect to `DATABASE_URL` and leave the schema alone (`migrate` command).
    pub async fn connect_without_migrations(config: &Config) -> Result<Self, DbErr> {
        Self::connect_url(&config.database_url).await
    }

    /// Connect to an explicit URL, e.g. `sqlite::memory:` in tests.
    pub async fn connect_url(url: &str) -> Result<Self, DbErr> {
        let connection = SeaDatabase::connect(url).await?;
        Ok(Self { connection })
    }

    /// Handle for building a [`Persistence`](crate::infra::Persistence).
    pub fn get_connection(&self) -> DatabaseConnection {
        self.connection.clone()
    }

    pub async fn run_migrations(&self) -> Result<(), DbErr> {
        Migrator::up(&self.connection, None).await
    }

    /// Roll back the most recent migration only.
    pub async fn rollback_migration(&self) -> Result<(), DbErr> {
        Migrator::down(&self.connection, Some(1)).await
    }

    /// Every known migration in order, paired with whether it is applied.
    pub async fn migration_status(&self) -> Result<Vec<(String, bool)>, DbErr> {
        let applied: HashSet<String> = seaql_migrations::Entity::find()
            .all(&self.connection)
            .await?
            .into_iter()
            .map(|row| row.version)
            .collect();

        Ok(Migrator::migrations()
            .iter()
            .map(|m| {
                let name = m.name().to_string();
                let is_applied = applied.contains(&name);
                (name, is_applied)
            })
            .collect())
    }

    /// Drop every table and rebuild the schema from scratch.
    pub async fn fresh_migrations(&self) -> Result<(), DbErr> {
        Migrator::fresh(&self.connection).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_status_reflects_applied_migrations() {
        let db = Database::connect_url("sqlite::memory:").await.unwrap();

        let before = db.migration_status().await;
        // The bookkeeping table does not exist before the first run
        assert!(before.map(|s| s.iter().all(|(_, applied)| !applied)).unwrap_or(true));

        db.run_migrations().await.unwrap();
        let after = db.migration_status().await.unwrap();
        assert_eq!(after.len(), Migrator::migrations().len());
        assert!(after.iter().all(|(_, applied)| *applied));

        db.rollback_migration().await.unwrap();
        let rolled_back = db.migration_status().await.unwrap();
        assert!(!rolled_back.last().unwrap().1);
    }
}
