use sea_orm::{ConnectOptions, Database};
use sea_orm_migration::MigratorTrait;
use std::time::Duration;

use crate::config::database::DatabaseConfig;
use crate::error::{AppError, Result};
use crate::migrations::Migrator;
use crate::state::DbConn;

/// Create a new database connection and run migrations
pub async fn connect(config: &DatabaseConfig) -> Result<DbConn> {
    tracing::info!("Connecting to database...");

    let mut opts = ConnectOptions::new(&config.database_url);
    opts.max_connections(config.max_connections)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(600))
        .sqlx_logging(false);

    let db = Database::connect(opts)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to connect to database: {}", e)))?;

    tracing::info!("Running database migrations...");
    Migrator::up(&db, None)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to run migrations: {}", e)))?;
    tracing::info!("Database migrations completed");

    Ok(db)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user;
    use sea_orm::{EntityTrait, PaginatorTrait};

    #[tokio::test]
    async fn connect_runs_migrations() {
        let config = DatabaseConfig {
            database_url: "sqlite::memory:".to_string(),
            max_connections: 1,
        };

        let db = connect(&config).await.unwrap();
        let count = user::Entity::find().count(&db).await.unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn connect_reports_bad_url() {
        let config = DatabaseConfig {
            database_url: "not-a-database://nowhere".to_string(),
            max_connections: 1,
        };

        let err = connect(&config).await.unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }
}
