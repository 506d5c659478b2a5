//! Common test utilities for blog server integration tests using testcontainers
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::TestPostgres;
//!
//! #[tokio::test]
//! #[ignore = "requires Docker"]
//! async fn test_with_postgres() {
//!     let pg = TestPostgres::start().await.expect("Failed to start PostgreSQL");
//!     sqlx::query("SELECT 1").execute(pg.pool()).await.expect("Query failed");
//! }
//! ```

#![allow(dead_code)]

use anyhow::{Context, Result};
use blog_server::db::migrate::{MigrationReport, MigrationRunner, PgMigrationStore};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::path::PathBuf;
use std::time::Duration;
use testcontainers::{core::IntoContainerPort, runners::AsyncRunner, ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;
use tracing::{debug, info};

/// Workspace `migrations/` directory
pub fn migrations_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../migrations")
}

/// PostgreSQL test container with the workspace migrations applied
pub struct TestPostgres {
    container: ContainerAsync<Postgres>,
    pool: PgPool,
    connection_string: String,
}

impl TestPostgres {
    pub async fn start() -> Result<Self> {
        let pg = Self::start_without_migrations().await?;

        info!("Running database migrations...");
        pg.migrate().await?;

        Ok(pg)
    }

    pub async fn start_without_migrations() -> Result<Self> {
        info!("Starting PostgreSQL test container...");

        let container = Postgres::default()
            .with_tag("16-alpine")
            .start()
            .await
            .context("Failed to start PostgreSQL container")?;

        let host = container
            .get_host()
            .await
            .context("Failed to get container host")?;
        let port = container
            .get_host_port_ipv4(5432.tcp())
            .await
            .context("Failed to get container port")?;

        let connection_string =
            format!("postgresql://postgres:postgres@{}:{}/postgres", host, port);
        debug!("PostgreSQL connection: {}", connection_string);

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(30))
            .connect(&connection_string)
            .await
            .context("Failed to connect to PostgreSQL")?;

        Ok(Self {
            container,
            pool,
            connection_string,
        })
    }

    /// Apply the workspace migrations
    pub async fn migrate(&self) -> Result<MigrationReport> {
        MigrationRunner::new(migrations_dir())
            .run(&PgMigrationStore::new(self.pool.clone()))
            .await
            .context("Failed to run migrations")
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn pool_clone(&self) -> PgPool {
        self.pool.clone()
    }

    pub fn connection_string(&self) -> &str {
        &self.connection_string
    }
}
