//! Storage port for the migration runner, plus its PostgreSQL implementation

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

/// Error type returned by store implementations.
pub type StoreError = Box<dyn std::error::Error + Send + Sync>;

/// Table recording which migration files have been applied.
pub const LEDGER_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version VARCHAR(255) PRIMARY KEY,
    applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
)
"#;

/// Durable record of applied migrations.
#[async_trait]
pub trait MigrationStore: Send + Sync {
    type Tx: MigrationTransaction;

    /// Create the ledger if it does not exist yet.
    async fn ensure_ledger(&self) -> Result<(), StoreError>;

    /// Whether the migration file `name` has already been recorded.
    async fn is_applied(&self, name: &str) -> Result<bool, StoreError>;

    async fn begin(&self) -> Result<Self::Tx, StoreError>;
}

/// One migration's transaction. Dropping it without committing must
/// discard its work.
#[async_trait]
pub trait MigrationTransaction: Send {
    async fn execute(&mut self, statement: &str) -> Result<(), StoreError>;

    /// Record `name` in the ledger as part of this transaction.
    async fn record_applied(&mut self, name: &str) -> Result<(), StoreError>;

    async fn commit(self) -> Result<(), StoreError>;

    async fn rollback(self) -> Result<(), StoreError>;
}

/// [`MigrationStore`] backed by a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgMigrationStore {
    pool: PgPool,
}

impl PgMigrationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MigrationStore for PgMigrationStore {
    type Tx = PgMigrationTransaction;

    async fn ensure_ledger(&self) -> Result<(), StoreError> {
        sqlx::Executor::execute(&self.pool, LEDGER_TABLE_SQL).await?;
        Ok(())
    }

    async fn is_applied(&self, name: &str) -> Result<bool, StoreError> {
        let applied: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM schema_migrations WHERE version = $1)",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        Ok(applied)
    }

    async fn begin(&self) -> Result<Self::Tx, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(PgMigrationTransaction { tx })
    }
}

/// Open PostgreSQL transaction for a single migration
pub struct PgMigrationTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl MigrationTransaction for PgMigrationTransaction {
    async fn execute(&mut self, statement: &str) -> Result<(), StoreError> {
        // No bind arguments, so this runs over the simple-query protocol
        sqlx::Executor::execute(&mut *self.tx, statement).await?;
        Ok(())
    }

    async fn record_applied(&mut self, name: &str) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO schema_migrations (version) VALUES ($1)")
            .bind(name)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn commit(self) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<(), StoreError> {
        self.tx.rollback().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_store<S: MigrationStore + 'static>() {}

    #[test]
    fn test_pg_store_implements_migration_port() {
        assert_store::<PgMigrationStore>();
    }

    #[test]
    fn test_ledger_sql_is_idempotent() {
        assert!(LEDGER_TABLE_SQL.contains("CREATE TABLE IF NOT EXISTS schema_migrations"));
    }
}
