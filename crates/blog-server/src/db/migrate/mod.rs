//! Versioned SQL migrations
//!
//! Migration files live in a single directory and are named
//! `<number>_<description>.sql`. At startup the [`MigrationRunner`]:
//!
//! 1. reads and orders every migration file by its numeric prefix
//! 2. creates the `schema_migrations` ledger if needed
//! 3. skips files already recorded in the ledger
//! 4. applies each remaining file in its own transaction, recording it in
//!    the same transaction before committing
//!
//! The first failure rolls back that file's transaction and stops the run.
//! Files committed before it stay applied.
//!
//! # Example
//!
//! ```rust,ignore
//! use blog_server::db::migrate::{MigrationRunner, PgMigrationStore};
//!
//! let report = MigrationRunner::new("migrations")
//!     .run(&PgMigrationStore::new(pool.clone()))
//!     .await?;
//! println!("{} applied", report.applied().len());
//! ```

pub mod discovery;
pub mod splitter;
pub mod store;

pub use discovery::{discover, MigrationUnit, MIGRATION_FILE_PATTERN};
pub use splitter::split_statements;
pub use store::{
    MigrationStore, MigrationTransaction, PgMigrationStore, PgMigrationTransaction, StoreError,
};

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{error, info};

/// Migration errors. All of them are fatal to startup.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Failed to read migrations directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read migration file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid migration file pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Failed to access migration ledger: {source}")]
    Ledger {
        #[source]
        source: StoreError,
    },

    #[error("Failed to begin transaction for migration {name}: {source}")]
    Begin {
        name: String,
        #[source]
        source: StoreError,
    },

    #[error("Statement {index} of migration {name} failed: {source}")]
    Statement {
        name: String,
        /// 1-based position of the failing statement within the file
        index: usize,
        #[source]
        source: StoreError,
    },

    #[error("Failed to record migration {name}: {source}")]
    Record {
        name: String,
        #[source]
        source: StoreError,
    },

    #[error("Failed to commit migration {name}: {source}")]
    Commit {
        name: String,
        #[source]
        source: StoreError,
    },
}

impl MigrationError {
    /// Name of the migration file that failed, if the failure was tied to one.
    pub fn migration_name(&self) -> Option<&str> {
        match self {
            Self::Begin { name, .. }
            | Self::Statement { name, .. }
            | Self::Record { name, .. }
            | Self::Commit { name, .. } => Some(name),
            _ => None,
        }
    }
}

/// What happened to a migration during a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationStatus {
    Applied,
    /// Already recorded in the ledger
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationOutcome {
    pub version: u64,
    pub name: String,
    pub status: MigrationStatus,
}

/// Per-file outcomes of a successful run, in application order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub outcomes: Vec<MigrationOutcome>,
}

impl MigrationReport {
    pub fn applied(&self) -> Vec<&str> {
        self.with_status(MigrationStatus::Applied)
    }

    pub fn skipped(&self) -> Vec<&str> {
        self.with_status(MigrationStatus::Skipped)
    }

    fn with_status(&self, status: MigrationStatus) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| o.status == status)
            .map(|o| o.name.as_str())
            .collect()
    }
}

/// Applies the migrations found in one directory
#[derive(Debug, Clone)]
pub struct MigrationRunner {
    dir: PathBuf,
}

impl MigrationRunner {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Apply every pending migration in order.
    #[tracing::instrument(skip(self, store), fields(dir = %self.dir.display()))]
    pub async fn run<S: MigrationStore>(&self, store: &S) -> Result<MigrationReport, MigrationError> {
        let units = discover(&self.dir).await?;
        info!(count = units.len(), "Discovered migrations");

        store
            .ensure_ledger()
            .await
            .map_err(|source| MigrationError::Ledger { source })?;

        let mut report = MigrationReport::default();

        for unit in units {
            let applied = store
                .is_applied(&unit.name)
                .await
                .map_err(|source| MigrationError::Ledger { source })?;

            let status = if applied {
                info!(migration = %unit.name, "Migration already applied, skipping");
                MigrationStatus::Skipped
            } else {
                info!(
                    migration = %unit.name,
                    statements = unit.statements.len(),
                    "Applying migration"
                );
                apply(store, &unit).await.inspect_err(|e| {
                    error!(migration = %unit.name, "Migration failed: {}", e);
                })?;
                info!(migration = %unit.name, "Migration applied");
                MigrationStatus::Applied
            };

            report.outcomes.push(MigrationOutcome {
                version: unit.version,
                name: unit.name,
                status,
            });
        }

        info!(
            applied = report.applied().len(),
            skipped = report.skipped().len(),
            "Migrations complete"
        );

        Ok(report)
    }
}

async fn apply<S: MigrationStore>(store: &S, unit: &MigrationUnit) -> Result<(), MigrationError> {
    let mut tx = store.begin().await.map_err(|source| MigrationError::Begin {
        name: unit.name.clone(),
        source,
    })?;

    for (i, statement) in unit.statements.iter().enumerate() {
        if let Err(source) = tx.execute(statement).await {
            rollback(tx, &unit.name).await;
            return Err(MigrationError::Statement {
                name: unit.name.clone(),
                index: i + 1,
                source,
            });
        }
    }

    if let Err(source) = tx.record_applied(&unit.name).await {
        rollback(tx, &unit.name).await;
        return Err(MigrationError::Record {
            name: unit.name.clone(),
            source,
        });
    }

    tx.commit().await.map_err(|source| MigrationError::Commit {
        name: unit.name.clone(),
        source,
    })
}

async fn rollback<T: MigrationTransaction>(tx: T, name: &str) {
    if let Err(e) = tx.rollback().await {
        error!(migration = name, "Rollback failed: {}", e);
    }
}
