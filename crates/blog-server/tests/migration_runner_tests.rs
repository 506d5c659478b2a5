//! Migration runner against an in-memory store

use async_trait::async_trait;
use blog_server::db::migrate::{
    MigrationError, MigrationRunner, MigrationStatus, MigrationStore, MigrationTransaction,
    StoreError,
};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Committed state of the fake database
#[derive(Debug, Default)]
struct Database {
    ledger_created: bool,
    ledger: BTreeSet<String>,
    executed: Vec<String>,
    rollbacks: Vec<String>,
}

/// Store whose transactions buffer work until commit. Any statement
/// containing `fail_marker` fails.
#[derive(Clone, Default)]
struct FakeStore {
    db: Arc<Mutex<Database>>,
    fail_marker: Option<String>,
}

impl FakeStore {
    fn failing_on(marker: &str) -> Self {
        Self {
            fail_marker: Some(marker.to_string()),
            ..Default::default()
        }
    }

    fn executed(&self) -> Vec<String> {
        self.db.lock().unwrap().executed.clone()
    }

    fn ledger(&self) -> Vec<String> {
        self.db.lock().unwrap().ledger.iter().cloned().collect()
    }

    fn rollbacks(&self) -> Vec<String> {
        self.db.lock().unwrap().rollbacks.clone()
    }
}

struct FakeTransaction {
    db: Arc<Mutex<Database>>,
    fail_marker: Option<String>,
    statements: Vec<String>,
    recorded: Vec<String>,
}

#[async_trait]
impl MigrationStore for FakeStore {
    type Tx = FakeTransaction;

    async fn ensure_ledger(&self) -> Result<(), StoreError> {
        self.db.lock().unwrap().ledger_created = true;
        Ok(())
    }

    async fn is_applied(&self, name: &str) -> Result<bool, StoreError> {
        let db = self.db.lock().unwrap();
        assert!(db.ledger_created, "ledger must exist before it is queried");
        Ok(db.ledger.contains(name))
    }

    async fn begin(&self) -> Result<Self::Tx, StoreError> {
        Ok(FakeTransaction {
            db: Arc::clone(&self.db),
            fail_marker: self.fail_marker.clone(),
            statements: Vec::new(),
            recorded: Vec::new(),
        })
    }
}

#[async_trait]
impl MigrationTransaction for FakeTransaction {
    async fn execute(&mut self, statement: &str) -> Result<(), StoreError> {
        if let Some(marker) = &self.fail_marker {
            if statement.contains(marker.as_str()) {
                return Err(format!("syntax error near {}", marker).into());
            }
        }
        self.statements.push(statement.to_string());
        Ok(())
    }

    async fn record_applied(&mut self, name: &str) -> Result<(), StoreError> {
        self.recorded.push(name.to_string());
        Ok(())
    }

    async fn commit(self) -> Result<(), StoreError> {
        let mut db = self.db.lock().unwrap();
        db.executed.extend(self.statements);
        db.ledger.extend(self.recorded);
        Ok(())
    }

    async fn rollback(self) -> Result<(), StoreError> {
        let mut db = self.db.lock().unwrap();
        db.rollbacks.extend(self.recorded);
        db.rollbacks.push(format!("{} statements discarded", self.statements.len()));
        Ok(())
    }
}

fn write(dir: &Path, name: &str, sql: &str) {
    std::fs::write(dir.join(name), sql).unwrap();
}

fn three_migrations(dir: &Path) {
    write(dir, "1_a.sql", "CREATE TABLE a (id INT);");
    write(dir, "2_b.sql", "CREATE TABLE b (id INT); INSERT INTO b VALUES (1);");
    write(dir, "3_c.sql", "CREATE TABLE c (id INT);");
}

#[tokio::test]
async fn test_applies_in_version_order() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "10_late.sql", "SELECT 10;");
    write(dir.path(), "2_early.sql", "SELECT 2;");
    write(dir.path(), "README.md", "not a migration");
    write(dir.path(), "notes.sql", "SELECT 'no version';");

    let store = FakeStore::default();
    let report = MigrationRunner::new(dir.path()).run(&store).await.unwrap();

    assert_eq!(report.applied(), vec!["2_early.sql", "10_late.sql"]);
    assert_eq!(store.executed(), vec!["SELECT 2", "SELECT 10"]);
}

#[tokio::test]
async fn test_second_run_applies_nothing() {
    let dir = tempfile::tempdir().unwrap();
    three_migrations(dir.path());
    let store = FakeStore::default();
    let runner = MigrationRunner::new(dir.path());

    let first = runner.run(&store).await.unwrap();
    assert_eq!(first.applied(), vec!["1_a.sql", "2_b.sql", "3_c.sql"]);

    let second = runner.run(&store).await.unwrap();
    assert!(second.applied().is_empty());
    assert_eq!(second.skipped(), vec!["1_a.sql", "2_b.sql", "3_c.sql"]);
    assert!(second
        .outcomes
        .iter()
        .all(|o| o.status == MigrationStatus::Skipped));

    assert_eq!(store.executed().len(), 4);
}

#[tokio::test]
async fn test_failure_keeps_earlier_and_stops_later() {
    let dir = tempfile::tempdir().unwrap();
    three_migrations(dir.path());
    let store = FakeStore::failing_on("INSERT INTO b");

    let err = MigrationRunner::new(dir.path())
        .run(&store)
        .await
        .unwrap_err();

    match &err {
        MigrationError::Statement { name, index, .. } => {
            assert_eq!(name, "2_b.sql");
            assert_eq!(*index, 2);
        },
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.migration_name(), Some("2_b.sql"));

    // Unit 1 committed, unit 2 rolled back as a whole, unit 3 never tried
    assert_eq!(store.ledger(), vec!["1_a.sql"]);
    assert_eq!(store.executed(), vec!["CREATE TABLE a (id INT)"]);
    assert_eq!(store.rollbacks(), vec!["1 statements discarded"]);
}

#[tokio::test]
async fn test_retry_after_fix_resumes_at_failed_unit() {
    let dir = tempfile::tempdir().unwrap();
    three_migrations(dir.path());
    let broken = FakeStore::failing_on("INSERT INTO b");
    assert!(MigrationRunner::new(dir.path()).run(&broken).await.is_err());

    let fixed = FakeStore {
        db: Arc::clone(&broken.db),
        fail_marker: None,
    };
    let report = MigrationRunner::new(dir.path()).run(&fixed).await.unwrap();

    assert_eq!(report.skipped(), vec!["1_a.sql"]);
    assert_eq!(report.applied(), vec!["2_b.sql", "3_c.sql"]);
}

#[tokio::test]
async fn test_dollar_quoted_body_is_one_statement() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "1_fn.sql",
        "CREATE FUNCTION f() RETURNS INT AS $$ BEGIN RETURN 1; END; $$ LANGUAGE plpgsql;\nSELECT f();",
    );
    let store = FakeStore::default();
    MigrationRunner::new(dir.path()).run(&store).await.unwrap();

    let executed = store.executed();
    assert_eq!(executed.len(), 2);
    assert!(executed[0].contains("RETURN 1; END;"));
    assert_eq!(executed[1], "SELECT f()");
}

#[tokio::test]
async fn test_missing_directory_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = MigrationRunner::new(dir.path().join("nope"))
        .run(&FakeStore::default())
        .await
        .unwrap_err();

    assert!(matches!(err, MigrationError::ReadDir { .. }));
    assert_eq!(err.migration_name(), None);
}

#[tokio::test]
async fn test_empty_file_is_still_recorded() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "1_empty.sql", "-- nothing yet\n");
    let store = FakeStore::default();

    let report = MigrationRunner::new(dir.path()).run(&store).await.unwrap();
    assert_eq!(report.applied(), vec!["1_empty.sql"]);
    assert_eq!(store.ledger(), vec!["1_empty.sql"]);
    assert!(store.executed().is_empty());
}

#[tokio::test]
async fn test_workspace_migrations_split_cleanly() {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../migrations");
    let store = FakeStore::default();

    let report = MigrationRunner::new(&dir).run(&store).await.unwrap();
    assert_eq!(
        report.applied(),
        vec![
            "0001_create_users_table.sql",
            "0002_create_posts_table.sql",
            "0003_create_comments_table.sql",
            "0004_add_updated_at_triggers.sql",
        ]
    );

    let executed = store.executed();
    let function = executed
        .iter()
        .find(|s| s.contains("FUNCTION set_updated_at"))
        .unwrap();
    assert!(function.contains("RETURN NEW;"));
    assert!(function.ends_with("LANGUAGE plpgsql"));
}
