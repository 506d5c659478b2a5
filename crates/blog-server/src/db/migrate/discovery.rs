//! Locating migration files on disk

use regex::Regex;
use std::path::Path;
use tracing::{debug, warn};

use super::{splitter::split_statements, MigrationError};

/// File names accepted as migrations: `<number>_<name>.sql`.
pub const MIGRATION_FILE_PATTERN: &str = r"^(\d+)_.+\.sql$";

/// One migration file, read and split into statements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationUnit {
    /// Numeric file name prefix
    pub version: u64,
    /// File name; also the key recorded in `schema_migrations`
    pub name: String,
    pub statements: Vec<String>,
}

/// Parse the version prefix of a migration file name.
///
/// Returns `None` for names that are not migrations.
pub fn parse_migration_name(pattern: &Regex, file_name: &str) -> Option<u64> {
    let captures = pattern.captures(file_name)?;
    match captures[1].parse::<u64>() {
        Ok(version) => Some(version),
        Err(e) => {
            warn!(file = file_name, "Migration version prefix is not a valid number: {}", e);
            None
        },
    }
}

/// Read every migration in `dir`, ordered by version and then file name.
pub async fn discover(dir: &Path) -> Result<Vec<MigrationUnit>, MigrationError> {
    let pattern = Regex::new(MIGRATION_FILE_PATTERN)?;

    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|source| MigrationError::ReadDir {
            path: dir.to_path_buf(),
            source,
        })?;

    let mut found = Vec::new();
    loop {
        let entry = entries
            .next_entry()
            .await
            .map_err(|source| MigrationError::ReadDir {
                path: dir.to_path_buf(),
                source,
            })?;
        let Some(entry) = entry else { break };

        let path = entry.path();
        let is_file = entry
            .file_type()
            .await
            .map(|t| t.is_file())
            .unwrap_or(false);
        if !is_file {
            continue;
        }

        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        match parse_migration_name(&pattern, file_name) {
            Some(version) => found.push((version, file_name.to_string())),
            None => debug!(file = file_name, "Ignoring non-migration file"),
        }
    }

    found.sort();

    for pair in found.windows(2) {
        if pair[0].0 == pair[1].0 {
            warn!(
                version = pair[0].0,
                first = %pair[0].1,
                second = %pair[1].1,
                "Migrations share a version number, applying in file name order"
            );
        }
    }

    let mut units = Vec::with_capacity(found.len());
    for (version, name) in found {
        let path = dir.join(&name);
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| MigrationError::ReadFile { path, source })?;

        units.push(MigrationUnit {
            version,
            statements: split_statements(&content),
            name,
        });
    }

    Ok(units)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, content: &str) {
        std::fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn test_parse_migration_name() {
        let pattern = Regex::new(MIGRATION_FILE_PATTERN).unwrap();

        assert_eq!(parse_migration_name(&pattern, "0001_create_users.sql"), Some(1));
        assert_eq!(parse_migration_name(&pattern, "42_x.sql"), Some(42));
        assert_eq!(parse_migration_name(&pattern, "create_users.sql"), None);
        assert_eq!(parse_migration_name(&pattern, "0001_.sql"), None);
        assert_eq!(parse_migration_name(&pattern, "0001_users.sql.bak"), None);
        assert_eq!(parse_migration_name(&pattern, "0001-users.sql"), None);
        assert_eq!(
            parse_migration_name(&pattern, "99999999999999999999999_overflow.sql"),
            None
        );
    }

    #[tokio::test]
    async fn test_discover_orders_numerically() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "10_ten.sql", "SELECT 10;");
        write(dir.path(), "2_two.sql", "SELECT 2;");
        write(dir.path(), "1_one.sql", "SELECT 1; SELECT 11;");
        write(dir.path(), "README.md", "not a migration");
        std::fs::create_dir(dir.path().join("3_dir.sql")).unwrap();

        let units = discover(dir.path()).await.unwrap();
        let names: Vec<_> = units.iter().map(|u| u.name.as_str()).collect();

        assert_eq!(names, vec!["1_one.sql", "2_two.sql", "10_ten.sql"]);
        assert_eq!(units[0].version, 1);
        assert_eq!(units[0].statements, vec!["SELECT 1", "SELECT 11"]);
        assert_eq!(units[2].version, 10);
    }

    #[tokio::test]
    async fn test_discover_equal_versions_ordered_by_name() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "1_b.sql", "SELECT 'b';");
        write(dir.path(), "001_c.sql", "SELECT 'c';");
        write(dir.path(), "1_a.sql", "SELECT 'a';");

        let units = discover(dir.path()).await.unwrap();
        let names: Vec<_> = units.iter().map(|u| u.name.as_str()).collect();

        assert_eq!(names, vec!["001_c.sql", "1_a.sql", "1_b.sql"]);
    }

    #[tokio::test]
    async fn test_discover_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");

        let result = discover(&missing).await;
        assert!(matches!(result, Err(MigrationError::ReadDir { .. })));
    }
}
