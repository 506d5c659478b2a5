//! Development tasks for the blog workspace
//!
//! - `new-migration <name>`: create the next numbered migration file
//! - `check-migrations`: list migrations with their statement counts, using
//!   the same file pattern and SQL splitter as the server

use anyhow::{bail, Context};
use blog_server::db::migrate::{
    discovery::parse_migration_name, split_statements, MIGRATION_FILE_PATTERN,
};
use clap::Parser;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Development tasks for the blog server", long_about = None)]
struct Cli {
    /// Migrations directory
    #[arg(long, global = true, env = "MIGRATIONS_DIR", default_value = "migrations")]
    migrations_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Create an empty migration numbered after the latest one
    NewMigration {
        /// Short description, e.g. "add post tags"
        name: String,
    },
    /// List migrations in application order with their statement counts
    CheckMigrations,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::NewMigration { name } => {
            let path = new_migration(&cli.migrations_dir, &name)?;
            println!("Created {}", path.display());
        },
        Command::CheckMigrations => check_migrations(&cli.migrations_dir)?,
    }

    Ok(())
}

/// Sorted `(version, file name)` pairs for every migration in `dir`
fn migrations(dir: &Path) -> anyhow::Result<Vec<(u64, String)>> {
    let pattern = Regex::new(MIGRATION_FILE_PATTERN)?;
    let mut found = Vec::new();

    for entry in fs::read_dir(dir).with_context(|| format!("Failed to read {}", dir.display()))? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let file_name = entry.file_name().to_string_lossy().into_owned();
        if let Some(version) = parse_migration_name(&pattern, &file_name) {
            found.push((version, file_name));
        }
    }

    found.sort();
    Ok(found)
}

/// `"Add post tags"` -> `"add_post_tags"`
fn slugify(name: &str) -> String {
    name.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

fn new_migration(dir: &Path, name: &str) -> anyhow::Result<PathBuf> {
    let slug = slugify(name);
    if slug.is_empty() {
        bail!("Migration name must contain letters or digits");
    }

    fs::create_dir_all(dir)?;
    let next = migrations(dir)?.last().map_or(1, |(version, _)| version + 1);
    let path = dir.join(format!("{:04}_{}.sql", next, slug));

    fs::write(
        &path,
        format!(
            "-- {}\n-- Created {}\n\n",
            name.trim(),
            chrono::Utc::now().format("%Y-%m-%d")
        ),
    )?;

    Ok(path)
}

fn check_migrations(dir: &Path) -> anyhow::Result<()> {
    let found = migrations(dir)?;
    if found.is_empty() {
        println!("No migrations in {}", dir.display());
        return Ok(());
    }

    for pair in found.windows(2) {
        if pair[0].0 == pair[1].0 {
            println!("warning: {} and {} share version {}", pair[0].1, pair[1].1, pair[0].0);
        }
    }

    for (version, file_name) in &found {
        let sql = fs::read_to_string(dir.join(file_name))?;
        let statements = split_statements(&sql);
        println!("{:>6}  {:<40} {} statement(s)", version, file_name, statements.len());
    }

    Ok(())
}
