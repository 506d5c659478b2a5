//! Configuration management

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::db::{compose_url, DbConfig};
use crate::events::EventLogConfig;

// ============================================================================
// Server Configuration Constants
// ============================================================================

/// Default server host binding.
pub const DEFAULT_SERVER_HOST: &str = "127.0.0.1";

/// Default server port.
pub const DEFAULT_SERVER_PORT: u16 = 8080;

/// Database connection defaults, used when `DATABASE_URL` is not set.
pub const DEFAULT_DB_HOST: &str = "localhost";
pub const DEFAULT_DB_PORT: u16 = 5432;
pub const DEFAULT_DB_USER: &str = "postgres";
pub const DEFAULT_DB_PASSWORD: &str = "postgres";
pub const DEFAULT_DB_NAME: &str = "blogdb";
pub const DEFAULT_DB_SSLMODE: &str = "disable";

/// Default maximum database connections in the pool.
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 25;

/// Default minimum database connections in the pool.
pub const DEFAULT_DATABASE_MIN_CONNECTIONS: u32 = 2;

/// Default database connection timeout in seconds.
pub const DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default maximum connection lifetime in seconds (5 minutes).
pub const DEFAULT_DATABASE_MAX_LIFETIME_SECS: u64 = 300;

/// Development signing secret. Never use it outside local development.
pub const DEFAULT_JWT_SECRET: &str = "default-secret-key";

/// Default token lifetime in hours.
pub const DEFAULT_JWT_EXPIRY_HOURS: u64 = 24;

/// Longest accepted token lifetime in hours (one year).
pub const MAX_JWT_EXPIRY_HOURS: u64 = 24 * 365;

/// Default event log file.
pub const DEFAULT_EVENT_LOG_PATH: &str = crate::events::DEFAULT_EVENT_LOG_PATH;

/// Default event queue capacity.
pub const DEFAULT_EVENT_LOG_CAPACITY: usize = crate::events::DEFAULT_EVENT_LOG_CAPACITY;

/// Default pause before each event log write, in milliseconds.
pub const DEFAULT_EVENT_LOG_WRITE_DELAY_MS: u64 = 1000;

/// Default migrations directory.
pub const DEFAULT_MIGRATIONS_DIR: &str = "migrations";

/// Default CORS allowed origin.
pub const DEFAULT_CORS_ALLOWED_ORIGIN: &str = "*";

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DbConfig,
    pub auth: AuthConfig,
    pub events: EventLogSettings,
    pub migrations: MigrationsConfig,
    pub cors: CorsConfig,
}

/// Server-specific configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Token signing configuration
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_hours: u64,
}

impl AuthConfig {
    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_hours.saturating_mul(3600))
    }

    pub fn uses_default_secret(&self) -> bool {
        self.jwt_secret == DEFAULT_JWT_SECRET
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"***")
            .field("token_ttl_hours", &self.token_ttl_hours)
            .finish()
    }
}

/// Audit event log configuration
#[derive(Debug, Clone)]
pub struct EventLogSettings {
    pub path: PathBuf,
    pub capacity: usize,
    pub write_delay_ms: u64,
}

impl EventLogSettings {
    pub fn to_event_log_config(&self) -> EventLogConfig {
        EventLogConfig {
            path: self.path.clone(),
            capacity: self.capacity,
            write_delay: Duration::from_millis(self.write_delay_ms),
        }
    }
}

/// Migration configuration
#[derive(Debug, Clone)]
pub struct MigrationsConfig {
    pub dir: PathBuf,
}

/// CORS configuration
#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allow_credentials: bool,
}

impl Config {
    /// Load configuration from `.env`, the environment and defaults
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self::from_env();
        config.validate()?;

        Ok(config)
    }

    /// Read configuration from environment variables without validating it
    pub fn from_env() -> Self {
        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| {
                compose_url(
                    &env_or("DB_HOST", DEFAULT_DB_HOST.to_string()),
                    env_or("DB_PORT", DEFAULT_DB_PORT),
                    &env_or("DB_USER", DEFAULT_DB_USER.to_string()),
                    &env_or("DB_PASSWORD", DEFAULT_DB_PASSWORD.to_string()),
                    &env_or("DB_NAME", DEFAULT_DB_NAME.to_string()),
                    &env_or("DB_SSLMODE", DEFAULT_DB_SSLMODE.to_string()),
                )
            });

        Config {
            server: ServerConfig {
                host: env_or("SERVER_HOST", DEFAULT_SERVER_HOST.to_string()),
                port: env_or("SERVER_PORT", DEFAULT_SERVER_PORT),
            },
            database: DbConfig {
                url: database_url,
                max_connections: env_or(
                    "DATABASE_MAX_CONNECTIONS",
                    DEFAULT_DATABASE_MAX_CONNECTIONS,
                ),
                min_connections: env_or(
                    "DATABASE_MIN_CONNECTIONS",
                    DEFAULT_DATABASE_MIN_CONNECTIONS,
                ),
                connect_timeout_secs: env_or(
                    "DATABASE_CONNECT_TIMEOUT",
                    DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
                ),
                max_lifetime_secs: Some(env_or(
                    "DATABASE_MAX_LIFETIME",
                    DEFAULT_DATABASE_MAX_LIFETIME_SECS,
                )),
            },
            auth: AuthConfig {
                jwt_secret: env_or("JWT_SECRET", DEFAULT_JWT_SECRET.to_string()),
                token_ttl_hours: env_or("JWT_EXPIRY_HOURS", DEFAULT_JWT_EXPIRY_HOURS),
            },
            events: EventLogSettings {
                path: PathBuf::from(env_or(
                    "EVENT_LOG_PATH",
                    DEFAULT_EVENT_LOG_PATH.to_string(),
                )),
                capacity: env_or("EVENT_LOG_CAPACITY", DEFAULT_EVENT_LOG_CAPACITY),
                write_delay_ms: env_or(
                    "EVENT_LOG_WRITE_DELAY_MS",
                    DEFAULT_EVENT_LOG_WRITE_DELAY_MS,
                ),
            },
            migrations: MigrationsConfig {
                dir: PathBuf::from(env_or(
                    "MIGRATIONS_DIR",
                    DEFAULT_MIGRATIONS_DIR.to_string(),
                )),
            },
            cors: CorsConfig {
                allowed_origins: env_or(
                    "CORS_ALLOWED_ORIGINS",
                    DEFAULT_CORS_ALLOWED_ORIGIN.to_string(),
                )
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
                allow_credentials: env_or("CORS_ALLOW_CREDENTIALS", false),
            },
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        // Validate port
        if self.server.port == 0 {
            anyhow::bail!("Server port must be greater than 0");
        }

        // Validate database URL
        if self.database.url.is_empty() {
            anyhow::bail!("Database URL cannot be empty");
        }

        // Validate connection pool settings
        if self.database.max_connections == 0 {
            anyhow::bail!("Database max_connections must be greater than 0");
        }

        if self.database.min_connections > self.database.max_connections {
            anyhow::bail!(
                "Database min_connections ({}) cannot be greater than max_connections ({})",
                self.database.min_connections,
                self.database.max_connections
            );
        }

        // Validate token settings
        if self.auth.jwt_secret.is_empty() {
            anyhow::bail!("JWT secret cannot be empty");
        }

        if self.auth.token_ttl_hours > MAX_JWT_EXPIRY_HOURS {
            anyhow::bail!(
                "JWT expiry ({} hours) cannot exceed {} hours",
                self.auth.token_ttl_hours,
                MAX_JWT_EXPIRY_HOURS
            );
        }

        if self.auth.uses_default_secret() {
            tracing::warn!("JWT_SECRET is not set - using the development default secret");
        }

        // Validate event log settings
        if self.events.capacity == 0 {
            anyhow::bail!("Event log capacity must be greater than 0");
        }

        // Validate CORS origins
        if self.cors.allowed_origins.is_empty() {
            tracing::warn!("No CORS origins configured - all origins will be allowed");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: DEFAULT_SERVER_HOST.to_string(),
                port: DEFAULT_SERVER_PORT,
            },
            database: DbConfig::default(),
            auth: AuthConfig {
                jwt_secret: DEFAULT_JWT_SECRET.to_string(),
                token_ttl_hours: DEFAULT_JWT_EXPIRY_HOURS,
            },
            events: EventLogSettings {
                path: PathBuf::from(DEFAULT_EVENT_LOG_PATH),
                capacity: DEFAULT_EVENT_LOG_CAPACITY,
                write_delay_ms: DEFAULT_EVENT_LOG_WRITE_DELAY_MS,
            },
            migrations: MigrationsConfig {
                dir: PathBuf::from(DEFAULT_MIGRATIONS_DIR),
            },
            cors: CorsConfig {
                allowed_origins: vec![DEFAULT_CORS_ALLOWED_ORIGIN.to_string()],
                allow_credentials: false,
            },
        }
    }
}

/// Parse an environment variable, falling back to `default` when it is
/// unset, empty or unparseable.
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => match value.trim().parse() {
            Ok(parsed) => parsed,
            Err(_) => {
                tracing::warn!(key, value = %value, "Ignoring unparseable configuration value");
                default
            },
        },
        _ => default,
    }
}
