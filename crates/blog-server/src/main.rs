//! Blog server - main entry point

use anyhow::{Context, Result};
use blog_common::logging::{init_logging, LogConfig};
use std::{net::SocketAddr, sync::Arc};
use tokio::signal;
use tracing::info;

use blog_server::{
    api,
    auth::JwtAuthenticator,
    config::Config,
    db::{
        self,
        migrate::{MigrationRunner, PgMigrationStore},
    },
    events::EventLog,
    features::FeatureState,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging; LOG_* variables override these defaults
    let log_config = LogConfig::builder()
        .log_file_prefix("blog-server")
        .filter_directives("blog_server=debug,tower_http=debug,sqlx=warn")
        .build()
        .merge_env()?;

    let _log_guard = init_logging(&log_config)?;

    info!("Starting blog server");

    let config = Config::load()?;
    info!(
        "Configuration loaded - server will bind to {}:{}",
        config.server.host, config.server.port
    );

    let db_pool = db::create_pool(&config.database)
        .await
        .context("Failed to connect to database")?;
    info!("Database connection pool established");

    let report = MigrationRunner::new(&config.migrations.dir)
        .run(&PgMigrationStore::new(db_pool.clone()))
        .await
        .context("Failed to run migrations")?;
    info!(
        applied = report.applied().len(),
        skipped = report.skipped().len(),
        "Database migrations completed"
    );

    let authenticator = JwtAuthenticator::new(&config.auth.jwt_secret, config.auth.token_ttl());

    let events = Arc::new(
        EventLog::open(config.events.to_event_log_config())
            .await
            .context("Failed to open event log")?,
    );
    events.start()?;

    let state = FeatureState {
        db: db_pool.clone(),
        authenticator: Arc::new(authenticator),
        events: Arc::clone(&events),
    };

    let app = api::create_router(state, &config);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on {}", addr);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    // Drain queued events even when the server stopped on an error
    events.stop().await;
    db_pool.close().await;

    served?;
    info!("Server shut down gracefully");

    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        },
    }
}
