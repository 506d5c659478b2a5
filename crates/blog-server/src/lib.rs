//! Blog server library
//!
//! REST API for a small blogging platform: users register and log in,
//! write posts and comment on them.
//!
//! # Overview
//!
//! - **auth**: JWT issuance and validation, bcrypt password hashing and the
//!   `RequestIdentity` extractor
//! - **db**: connection pool and the ordered, idempotent SQL migration runner
//! - **events**: bounded, asynchronous audit event log written to a text file
//! - **features**: vertical slices (users, posts, comments) with their
//!   commands, queries and routes
//! - **api**, **middleware**: router assembly, response envelopes, CORS,
//!   tracing and panic recovery
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use blog_server::{api, auth::JwtAuthenticator, config::Config, db, events::EventLog};
//! use blog_server::features::FeatureState;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let pool = db::create_pool(&config.database).await?;
//!     let events = Arc::new(EventLog::open(config.events.to_event_log_config()).await?);
//!     events.start()?;
//!
//!     let state = FeatureState {
//!         db: pool,
//!         authenticator: Arc::new(JwtAuthenticator::new(
//!             &config.auth.jwt_secret,
//!             config.auth.token_ttl(),
//!         )),
//!         events,
//!     };
//!     let app = api::create_router(state, &config);
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod features;
pub mod middleware;

pub use error::{ApiResult, AppError};
