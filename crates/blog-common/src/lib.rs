//! Blog Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared process plumbing for the blog workspace members.
//!
//! # Overview
//!
//! - **Logging**: operator diagnostics through `tracing`, configured from the
//!   environment (console, daily-rotated files, or both; text or JSON)
//!
//! # Example
//!
//! ```no_run
//! use blog_common::logging::{init_logging, LogConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let _guard = init_logging(&LogConfig::from_env()?)?;
//!     tracing::info!("ready");
//!     Ok(())
//! }
//! ```

pub mod logging;

pub use logging::{init_logging, LogConfig, LoggingGuard};
