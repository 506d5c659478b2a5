//! HTTP surface
//!
//! Builds the full router: feature routes and the health check under
//! `/api`, wrapped in the middleware stack.

pub mod extract;
pub mod response;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use tower_http::compression::CompressionLayer;

use crate::config::Config;
use crate::db;
use crate::features::{self, FeatureState};
use crate::middleware;

/// Create the application router with all routes and middleware
pub fn create_router(state: FeatureState, config: &Config) -> Router {
    let api = Router::new()
        .route("/health", get(health))
        .merge(features::router());

    Router::new()
        .nest("/api", api)
        .with_state(state)
        // Apply layers from innermost to outermost
        .layer(middleware::catch_panic_layer())
        .layer(CompressionLayer::new())
        .layer(middleware::tracing_layer())
        .layer(middleware::cors_layer(&config.cors))
}

/// Health check handler
///
/// 200 with the event log counters while the database answers, 503 otherwise.
async fn health(State(state): State<FeatureState>) -> Response {
    match db::health_check(&state.db).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "event_log": state.events.stats(),
            })),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Database health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unavailable" })),
            )
                .into_response()
        },
    }
}
