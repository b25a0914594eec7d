//! HTTP surface of the proxy
//!
//! - `POST /read` - Prometheus remote-read (snappy + protobuf)
//! - `GET /health`, `GET /ready` - liveness and readiness probes

pub mod read;
mod telemetry;

use crate::proxy::ReadProxy;

use axum::Router;

/// Default cap on the compressed `/read` body.
pub const DEFAULT_MAX_BODY_SIZE: usize = 8 * 1024 * 1024;

/// HTTP API server configuration
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    /// Maximum compressed request body size
    pub max_body_size: usize,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }
}

/// Build the HTTP API router
pub fn build_http_router(proxy: ReadProxy, config: &ApiServerConfig) -> Router {
    use axum::extract::DefaultBodyLimit;
    use axum::middleware;
    use axum::routing::{get, post};

    Router::new()
        // Health check
        .route("/health", get(health_check))
        .route("/ready", get(ready_check))

        // Remote read
        .route("/read", post(read::handle_remote_read))

        // State
        .with_state(ApiState { proxy })
        .layer(DefaultBodyLimit::max(config.max_body_size))
        .layer(middleware::from_fn(telemetry::route_metrics_middleware))
}

/// Shared API state
#[derive(Clone)]
pub struct ApiState {
    pub proxy: ReadProxy,
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Readiness check endpoint
async fn ready_check() -> &'static str {
    // The override table is loaded before the listener binds.
    "READY"
}
