//! Status endpoint
//!
//! - `GET /health` - liveness and identity as JSON
//! - `GET /metrics` - Prometheus text format

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::metrics;

/// Shared state for the status handlers
#[derive(Debug)]
pub struct StatusState {
    feed_key: String,
    started: Instant,
}

impl StatusState {
    pub fn new(feed_key: impl Into<String>) -> Self {
        Self {
            feed_key: feed_key.into(),
            started: Instant::now(),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    feed_key: String,
    uptime_secs: u64,
    metrics_enabled: bool,
}

async fn health(State(state): State<Arc<StatusState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        feed_key: state.feed_key.clone(),
        uptime_secs: state.started.elapsed().as_secs(),
        metrics_enabled: metrics::metrics_initialized(),
    })
}

async fn prometheus_metrics() -> impl IntoResponse {
    match metrics::encode_metrics() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4")],
            body,
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain")],
                String::from("metrics unavailable"),
            )
        }
    }
}

/// Build the status router
pub fn router(state: Arc<StatusState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(prometheus_metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the status endpoint on `listener` until `shutdown` resolves
pub async fn serve(
    listener: TcpListener,
    state: Arc<StatusState>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "Status endpoint listening");
    }

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}
