//! REST API and Prometheus exporter
//!
//! ## Architecture
//!
//! - **Axum** web framework with Tower middleware
//! - **Monitor** shared by every handler through [`ApiState`]
//! - open **CORS** for the dashboard, request tracing via `TraceLayer`
//!
//! ## Endpoints
//!
//! - `GET /health` - Liveness of the monitor itself
//! - `GET /status` - Overall status, summary and per-service health
//! - `GET /status/:service` - Health of one service
//! - `GET /dashboard` - Status, uptime, containers and history size
//! - `GET /history?limit=N` - Recent cycle snapshots
//! - `GET /containers/stats` - Stats of every container
//! - `GET /containers/:id/stats` - Stats of one container (id prefix or name)
//! - `GET /metrics` - Prometheus text, services and containers
//! - `GET /metrics/containers` - Prometheus text, containers only
//! - `GET /metrics/plugs` - Relay of the plug operations exporter

pub mod error;
pub mod routes;
pub mod state;
pub mod types;

pub use error::{ApiError, ApiResult};
pub use state::ApiState;
pub use types::{
    ContainersResponse, DashboardResponse, HealthResponse, HistoryResponse, PendingService,
    ServiceResponse, StatusResponse,
};

use std::net::SocketAddr;

use anyhow::Context;
use axum::{Router, routing::get};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,

    /// Enable CORS for dashboard
    pub enable_cors: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], crate::util::get_default_port())),
            enable_cors: true,
        }
    }
}

/// Build the router with every endpoint
pub fn router(config: &ApiConfig, state: ApiState) -> Router {
    let mut app = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/status", get(routes::status::get_status))
        .route("/status/:service", get(routes::status::get_service))
        .route("/dashboard", get(routes::status::get_dashboard))
        .route("/history", get(routes::status::get_history))
        .route(
            "/containers/stats",
            get(routes::containers::list_container_stats),
        )
        .route(
            "/containers/:id/stats",
            get(routes::containers::get_container_stats),
        )
        .route("/metrics", get(routes::metrics::metrics))
        .route(
            "/metrics/containers",
            get(routes::metrics::container_metrics),
        )
        .route("/metrics/plugs", get(routes::metrics::plugs_metrics))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if config.enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app = app.layer(cors);
    }

    app
}

/// Spawn the API server
///
/// This starts an Axum HTTP server in a background task.
/// Returns the server's local address.
pub async fn spawn_api_server(config: ApiConfig, state: ApiState) -> anyhow::Result<SocketAddr> {
    info!("starting API server on {}", config.bind_addr);

    let app = router(&config, state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    let addr = listener.local_addr()?;

    info!("API server listening on {}", addr);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("API server error: {}", e);
        }
    });

    Ok(addr)
}
