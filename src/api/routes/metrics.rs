//! Prometheus scrape endpoints

use std::time::Duration;

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::api::{
    error::{ApiError, ApiResult},
    state::ApiState,
};
use crate::exporter::{CONTENT_TYPE, Exposition};

/// Timeout for fetching the upstream plug metrics
const RELAY_TIMEOUT: Duration = Duration::from_secs(5);

fn text_response(body: String) -> Response {
    ([(header::CONTENT_TYPE, CONTENT_TYPE)], body).into_response()
}

/// GET /metrics
///
/// Service and container families
pub async fn metrics(State(state): State<ApiState>) -> ApiResult<Response> {
    let services = state.monitor.services().await;
    let containers = state.monitor.containers().collect().await;

    let body = Exposition::new()
        .services(&services)?
        .containers(&containers)?
        .render()?;
    Ok(text_response(body))
}

/// GET /metrics/containers
pub async fn container_metrics(State(state): State<ApiState>) -> ApiResult<Response> {
    let containers = state.monitor.containers().collect().await;

    let body = Exposition::new().containers(&containers)?.render()?;
    Ok(text_response(body))
}

/// GET /metrics/plugs
///
/// Relays the plug operations exporter as-is
pub async fn plugs_metrics(State(state): State<ApiState>) -> ApiResult<Response> {
    let Some(url) = &state.plugs_metrics_url else {
        return Err(ApiError::Unavailable(
            "plug metrics upstream is not configured".to_string(),
        ));
    };

    let response = state
        .client
        .get(url)
        .timeout(RELAY_TIMEOUT)
        .send()
        .await
        .map_err(|e| {
            warn!("plug metrics upstream unreachable: {e}");
            ApiError::BadGateway(format!("plug metrics upstream unreachable: {e}"))
        })?;

    if !response.status().is_success() {
        warn!("plug metrics upstream returned {}", response.status());
        return Err(ApiError::BadGateway(format!(
            "plug metrics upstream returned {}",
            response.status()
        )));
    }

    let body = response
        .text()
        .await
        .map_err(|e| ApiError::BadGateway(format!("failed to read plug metrics: {e}")))?;
    Ok(text_response(body))
}
