//! Container stats endpoints

use axum::{
    Json,
    extract::{Path, State},
};
use chrono::Utc;

use crate::ContainerStats;
use crate::api::{error::ApiResult, state::ApiState, types::ContainersResponse};

/// GET /containers/stats
///
/// Served from the collector cache while it is fresh
pub async fn list_container_stats(State(state): State<ApiState>) -> Json<ContainersResponse> {
    let containers = state.monitor.containers().collect().await;

    Json(ContainersResponse {
        count: containers.len(),
        timestamp: Utc::now(),
        containers: containers.as_ref().clone(),
    })
}

/// GET /containers/:id/stats
///
/// `id` may be a (short or full) container id prefix or a container name.
pub async fn get_container_stats(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ContainerStats>> {
    let stats = state.monitor.containers().get(&id).await?;
    Ok(Json(stats))
}
