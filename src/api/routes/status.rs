//! Service status, dashboard and history endpoints

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::Utc;

use crate::api::{
    error::{ApiError, ApiResult},
    state::ApiState,
    types::{
        DEFAULT_HISTORY_LIMIT, DashboardResponse, HistoryQuery, HistoryResponse, PendingService,
        ServiceResponse, StatusResponse,
    },
};
use crate::status::StatusSummary;

/// GET /status
///
/// Overall verdict, per-status counts and the current health of every service
pub async fn get_status(State(state): State<ApiState>) -> Json<StatusResponse> {
    let services = state.monitor.services().await;
    let summary = StatusSummary::from_services(&services);

    Json(StatusResponse {
        status: summary.overall(),
        timestamp: Utc::now(),
        summary,
        services,
    })
}

/// GET /status/:service
///
/// Registered services without a completed check answer `pending`.
pub async fn get_service(
    State(state): State<ApiState>,
    Path(name): Path<String>,
) -> ApiResult<Json<ServiceResponse>> {
    let registry = state.monitor.registry();
    let Some(definition) = registry.get(&name) else {
        return Err(ApiError::unknown_service(&name, registry.names()));
    };

    let body = match state.monitor.service(&name).await {
        Some(health) => ServiceResponse::Checked(health),
        None => ServiceResponse::Pending(PendingService {
            name: definition.name.clone(),
            kind: definition.kind.clone(),
            status: "pending".to_string(),
        }),
    };

    Ok(Json(body))
}

/// GET /dashboard
pub async fn get_dashboard(State(state): State<ApiState>) -> Json<DashboardResponse> {
    let monitor = &state.monitor;
    let services = monitor.services().await;
    let summary = StatusSummary::from_services(&services);
    let containers = monitor.containers().collect().await;

    Json(DashboardResponse {
        status: summary.overall(),
        timestamp: Utc::now(),
        summary,
        services,
        uptime_percent: monitor.uptime_percent().await,
        containers: containers.as_ref().clone(),
        history_points: monitor.history_len().await,
    })
}

/// GET /history?limit=N
///
/// Most recent snapshots, oldest first
pub async fn get_history(
    State(state): State<ApiState>,
    Query(query): Query<HistoryQuery>,
) -> Json<HistoryResponse> {
    let limit = query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    let snapshots = state.monitor.history(limit).await;

    Json(HistoryResponse {
        count: snapshots.len(),
        uptime_percent: state.monitor.uptime_percent().await,
        snapshots,
    })
}
