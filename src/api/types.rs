//! API response types
//!
//! Field names are camelCase on the wire, matching the dashboard client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::status::{OverallStatus, StatusSummary};
use crate::{ContainerStats, HealthSnapshot, ServiceHealth};

/// Default number of snapshots returned by `/history`
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

/// Overall status with per-service health
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub status: OverallStatus,
    pub timestamp: DateTime<Utc>,
    pub summary: StatusSummary,
    pub services: Vec<ServiceHealth>,
}

/// Everything the dashboard renders in one request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub status: OverallStatus,
    pub timestamp: DateTime<Utc>,
    pub summary: StatusSummary,
    pub services: Vec<ServiceHealth>,
    pub uptime_percent: f64,
    pub containers: Vec<ContainerStats>,
    pub history_points: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponse {
    pub count: usize,
    pub uptime_percent: f64,
    pub snapshots: Vec<HealthSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainersResponse {
    pub count: usize,
    pub timestamp: DateTime<Utc>,
    pub containers: Vec<ContainerStats>,
}

/// A registered service that has not been checked yet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingService {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// Always `pending`
    pub status: String,
}

/// Body of `/status/:service`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServiceResponse {
    Checked(ServiceHealth),
    Pending(PendingService),
}

/// Query parameters for `/history`
#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}
