pub mod actors;
pub mod alerts;
pub mod config;
pub mod containers;
pub mod monitor;
pub mod monitors;
pub mod status;
pub mod storage;
pub mod util;

#[cfg(feature = "api")]
pub mod api;
#[cfg(feature = "api")]
pub mod exporter;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use monitor::{Monitor, MonitorHandle};

/// Health classification of a single probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Up,
    Degraded,
    Down,
}

impl ServiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceStatus::Up => "up",
            ServiceStatus::Degraded => "degraded",
            ServiceStatus::Down => "down",
        }
    }
}

impl std::fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of probing one service in one cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceHealth {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub status: ServiceStatus,
    pub response_time_ms: u64,
    pub last_check_timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Recorded outcome of one full cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthSnapshot {
    pub timestamp: DateTime<Utc>,
    pub services: Vec<ServiceHealth>,
}

impl HealthSnapshot {
    pub fn new(services: Vec<ServiceHealth>) -> Self {
        Self {
            timestamp: Utc::now(),
            services,
        }
    }

    /// Whether every service in this snapshot was up
    pub fn all_up(&self) -> bool {
        self.services.iter().all(|s| s.status == ServiceStatus::Up)
    }
}

/// Resource usage of one container, derived from a runtime stats sample
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerStats {
    pub id: String,
    pub name: String,
    pub status: String,
    pub state: String,
    pub image: String,
    pub cpu_percent: f64,
    pub memory_usage_mb: f64,
    pub memory_limit_mb: f64,
    pub memory_percent: f64,
    pub network_rx_mb: f64,
    pub network_tx_mb: f64,
    pub pids: u64,
}
