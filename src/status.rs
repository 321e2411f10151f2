//! Aggregation of current service health into an overall verdict

use serde::{Deserialize, Serialize};

use crate::{ServiceHealth, ServiceStatus};

/// Fleet-wide health verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallStatus {
    /// Every service is up
    Healthy,
    /// Some, but not all, services are up
    Degraded,
    /// No service is up
    Down,
}

impl std::fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OverallStatus::Healthy => write!(f, "healthy"),
            OverallStatus::Degraded => write!(f, "degraded"),
            OverallStatus::Down => write!(f, "down"),
        }
    }
}

/// Live counts per status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSummary {
    pub total: usize,
    pub up: usize,
    pub degraded: usize,
    pub down: usize,
}

impl StatusSummary {
    pub fn from_services(services: &[ServiceHealth]) -> Self {
        services
            .iter()
            .fold(StatusSummary::default(), |mut summary, health| {
                summary.total += 1;
                match health.status {
                    ServiceStatus::Up => summary.up += 1,
                    ServiceStatus::Degraded => summary.degraded += 1,
                    ServiceStatus::Down => summary.down += 1,
                }
                summary
            })
    }

    /// An empty fleet counts as healthy
    pub fn overall(&self) -> OverallStatus {
        if self.up == self.total {
            OverallStatus::Healthy
        } else if self.up == 0 {
            OverallStatus::Down
        } else {
            OverallStatus::Degraded
        }
    }
}
