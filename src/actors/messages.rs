//! Message types for actor communication
//!
//! 1. **Commands**: Request/response messages sent to specific actors via mpsc
//! 2. **Payloads**: Data handed to the alert worker for delivery

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::{HealthSnapshot, ServiceStatus};

/// Commands that can be sent to the MonitorActor
#[derive(Debug)]
pub enum MonitorCommand {
    /// Run a cycle immediately (bypassing the interval timer)
    ///
    /// Used for testing and manual refresh operations.
    CheckNow {
        respond_to: oneshot::Sender<HealthSnapshot>,
    },

    /// Gracefully shut down the monitor
    ///
    /// A cycle in progress is finished before the actor exits.
    Shutdown,
}

/// Body of an outbound webhook alert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertPayload {
    /// Human readable message
    pub text: String,
    pub service: String,
    pub status: ServiceStatus,
    pub response_time: u64,
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Commands that can be sent to the AlertActor
#[derive(Debug)]
pub enum AlertCommand {
    /// Deliver one alert to the webhook (best-effort, no retry)
    Deliver(AlertPayload),

    /// Gracefully shut down the alert actor
    ///
    /// Alerts queued before this command are still delivered.
    Shutdown,
}
