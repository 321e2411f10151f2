//! API shared state

use crate::monitor::Monitor;

/// Shared state passed to all API handlers
#[derive(Clone)]
pub struct ApiState {
    pub monitor: Monitor,

    /// HTTP client for relaying upstream metrics
    pub client: reqwest::Client,

    /// Upstream plug operations exporter, relayed on `/metrics/plugs`
    pub plugs_metrics_url: Option<String>,
}

impl ApiState {
    pub fn new(monitor: Monitor, plugs_metrics_url: Option<String>) -> Self {
        Self {
            monitor,
            client: reqwest::Client::new(),
            plugs_metrics_url,
        }
    }
}
