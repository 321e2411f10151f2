//! The `Monitor` owns every piece of monitoring state
//!
//! Cloning a `Monitor` is cheap and every clone shares the same state, so the
//! cycle actor and the HTTP layer work on one instance.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use crate::alerts::AlertManager;
use crate::config::{MonitorConfig, ServiceRegistry};
use crate::containers::{ContainerCollector, ContainerRuntime};
use crate::monitors::{HealthChecker, health::cycle_deadline};
use crate::status::StatusSummary;
use crate::storage::{HealthStore, HistoryBuffer};
use crate::{HealthSnapshot, ServiceHealth};

pub use crate::actors::monitor::MonitorHandle;

#[derive(Clone)]
pub struct Monitor {
    registry: Arc<ServiceRegistry>,
    checker: Arc<HealthChecker>,
    store: Arc<HealthStore>,
    history: Arc<RwLock<HistoryBuffer>>,
    alerts: Arc<AlertManager>,
    containers: Arc<ContainerCollector>,
    check_interval: Duration,
}

impl Monitor {
    /// Build a monitor from its configuration
    pub fn new(
        config: &MonitorConfig,
        registry: ServiceRegistry,
        runtime: Arc<dyn ContainerRuntime>,
    ) -> Self {
        let deadline = cycle_deadline(&registry);
        if deadline >= config.check_interval {
            warn!(
                "probe timeout {deadline:?} exceeds the check interval {:?}, cycles will run back to back",
                config.check_interval
            );
        }

        let registry = Arc::new(registry);
        let store = Arc::new(HealthStore::new());

        Self {
            checker: Arc::new(HealthChecker::new(registry.clone(), store.clone())),
            registry,
            store,
            history: Arc::new(RwLock::new(HistoryBuffer::new(config.history_capacity()))),
            alerts: Arc::new(AlertManager::new(config.webhook_url.clone(), config.alert_cooldown)),
            containers: Arc::new(ContainerCollector::new(
                runtime,
                config.container_stats_ttl,
            )),
            check_interval: config.check_interval,
        }
    }

    /// Spawn the cycle actor; the first cycle runs right away
    pub fn start(&self) -> MonitorHandle {
        MonitorHandle::spawn(self.clone())
    }

    /// One full cycle: probe, alert on transitions, record the snapshot
    #[instrument(skip(self))]
    pub async fn run_cycle(&self) -> HealthSnapshot {
        let previous = self.store.statuses().await;
        let results = self.checker.check_all().await;

        let alerts = self.alerts.process(&previous, &results).await;
        if !alerts.is_empty() {
            debug!("{} alerts queued", alerts.len());
        }

        let snapshot = HealthSnapshot::new(results);
        self.history.write().await.append(snapshot.clone());
        snapshot
    }

    pub fn registry(&self) -> &ServiceRegistry {
        &self.registry
    }

    pub fn check_interval(&self) -> Duration {
        self.check_interval
    }

    pub fn alerts(&self) -> &AlertManager {
        &self.alerts
    }

    pub fn containers(&self) -> &ContainerCollector {
        &self.containers
    }

    /// Current health of every service, sorted by name
    ///
    /// Services that were never checked are absent.
    pub async fn services(&self) -> Vec<ServiceHealth> {
        self.store.all().await
    }

    pub async fn service(&self, name: &str) -> Option<ServiceHealth> {
        self.store.get(name).await
    }

    pub async fn summary(&self) -> StatusSummary {
        StatusSummary::from_services(&self.services().await)
    }

    /// Up to `limit` recent snapshots, oldest first
    pub async fn history(&self, limit: usize) -> Vec<HealthSnapshot> {
        self.history.read().await.recent(limit)
    }

    pub async fn history_len(&self) -> usize {
        self.history.read().await.len()
    }

    pub async fn uptime_percent(&self) -> f64 {
        self.history.read().await.uptime_percent()
    }
}
