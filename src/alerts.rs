use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::Mutex;
use tracing::{debug, instrument, trace};

use crate::actors::alert::AlertHandle;
use crate::actors::messages::AlertPayload;
use crate::{ServiceHealth, ServiceStatus};

/// Status changes that are worth an alert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    WentDown,
    Recovered,
}

impl Transition {
    /// Only `up → down` and `down → up` alert; `degraded` never does
    pub fn detect(previous: Option<ServiceStatus>, current: ServiceStatus) -> Option<Self> {
        match (previous, current) {
            (Some(ServiceStatus::Up), ServiceStatus::Down) => Some(Transition::WentDown),
            (Some(ServiceStatus::Down), ServiceStatus::Up) => Some(Transition::Recovered),
            _ => None,
        }
    }
}

/// Detects transitions between cycles and rate-limits the resulting alerts
pub struct AlertManager {
    /// Webhook target; `None` disables alerting
    webhook_url: Option<String>,

    /// Delivery worker, spawned on first use and again after a shutdown
    dispatcher: Mutex<Option<AlertHandle>>,

    cooldown: Duration,

    /// Time of the last alert sent per service
    last_alert: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl AlertManager {
    pub fn new(webhook_url: Option<String>, cooldown: Duration) -> Self {
        Self {
            webhook_url,
            dispatcher: Mutex::new(None),
            cooldown,
            last_alert: Mutex::new(HashMap::new()),
        }
    }

    /// The live delivery worker, respawned when the previous one stopped
    async fn dispatcher(&self) -> Option<AlertHandle> {
        let url = self.webhook_url.as_ref()?;
        let mut slot = self.dispatcher.lock().await;

        match slot.as_ref() {
            Some(handle) if !handle.is_closed() => Some(handle.clone()),
            _ => {
                debug!("spawning alert worker");
                let handle = AlertHandle::spawn(url.clone());
                *slot = Some(handle.clone());
                Some(handle)
            }
        }
    }

    /// Diff a cycle against the previous statuses and queue the alerts
    ///
    /// Returns the alerts that passed the cooldown gate.
    pub async fn process(
        &self,
        previous: &HashMap<String, ServiceStatus>,
        batch: &[ServiceHealth],
    ) -> Vec<AlertPayload> {
        self.process_at(previous, batch, Utc::now()).await
    }

    #[instrument(skip_all, fields(services = batch.len()))]
    pub async fn process_at(
        &self,
        previous: &HashMap<String, ServiceStatus>,
        batch: &[ServiceHealth],
        now: DateTime<Utc>,
    ) -> Vec<AlertPayload> {
        let Some(dispatcher) = self.dispatcher().await else {
            trace!("no webhook configured, skipping alerting");
            return vec![];
        };

        let cooldown = TimeDelta::from_std(self.cooldown).unwrap_or(TimeDelta::MAX);
        let mut sent = vec![];

        for health in batch {
            let Some(transition) =
                Transition::detect(previous.get(&health.name).copied(), health.status)
            else {
                continue;
            };

            {
                let mut last_alert = self.last_alert.lock().await;
                if let Some(last) = last_alert.get(&health.name)
                    && now - *last < cooldown
                {
                    debug!(
                        "{}: {transition:?} suppressed, last alert at {last}",
                        health.name
                    );
                    continue;
                }
                // recorded before delivery so overlapping cycles cannot double-fire
                last_alert.insert(health.name.clone(), now);
            }

            debug!("{}: {transition:?}, queueing alert", health.name);
            let payload = build_payload(health, transition, now);
            dispatcher.dispatch(payload.clone());
            sent.push(payload);
        }

        sent
    }

    pub async fn last_alert(&self, service: &str) -> Option<DateTime<Utc>> {
        self.last_alert.lock().await.get(service).copied()
    }

    /// Stop the delivery worker once its queue is drained
    ///
    /// The next alert spawns a fresh worker.
    pub async fn shutdown(&self) {
        let dispatcher = self.dispatcher.lock().await.take();
        if let Some(dispatcher) = dispatcher {
            dispatcher.shutdown().await;
        }
    }
}

pub fn build_payload(
    health: &ServiceHealth,
    transition: Transition,
    now: DateTime<Utc>,
) -> AlertPayload {
    let text = match transition {
        Transition::WentDown => match &health.error {
            Some(err) => format!(
                "🔴 **Service DOWN**: `{}` is down ({})",
                health.name, err
            ),
            None => format!("🔴 **Service DOWN**: `{}` is down", health.name),
        },
        Transition::Recovered => format!(
            "✅ **Service Recovered**: `{}` is back UP ({}ms)",
            health.name, health.response_time_ms
        ),
    };

    AlertPayload {
        text,
        service: health.name.clone(),
        status: health.status,
        response_time: health.response_time_ms,
        error: health.error.clone(),
        timestamp: now,
    }
}
