//! AlertActor - Delivers webhook alerts in the background
//!
//! The health cycle never waits on alert delivery. Alerts are handed to this
//! actor through a bounded queue and POSTed one after another.
//!
//! ## Delivery contract
//!
//! Best-effort, no retry:
//! - a full queue drops the alert (logged)
//! - an unreachable webhook or a non-2xx answer is logged and discarded

use std::time::Duration;

use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, error, info, instrument, warn};

use super::messages::{AlertCommand, AlertPayload};

/// Capacity of the delivery queue
pub const ALERT_QUEUE_CAPACITY: usize = 32;

/// Timeout of a single webhook request
const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

pub struct AlertActor {
    webhook_url: String,

    /// HTTP client (reused across deliveries)
    client: reqwest::Client,

    command_rx: mpsc::Receiver<AlertCommand>,
}

impl AlertActor {
    pub fn new(webhook_url: String, command_rx: mpsc::Receiver<AlertCommand>) -> Self {
        Self {
            webhook_url,
            client: reqwest::Client::new(),
            command_rx,
        }
    }

    #[instrument(skip(self))]
    pub async fn run(mut self) {
        debug!("starting alert actor");

        while let Some(cmd) = self.command_rx.recv().await {
            match cmd {
                AlertCommand::Deliver(payload) => self.deliver(&payload).await,
                AlertCommand::Shutdown => {
                    debug!("received shutdown command");
                    break;
                }
            }
        }

        debug!("alert actor stopped");
    }

    #[instrument(skip(self, payload), fields(service = %payload.service))]
    async fn deliver(&self, payload: &AlertPayload) {
        let result = self
            .client
            .post(&self.webhook_url)
            .timeout(WEBHOOK_TIMEOUT)
            .json(payload)
            .send()
            .await;

        match result {
            Ok(response) => {
                if response.status().is_success() {
                    info!("Successfully sent webhook alert");
                } else {
                    error!("Webhook alert failed with status: {}", response.status());
                }
            }
            Err(e) => {
                error!("Failed to send webhook alert: {}", e);
            }
        }
    }
}

/// Handle for queueing alerts on the AlertActor
#[derive(Clone)]
pub struct AlertHandle {
    sender: mpsc::Sender<AlertCommand>,
}

impl AlertHandle {
    /// Spawn a new alert actor delivering to `webhook_url`
    pub fn spawn(webhook_url: String) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(ALERT_QUEUE_CAPACITY);

        let actor = AlertActor::new(webhook_url, cmd_rx);

        tokio::spawn(actor.run());

        Self { sender: cmd_tx }
    }

    /// Queue an alert without waiting
    ///
    /// Returns `false` when the alert was dropped.
    pub fn dispatch(&self, payload: AlertPayload) -> bool {
        match self.sender.try_send(AlertCommand::Deliver(payload)) {
            Ok(()) => true,
            Err(TrySendError::Full(AlertCommand::Deliver(payload))) => {
                warn!("alert queue full, dropping alert for {}", payload.service);
                false
            }
            Err(_) => {
                warn!("alert actor stopped, dropping alert");
                false
            }
        }
    }

    /// Whether the actor behind this handle has stopped
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Shut down the alert actor after the queued alerts
    pub async fn shutdown(&self) {
        let _ = self.sender.send(AlertCommand::Shutdown).await;
    }
}
