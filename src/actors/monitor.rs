//! MonitorActor - Drives the health cycle on a fixed interval
//!
//! ## Message Flow
//!
//! ```text
//! Timer tick → check_all → alert on transitions → append snapshot to history
//!     ↑
//!     └─── Commands (CheckNow, Shutdown)
//! ```
//!
//! Cycles run inside the actor loop, so they never overlap. The first tick
//! fires immediately, which makes the first cycle run at start.

use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, instrument, warn};

use super::messages::MonitorCommand;
use crate::HealthSnapshot;
use crate::monitor::Monitor;

pub struct MonitorActor {
    monitor: Monitor,

    /// Command receiver for control messages
    command_rx: mpsc::Receiver<MonitorCommand>,

    interval_duration: Duration,
}

impl MonitorActor {
    pub fn new(monitor: Monitor, command_rx: mpsc::Receiver<MonitorCommand>) -> Self {
        let interval_duration = monitor.check_interval();
        Self {
            monitor,
            command_rx,
            interval_duration,
        }
    }

    /// Run the actor's main loop
    ///
    /// This is the entry point for the actor. It runs until:
    /// - A Shutdown command is received
    /// - The command channel is closed
    #[instrument(skip(self), fields(interval = ?self.interval_duration))]
    pub async fn run(mut self) {
        debug!("starting monitor actor");

        let mut ticker = interval(self.interval_duration);
        // a slow cycle pushes the next one back instead of bursting
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.monitor.run_cycle().await;
                }

                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(MonitorCommand::CheckNow { respond_to }) => {
                            debug!("received CheckNow command");
                            let snapshot = self.monitor.run_cycle().await;
                            let _ = respond_to.send(snapshot);
                        }

                        Some(MonitorCommand::Shutdown) => {
                            debug!("received shutdown command");
                            break;
                        }

                        None => {
                            warn!("command channel closed, shutting down");
                            break;
                        }
                    }
                }
            }
        }

        self.monitor.alerts().shutdown().await;
        debug!("monitor actor stopped");
    }
}

/// Handle for controlling a running MonitorActor
///
/// It can be cloned and shared across tasks.
#[derive(Clone)]
pub struct MonitorHandle {
    sender: mpsc::Sender<MonitorCommand>,
}

impl MonitorHandle {
    /// Spawn the cycle actor for `monitor`
    pub fn spawn(monitor: Monitor) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);

        let actor = MonitorActor::new(monitor, cmd_rx);

        tokio::spawn(actor.run());

        Self { sender: cmd_tx }
    }

    /// Run a cycle immediately and wait for its snapshot
    ///
    /// Queued behind a cycle that is already in progress.
    pub async fn check_now(&self) -> Result<HealthSnapshot> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(MonitorCommand::CheckNow { respond_to: tx })
            .await
            .context("failed to send CheckNow command")?;

        rx.await.context("failed to receive response")
    }

    /// Gracefully shut down the monitor
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(MonitorCommand::Shutdown)
            .await
            .context("failed to send Shutdown command")?;
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        !self.sender.is_closed()
    }
}
