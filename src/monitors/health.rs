//! HealthChecker - Probes every registered service once per cycle
//!
//! ## Probe strategies
//!
//! - **Http**: GET `<url><path>`, 2xx is `up`, any other status `degraded`
//! - **RedisPing**: RESP `PING` over TCP, any reply is `up`
//!
//! Every probe runs under its own timeout. A timeout, connection error or any
//! other transport failure is reported as `down` with the error message.
//!
//! ## Fan-out
//!
//! ```text
//! check_all ─┬─ probe(a) ──┐
//!            ├─ probe(b) ──┼─→ HealthStore (overwritten as each result arrives)
//!            └─ probe(n) ──┘
//! ```
//!
//! All probes run concurrently, so a cycle takes as long as its slowest probe.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow, bail};
use chrono::Utc;
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::{debug, instrument, trace, warn};

use crate::config::{HealthCheckStrategy, ServiceDefinition, ServiceRegistry};
use crate::storage::HealthStore;
use crate::{ServiceHealth, ServiceStatus};

const DEFAULT_REDIS_PORT: u16 = 6379;

/// Status and optional error of a probe that reached its target
type ProbeOutcome = (ServiceStatus, Option<String>);

/// Issues liveness probes for the services of a registry
pub struct HealthChecker {
    registry: Arc<ServiceRegistry>,
    store: Arc<HealthStore>,

    /// HTTP client (reused across probes)
    client: reqwest::Client,
}

impl HealthChecker {
    pub fn new(registry: Arc<ServiceRegistry>, store: Arc<HealthStore>) -> Self {
        Self {
            registry,
            store,
            client: reqwest::Client::new(),
        }
    }

    /// Probe every registered service concurrently
    ///
    /// The store entry of each service is overwritten as soon as its probe
    /// resolves. Results are returned in registry order.
    #[instrument(skip(self), fields(services = self.registry.len()))]
    pub async fn check_all(&self) -> Vec<ServiceHealth> {
        let mut pending: FuturesUnordered<_> = self
            .registry
            .iter()
            .enumerate()
            .map(|(index, service)| async move { (index, self.check_one(service).await) })
            .collect();

        let mut results = Vec::with_capacity(self.registry.len());
        while let Some((index, health)) = pending.next().await {
            self.store.update(health.clone()).await;
            results.push((index, health));
        }

        results.sort_by_key(|(index, _)| *index);
        let results: Vec<_> = results.into_iter().map(|(_, health)| health).collect();

        debug!(
            "cycle finished: {} up, {} not up",
            results
                .iter()
                .filter(|h| h.status == ServiceStatus::Up)
                .count(),
            results
                .iter()
                .filter(|h| h.status != ServiceStatus::Up)
                .count()
        );

        results
    }

    /// Probe a single service
    #[instrument(skip(self, service), fields(service = %service.name))]
    pub async fn check_one(&self, service: &ServiceDefinition) -> ServiceHealth {
        trace!("probing {}", service.probe_url());

        let start = Instant::now();
        let outcome = tokio::time::timeout(service.timeout, self.probe(service)).await;
        let response_time_ms = start.elapsed().as_millis() as u64;

        let (status, error) = match outcome {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => {
                warn!("probe failed: {:#}", e);
                (ServiceStatus::Down, Some(format!("{:#}", e)))
            }
            Err(_) => {
                warn!("probe timed out after {:?}", service.timeout);
                (
                    ServiceStatus::Down,
                    Some(format!("timed out after {}ms", service.timeout.as_millis())),
                )
            }
        };

        ServiceHealth {
            name: service.name.clone(),
            kind: service.kind.clone(),
            status,
            response_time_ms,
            last_check_timestamp: Utc::now(),
            error,
        }
    }

    async fn probe(&self, service: &ServiceDefinition) -> Result<ProbeOutcome> {
        match &service.strategy {
            HealthCheckStrategy::Http { .. } => self.probe_http(service).await,
            HealthCheckStrategy::RedisPing => redis_ping(service).await,
        }
    }

    async fn probe_http(&self, service: &ServiceDefinition) -> Result<ProbeOutcome> {
        let response = self
            .client
            .get(service.probe_url())
            .timeout(service.timeout)
            .send()
            .await
            .context("HTTP request failed")?;

        let status_code = response.status();
        if status_code.is_success() {
            Ok((ServiceStatus::Up, None))
        } else {
            Ok((
                ServiceStatus::Degraded,
                Some(format!("unexpected status code: {}", status_code.as_u16())),
            ))
        }
    }
}

/// Send a RESP `PING` and wait for any reply line
///
/// An error reply (e.g. `-NOAUTH`) still proves the broker is alive.
async fn redis_ping(service: &ServiceDefinition) -> Result<ProbeOutcome> {
    let host = service
        .url
        .host_str()
        .ok_or_else(|| anyhow!("missing host in {}", service.url))?;
    let port = service.url.port().unwrap_or(DEFAULT_REDIS_PORT);

    let mut stream = TcpStream::connect((host, port))
        .await
        .with_context(|| format!("failed to connect to {host}:{port}"))?;

    stream
        .write_all(b"*1\r\n$4\r\nPING\r\n")
        .await
        .context("failed to send PING")?;

    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    let read = reader
        .read_line(&mut line)
        .await
        .context("failed to read PING reply")?;

    if read == 0 {
        bail!("connection closed before PING reply");
    }

    trace!("PING reply: {}", line.trim_end());
    Ok((ServiceStatus::Up, None))
}

/// Upper bound of a full cycle for the given registry
pub fn cycle_deadline(registry: &ServiceRegistry) -> Duration {
    registry
        .iter()
        .map(|s| s.timeout)
        .max()
        .unwrap_or_default()
}
