//! ContainerCollector - Per-container resource stats with a TTL cache
//!
//! ## Collection pass
//!
//! ```text
//! list_containers(all) ─→ running?  ─yes→ stats sample (≤5 in flight per batch)
//!                                   ─no──→ zero-valued record
//! ```
//!
//! A pass is cached for a TTL. Callers inside the TTL share the cached array;
//! concurrent callers are serialized on the cache lock so only one of them
//! hits the runtime. When a pass fails, the previous array is served instead.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, error, instrument, trace, warn};

use super::runtime::{ContainerRuntime, CpuSample, RuntimeContainer, RuntimeError, RuntimeStats};
use crate::ContainerStats;
use crate::util::{bytes_to_mb, round2};

/// Maximum number of stats calls in flight at once
pub const STATS_CONCURRENCY: usize = 5;

/// Per-call timeout for runtime requests
pub const RUNTIME_CALL_TIMEOUT: Duration = Duration::from_secs(5);

const SHORT_ID_LEN: usize = 12;

#[derive(Debug, Default)]
struct StatsCache {
    stats: Arc<Vec<ContainerStats>>,
    refreshed_at: Option<Instant>,
}

/// Error returned when a container lookup matches nothing
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerNotFound {
    pub key: String,

    /// Ids and names that would have matched
    pub available: Vec<String>,
}

pub struct ContainerCollector {
    runtime: Arc<dyn ContainerRuntime>,
    ttl: Duration,
    cache: Mutex<StatsCache>,
}

impl ContainerCollector {
    pub fn new(runtime: Arc<dyn ContainerRuntime>, ttl: Duration) -> Self {
        Self {
            runtime,
            ttl,
            cache: Mutex::new(StatsCache::default()),
        }
    }

    /// Cached stats of every container, refreshed once the TTL has expired
    pub async fn collect(&self) -> Arc<Vec<ContainerStats>> {
        let mut cache = self.cache.lock().await;

        if let Some(refreshed_at) = cache.refreshed_at
            && refreshed_at.elapsed() < self.ttl
        {
            trace!("serving cached container stats");
            return cache.stats.clone();
        }

        self.refresh_locked(&mut cache).await
    }

    /// Collect immediately, ignoring the TTL
    pub async fn force_refresh(&self) -> Arc<Vec<ContainerStats>> {
        let mut cache = self.cache.lock().await;
        self.refresh_locked(&mut cache).await
    }

    /// Look up one container by id (prefix) or name
    pub async fn get(&self, key: &str) -> Result<ContainerStats, ContainerNotFound> {
        let stats = self.collect().await;
        let key = key.trim_start_matches('/');

        // exact id, then exact name, then id prefix
        let exact_id = |c: &&ContainerStats| {
            // full 64-char ids are longer than the stored short id
            !c.id.is_empty() && (c.id == key || key.starts_with(c.id.as_str()))
        };
        let id_prefix = |c: &&ContainerStats| !key.is_empty() && c.id.starts_with(key);

        stats
            .iter()
            .find(exact_id)
            .or_else(|| stats.iter().find(|c| c.name == key))
            .or_else(|| stats.iter().find(id_prefix))
            .cloned()
            .ok_or_else(|| ContainerNotFound {
                key: key.to_string(),
                available: stats
                    .iter()
                    .flat_map(|c| [c.id.clone(), c.name.clone()])
                    .collect(),
            })
    }

    async fn refresh_locked(&self, cache: &mut StatsCache) -> Arc<Vec<ContainerStats>> {
        match self.collect_pass().await {
            Ok(stats) => {
                cache.stats = Arc::new(stats);
                cache.refreshed_at = Some(Instant::now());
            }
            Err(e) => {
                error!("container stats collection failed, serving previous data: {e}");
            }
        }
        cache.stats.clone()
    }

    /// One full pass against the runtime
    #[instrument(skip(self))]
    async fn collect_pass(&self) -> Result<Vec<ContainerStats>, RuntimeError> {
        let containers = with_timeout("list containers", self.runtime.list_containers()).await?;
        let running = containers.iter().filter(|c| c.is_running()).count();
        debug!(
            "collecting stats for {} containers ({running} running)",
            containers.len()
        );

        let mut results = Vec::with_capacity(containers.len());
        for batch in containers.chunks(STATS_CONCURRENCY) {
            let batch_stats = join_all(batch.iter().map(|c| self.container_stats(c))).await;
            results.extend(batch_stats);
        }

        Ok(results)
    }

    async fn container_stats(&self, container: &RuntimeContainer) -> ContainerStats {
        if !container.is_running() {
            return stopped_record(container);
        }

        let call = format!("stats {}", container.name);
        match with_timeout(&call, self.runtime.container_stats(&container.id)).await {
            Ok(sample) => derive_stats(container, &sample),
            Err(e) => {
                warn!("no stats for {}: {e}", container.name);
                stopped_record(container)
            }
        }
    }
}

async fn with_timeout<T>(
    call: &str,
    future: impl Future<Output = Result<T, RuntimeError>>,
) -> Result<T, RuntimeError> {
    tokio::time::timeout(RUNTIME_CALL_TIMEOUT, future)
        .await
        .map_err(|_| RuntimeError::Timeout(call.to_string()))?
}

fn short_id(id: &str) -> String {
    id.chars().take(SHORT_ID_LEN).collect()
}

/// Identity-only record for containers without a stats sample
fn stopped_record(container: &RuntimeContainer) -> ContainerStats {
    ContainerStats {
        id: short_id(&container.id),
        name: container.name.clone(),
        status: container.status.clone(),
        state: container.state.clone(),
        image: container.image.clone(),
        ..ContainerStats::default()
    }
}

pub fn derive_stats(container: &RuntimeContainer, sample: &RuntimeStats) -> ContainerStats {
    let memory_used = memory_used_bytes(sample);
    let (rx, tx) = sample
        .networks
        .values()
        .fold((0u64, 0u64), |(rx, tx), (r, t)| {
            (rx.saturating_add(*r), tx.saturating_add(*t))
        });

    ContainerStats {
        cpu_percent: round2(cpu_percent(&sample.cpu, &sample.precpu)),
        memory_usage_mb: round2(bytes_to_mb(memory_used)),
        memory_limit_mb: round2(bytes_to_mb(sample.memory_limit)),
        memory_percent: round2(memory_percent(memory_used, sample.memory_limit)),
        network_rx_mb: round2(bytes_to_mb(rx)),
        network_tx_mb: round2(bytes_to_mb(tx)),
        pids: sample.pids,
        ..stopped_record(container)
    }
}

/// `(cpuDelta / systemDelta) * onlineCpus * 100`, 0 when either delta is not positive
pub fn cpu_percent(current: &CpuSample, previous: &CpuSample) -> f64 {
    let cpu_delta = current.total_usage as f64 - previous.total_usage as f64;
    let system_delta = current.system_usage as f64 - previous.system_usage as f64;

    if system_delta <= 0.0 || cpu_delta <= 0.0 {
        return 0.0;
    }

    let online_cpus = match current.online_cpus {
        Some(n) if n > 0 => n as f64,
        _ if current.percpu_count > 0 => current.percpu_count as f64,
        _ => 1.0,
    };

    cpu_delta / system_delta * online_cpus * 100.0
}

/// Usage minus reclaimable page cache
pub fn memory_used_bytes(sample: &RuntimeStats) -> u64 {
    let cache = sample
        .memory_stats
        .get("cache")
        .or_else(|| sample.memory_stats.get("inactive_file"))
        .copied()
        .unwrap_or_default();
    sample.memory_usage.saturating_sub(cache)
}

pub fn memory_percent(used: u64, limit: u64) -> f64 {
    if limit == 0 {
        return 0.0;
    }
    used as f64 / limit as f64 * 100.0
}
