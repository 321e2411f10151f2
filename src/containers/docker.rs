//! Docker runtime using bollard
//!
//! Talks to the Docker Engine API over the local Unix socket:
//! `GET /containers/json?all=true` and `GET /containers/{id}/stats?stream=false`.

use std::path::Path;

use async_trait::async_trait;
use bollard::Docker;
use bollard::models::{ContainerCpuStats, ContainerStatsResponse, ContainerSummary};
use bollard::query_parameters::{
    ListContainersOptions, ListContainersOptionsBuilder, StatsOptions, StatsOptionsBuilder,
};
use futures::StreamExt;
use tracing::trace;

use super::runtime::{
    ContainerRuntime, CpuSample, RuntimeContainer, RuntimeError, RuntimeResult, RuntimeStats,
};

/// Request timeout handed to bollard, in seconds
const SOCKET_TIMEOUT_SECS: u64 = 10;

pub struct DockerRuntime {
    docker: Docker,
}

impl DockerRuntime {
    /// Prepare a client for the socket at `path`; no connection is made yet
    pub fn connect(path: &Path) -> RuntimeResult<Self> {
        let socket = path.to_string_lossy();
        let docker =
            Docker::connect_with_socket(&socket, SOCKET_TIMEOUT_SECS, bollard::API_DEFAULT_VERSION)
                .map_err(RuntimeError::from)?;
        Ok(Self { docker })
    }
}

impl From<bollard::errors::Error> for RuntimeError {
    fn from(err: bollard::errors::Error) -> Self {
        match err {
            bollard::errors::Error::DockerResponseServerError {
                status_code,
                message,
            } => RuntimeError::Api(format!("{status_code}: {message}")),
            other => RuntimeError::Unavailable(other.to_string()),
        }
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn list_containers(&self) -> RuntimeResult<Vec<RuntimeContainer>> {
        let options: ListContainersOptions = ListContainersOptionsBuilder::new().all(true).build();
        let containers = self.docker.list_containers(Some(options)).await?;
        trace!("runtime listed {} containers", containers.len());
        Ok(containers.into_iter().map(map_summary).collect())
    }

    async fn container_stats(&self, id: &str) -> RuntimeResult<RuntimeStats> {
        let options: StatsOptions = StatsOptionsBuilder::new().stream(false).build();
        let mut stream = Box::pin(self.docker.stats(id, Some(options)));

        match stream.next().await {
            Some(sample) => Ok(map_stats(sample?)),
            None => Err(RuntimeError::Api(format!("no stats sample returned for {id}"))),
        }
    }
}

fn map_summary(summary: ContainerSummary) -> RuntimeContainer {
    let name = summary
        .names
        .as_ref()
        .and_then(|names| names.first())
        .map(|name| name.trim_start_matches('/').to_string())
        .unwrap_or_default();

    RuntimeContainer {
        id: summary.id.unwrap_or_default(),
        name,
        image: summary.image.unwrap_or_default(),
        state: summary.state.map(|s| s.to_string()).unwrap_or_default(),
        status: summary.status.unwrap_or_default(),
    }
}

fn map_cpu(stats: Option<ContainerCpuStats>) -> CpuSample {
    let Some(stats) = stats else {
        return CpuSample::default();
    };

    let (total_usage, percpu_count) = stats
        .cpu_usage
        .map(|usage| {
            (
                usage.total_usage.unwrap_or_default(),
                usage.percpu_usage.map(|p| p.len()).unwrap_or_default(),
            )
        })
        .unwrap_or_default();

    CpuSample {
        total_usage,
        system_usage: stats.system_cpu_usage.unwrap_or_default(),
        online_cpus: stats.online_cpus,
        percpu_count,
    }
}

fn map_stats(sample: ContainerStatsResponse) -> RuntimeStats {
    let (memory_usage, memory_limit, memory_stats) = sample
        .memory_stats
        .map(|memory| {
            (
                memory.usage.unwrap_or_default(),
                memory.limit.unwrap_or_default(),
                memory.stats.unwrap_or_default(),
            )
        })
        .unwrap_or_default();

    let networks = sample
        .networks
        .unwrap_or_default()
        .into_iter()
        .map(|(interface, net)| {
            (
                interface,
                (net.rx_bytes.unwrap_or_default(), net.tx_bytes.unwrap_or_default()),
            )
        })
        .collect();

    RuntimeStats {
        cpu: map_cpu(sample.cpu_stats),
        precpu: map_cpu(sample.precpu_stats),
        memory_usage,
        memory_limit,
        memory_stats,
        networks,
        pids: sample
            .pids_stats
            .and_then(|pids| pids.current)
            .unwrap_or_default(),
    }
}
