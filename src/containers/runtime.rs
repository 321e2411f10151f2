//! Container runtime abstraction
//!
//! The collector only needs two calls from the runtime: list every container
//! (stopped ones included) and take one stats sample of a running container.
//! `DockerRuntime` implements them against the local Docker socket; tests
//! plug in fakes.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;

/// One entry of the container list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuntimeContainer {
    /// Full runtime ID
    pub id: String,

    /// Primary name, without the leading `/`
    pub name: String,

    pub image: String,

    /// Machine state (`running`, `exited`, ...)
    pub state: String,

    /// Human readable status (`Up 3 hours`, ...)
    pub status: String,
}

impl RuntimeContainer {
    pub fn is_running(&self) -> bool {
        self.state.eq_ignore_ascii_case("running")
    }
}

/// Cumulative CPU counters of one sample
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CpuSample {
    /// Container CPU time (ns)
    pub total_usage: u64,

    /// Host CPU time (ns)
    pub system_usage: u64,

    pub online_cpus: Option<u32>,

    /// Length of the per-CPU usage array, fallback for `online_cpus`
    pub percpu_count: usize,
}

/// Raw stats sample of a running container
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuntimeStats {
    pub cpu: CpuSample,

    /// Previous sample, as reported by the runtime alongside the current one
    pub precpu: CpuSample,

    pub memory_usage: u64,
    pub memory_limit: u64,

    /// cgroup memory breakdown (`cache`, `inactive_file`, ...)
    pub memory_stats: HashMap<String, u64>,

    /// (rx_bytes, tx_bytes) per interface
    pub networks: HashMap<String, (u64, u64)>,

    pub pids: u64,
}

/// Errors raised by a container runtime
#[derive(Debug)]
pub enum RuntimeError {
    /// The runtime socket could not be reached
    Unavailable(String),

    /// The runtime answered with an error
    Api(String),

    /// The call did not finish in time
    Timeout(String),
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeError::Unavailable(msg) => write!(f, "container runtime unavailable: {}", msg),
            RuntimeError::Api(msg) => write!(f, "container runtime error: {}", msg),
            RuntimeError::Timeout(msg) => write!(f, "container runtime call timed out: {}", msg),
        }
    }
}

impl std::error::Error for RuntimeError {}

pub type RuntimeResult<T> = Result<T, RuntimeError>;

#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// List all containers, including stopped ones
    async fn list_containers(&self) -> RuntimeResult<Vec<RuntimeContainer>>;

    /// Take a single, non-streaming stats sample of a container
    async fn container_stats(&self, id: &str) -> RuntimeResult<RuntimeStats>;
}
