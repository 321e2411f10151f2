//! Container resource statistics
//!
//! - **runtime**: the `ContainerRuntime` seam and its raw sample types
//! - **docker**: bollard-backed runtime speaking to the local Docker socket
//! - **collector**: derived metrics, bounded fan-out and the TTL cache

pub mod collector;
pub mod docker;
pub mod runtime;

pub use collector::{ContainerCollector, ContainerNotFound};
pub use docker::DockerRuntime;
pub use runtime::{
    ContainerRuntime, CpuSample, RuntimeContainer, RuntimeError, RuntimeResult, RuntimeStats,
};
