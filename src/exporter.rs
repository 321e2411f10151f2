//! Prometheus text exposition of service health and container stats
//!
//! Every scrape builds a fresh [`Registry`], fills it from the current state
//! and encodes it. No metric outlives the scrape that produced it.

use prometheus::{Encoder, GaugeVec, Opts, Registry, TextEncoder};

use crate::{ContainerStats, ServiceHealth, ServiceStatus};

/// Content type of the text exposition format
pub const CONTENT_TYPE: &str = prometheus::TEXT_FORMAT;

const SERVICE_LABELS: &[&str] = &["service", "type"];
const CONTAINER_LABELS: &[&str] = &["container"];

/// One scrape worth of metric families
pub struct Exposition {
    registry: Registry,
}

impl Exposition {
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
        }
    }

    /// `aims_service_up` and `aims_service_response_time_ms`
    pub fn services(self, services: &[ServiceHealth]) -> prometheus::Result<Self> {
        let up = self.gauge_vec(
            "aims_service_up",
            "Whether the service answered its last health check (1 = up)",
            SERVICE_LABELS,
        )?;
        let response_time = self.gauge_vec(
            "aims_service_response_time_ms",
            "Duration of the last health check in milliseconds",
            SERVICE_LABELS,
        )?;

        for health in services {
            let labels = [health.name.as_str(), health.kind.as_str()];
            let is_up = if health.status == ServiceStatus::Up {
                1.0
            } else {
                0.0
            };
            up.with_label_values(&labels).set(is_up);
            response_time
                .with_label_values(&labels)
                .set(health.response_time_ms as f64);
        }

        Ok(self)
    }

    /// `aims_container_*` families, labelled by container name
    pub fn containers(self, containers: &[ContainerStats]) -> prometheus::Result<Self> {
        let cpu = self.gauge_vec(
            "aims_container_cpu_percent",
            "Container CPU usage in percent of one core",
            CONTAINER_LABELS,
        )?;
        let memory = self.gauge_vec(
            "aims_container_memory_mb",
            "Container memory usage without page cache in MB",
            CONTAINER_LABELS,
        )?;
        let memory_percent = self.gauge_vec(
            "aims_container_memory_percent",
            "Container memory usage in percent of its limit",
            CONTAINER_LABELS,
        )?;
        let pids = self.gauge_vec(
            "aims_container_pids",
            "Number of processes running in the container",
            CONTAINER_LABELS,
        )?;

        for container in containers {
            let label = if container.name.is_empty() {
                container.id.as_str()
            } else {
                container.name.as_str()
            };
            cpu.with_label_values(&[label]).set(container.cpu_percent);
            memory
                .with_label_values(&[label])
                .set(container.memory_usage_mb);
            memory_percent
                .with_label_values(&[label])
                .set(container.memory_percent);
            pids.with_label_values(&[label]).set(container.pids as f64);
        }

        Ok(self)
    }

    pub fn render(&self) -> prometheus::Result<String> {
        let mut buffer = vec![];
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }

    fn gauge_vec(&self, name: &str, help: &str, labels: &[&str]) -> prometheus::Result<GaugeVec> {
        let gauge = GaugeVec::new(Opts::new(name, help), labels)?;
        self.registry.register(Box::new(gauge.clone()))?;
        Ok(gauge)
    }
}

impl Default for Exposition {
    fn default() -> Self {
        Self::new()
    }
}
