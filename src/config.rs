use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use reqwest::Url;
use tracing::{trace, warn};

use crate::util::{env_or, env_string, get_addr, get_port};

/// Default probe timeout for HTTP checks
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(5);

/// Default probe timeout for protocol-level checks
pub const DEFAULT_PING_TIMEOUT: Duration = Duration::from_secs(3);

const DEFAULT_HEALTH_PATH: &str = "/health";

const DAY_SECS: u64 = 24 * 60 * 60;

/// Errors raised while loading configuration at startup
#[derive(Debug)]
pub enum ConfigError {
    /// Services file could not be read
    Io(std::io::Error),

    /// Service table is not valid JSON
    InvalidServices(String),

    /// A service URL could not be parsed
    InvalidUrl { service: String, reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "failed to read services file: {}", err),
            ConfigError::InvalidServices(msg) => write!(f, "invalid service table: {}", msg),
            ConfigError::InvalidUrl { service, reason } => {
                write!(f, "invalid url for service '{}': {}", service, reason)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err)
    }
}

/// Which kind of probe a service entry asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    Http,
    RedisPing,
}

/// One entry of the service table as written in configuration
#[derive(Debug, Clone, serde::Deserialize)]
pub struct ServiceConfig {
    pub name: String,

    /// Classification tag (core, tool, infra, agent, ...)
    #[serde(rename = "type", default = "default_kind")]
    pub kind: String,

    pub url: String,

    /// Probe kind; inferred from the URL scheme when absent
    pub check: Option<CheckKind>,

    /// Health path for HTTP checks (defaults to `/health`)
    pub health_path: Option<String>,

    /// Probe timeout override in seconds
    pub timeout_secs: Option<u64>,
}

fn default_kind() -> String {
    String::from("core")
}

/// How a registered service is probed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthCheckStrategy {
    /// GET `<base url><path>`, 2xx means up
    Http { path: String },

    /// RESP `PING` over a raw TCP connection
    RedisPing,
}

/// A service after validation, ready to be probed
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceDefinition {
    pub name: String,
    pub kind: String,
    pub url: Url,
    pub strategy: HealthCheckStrategy,
    pub timeout: Duration,
}

impl ServiceDefinition {
    pub fn http(name: &str, kind: &str, url: &str) -> Result<Self, ConfigError> {
        ServiceConfig {
            name: name.to_string(),
            kind: kind.to_string(),
            url: url.to_string(),
            check: Some(CheckKind::Http),
            health_path: None,
            timeout_secs: None,
        }
        .resolve()
    }

    /// Full URL the HTTP strategy requests
    pub fn probe_url(&self) -> String {
        match &self.strategy {
            HealthCheckStrategy::Http { path } => {
                format!("{}{}", self.url.as_str().trim_end_matches('/'), path)
            }
            HealthCheckStrategy::RedisPing => self.url.to_string(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl ServiceConfig {
    pub fn resolve(self) -> Result<ServiceDefinition, ConfigError> {
        let url = Url::parse(&self.url).map_err(|e| ConfigError::InvalidUrl {
            service: self.name.clone(),
            reason: e.to_string(),
        })?;

        let check = self.check.unwrap_or(match url.scheme() {
            "redis" | "rediss" => CheckKind::RedisPing,
            _ => CheckKind::Http,
        });

        let (strategy, default_timeout) = match check {
            CheckKind::Http => {
                let path = self
                    .health_path
                    .unwrap_or_else(|| DEFAULT_HEALTH_PATH.to_string());
                let path = if path.starts_with('/') {
                    path
                } else {
                    format!("/{path}")
                };
                (HealthCheckStrategy::Http { path }, DEFAULT_HTTP_TIMEOUT)
            }
            CheckKind::RedisPing => {
                if url.scheme() == "rediss" {
                    return Err(ConfigError::InvalidUrl {
                        service: self.name,
                        reason: "the ping check speaks plaintext RESP, rediss is not supported"
                            .to_string(),
                    });
                }
                if url.host_str().is_none() {
                    return Err(ConfigError::InvalidUrl {
                        service: self.name,
                        reason: "missing host".to_string(),
                    });
                }
                (HealthCheckStrategy::RedisPing, DEFAULT_PING_TIMEOUT)
            }
        };

        Ok(ServiceDefinition {
            name: self.name,
            kind: self.kind,
            url,
            strategy,
            timeout: self
                .timeout_secs
                .map_or(default_timeout, Duration::from_secs),
        })
    }
}

/// Read-only table of the services to probe, keyed by name
#[derive(Debug, Clone, Default)]
pub struct ServiceRegistry {
    services: Vec<ServiceDefinition>,
}

impl ServiceRegistry {
    pub fn new(definitions: impl IntoIterator<Item = ServiceDefinition>) -> Self {
        let mut registry = Self::default();
        for definition in definitions {
            registry.register(definition);
        }
        registry
    }

    /// Register a service, replacing any earlier one with the same name
    fn register(&mut self, definition: ServiceDefinition) {
        match self
            .services
            .iter_mut()
            .find(|existing| existing.name == definition.name)
        {
            Some(existing) => {
                warn!("service '{}' registered twice, replacing", definition.name);
                *existing = definition;
            }
            None => self.services.push(definition),
        }
    }

    pub fn from_configs(configs: Vec<ServiceConfig>) -> Result<Self, ConfigError> {
        let definitions = configs
            .into_iter()
            .map(ServiceConfig::resolve)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(definitions))
    }

    pub fn get(&self, name: &str) -> Option<&ServiceDefinition> {
        self.services.iter().find(|s| s.name == name)
    }

    pub fn names(&self) -> Vec<String> {
        self.services.iter().map(|s| s.name.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ServiceDefinition> {
        self.services.iter()
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

pub fn parse_services(json: &str) -> Result<Vec<ServiceConfig>, ConfigError> {
    serde_json::from_str(json).map_err(|e| ConfigError::InvalidServices(e.to_string()))
}

pub fn read_services_file(path: &str) -> Result<Vec<ServiceConfig>, ConfigError> {
    let file_content = std::fs::read_to_string(path)?;
    parse_services(&file_content).inspect(|services| trace!("loaded services: {services:?}"))
}

/// Process-wide settings, read once at startup
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub bind_addr: SocketAddr,
    pub check_interval: Duration,
    pub webhook_url: Option<String>,
    pub alert_cooldown: Duration,
    pub container_stats_ttl: Duration,
    pub docker_socket: PathBuf,
    pub plugs_metrics_url: Option<String>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::new(IpAddr::V4(get_addr()), crate::util::get_default_port()),
            check_interval: Duration::from_secs(30),
            webhook_url: None,
            alert_cooldown: Duration::from_secs(5 * 60),
            container_stats_ttl: Duration::from_secs(10),
            docker_socket: PathBuf::from("/var/run/docker.sock"),
            plugs_metrics_url: None,
        }
    }
}

impl MonitorConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bind_addr: SocketAddr::new(IpAddr::V4(get_addr()), get_port()),
            check_interval: Duration::from_secs(
                env_or("CHECK_INTERVAL_SECS", defaults.check_interval.as_secs()).max(1),
            ),
            webhook_url: env_string("ALERT_WEBHOOK_URL"),
            alert_cooldown: Duration::from_secs(env_or(
                "ALERT_COOLDOWN_SECS",
                defaults.alert_cooldown.as_secs(),
            )),
            container_stats_ttl: Duration::from_secs(env_or(
                "CONTAINER_STATS_TTL_SECS",
                defaults.container_stats_ttl.as_secs(),
            )),
            docker_socket: env_string("DOCKER_SOCKET")
                .map_or(defaults.docker_socket, PathBuf::from),
            plugs_metrics_url: env_string("PLUGS_METRICS_URL"),
        }
    }

    /// Number of snapshots covering a rolling 24h window
    pub fn history_capacity(&self) -> usize {
        let interval = self.check_interval.as_secs().max(1);
        (DAY_SECS / interval).max(1) as usize
    }
}

/// Load the service table from `MONITOR_SERVICES` (inline JSON) or a file
pub fn load_services(file: Option<&str>) -> Result<ServiceRegistry, ConfigError> {
    let configs = match (file, env_string("MONITOR_SERVICES")) {
        (Some(path), _) => read_services_file(path)?,
        (None, Some(inline)) => parse_services(&inline)?,
        (None, None) => {
            warn!("no services configured, only container stats will be collected");
            vec![]
        }
    };
    ServiceRegistry::from_configs(configs)
}
