use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use aims_monitor::{
    Monitor,
    api::{ApiConfig, ApiState, spawn_api_server},
    config::{MonitorConfig, load_services},
    containers::DockerRuntime,
};
use anyhow::Context;
use clap::Parser;
use tracing::{debug, info, level_filters::LevelFilter, trace};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Parser)]
struct Args {
    /// JSON file with the services to monitor
    #[arg(short = 'f', long, env = "MONITOR_SERVICES_FILE")]
    services_file: Option<String>,

    /// Port of the HTTP API, overrides MONITOR_PORT
    #[arg(short, long)]
    port: Option<u16>,

    /// Seconds between health cycles, overrides CHECK_INTERVAL_SECS
    #[arg(long)]
    interval: Option<u64>,

    /// Webhook receiving transition alerts, overrides ALERT_WEBHOOK_URL
    #[arg(long)]
    webhook_url: Option<String>,

    /// Seconds between two alerts of one service, overrides ALERT_COOLDOWN_SECS
    #[arg(long)]
    cooldown: Option<u64>,

    /// Seconds container stats are cached, overrides CONTAINER_STATS_TTL_SECS
    #[arg(long)]
    stats_ttl: Option<u64>,

    /// Docker Engine socket, overrides DOCKER_SOCKET
    #[arg(long)]
    docker_socket: Option<PathBuf>,

    /// Plug operations exporter to relay, overrides PLUGS_METRICS_URL
    #[arg(long)]
    plugs_metrics_url: Option<String>,
}

impl Args {
    /// Flags win over the environment
    fn apply(&self, config: &mut MonitorConfig) {
        if let Some(port) = self.port {
            config.bind_addr = SocketAddr::new(config.bind_addr.ip(), port);
        }
        if let Some(secs) = self.interval {
            config.check_interval = Duration::from_secs(secs.max(1));
        }
        if let Some(url) = &self.webhook_url {
            config.webhook_url = Some(url.clone());
        }
        if let Some(secs) = self.cooldown {
            config.alert_cooldown = Duration::from_secs(secs);
        }
        if let Some(secs) = self.stats_ttl {
            config.container_stats_ttl = Duration::from_secs(secs);
        }
        if let Some(socket) = &self.docker_socket {
            config.docker_socket = socket.clone();
        }
        if let Some(url) = &self.plugs_metrics_url {
            config.plugs_metrics_url = Some(url.clone());
        }
    }
}

fn init() {
    let filter = filter::Targets::new().with_targets(vec![
        ("aims_monitor", LevelFilter::DEBUG),
        ("monitor", LevelFilter::TRACE),
        ("tower_http", LevelFilter::DEBUG),
    ]);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init();
    let args = Args::parse();
    trace!("started with args: {args:?}");

    let mut config = MonitorConfig::from_env();
    args.apply(&mut config);
    debug!("configuration: {config:?}");

    let registry =
        load_services(args.services_file.as_deref()).context("invalid service configuration")?;
    info!(
        "monitoring {} services every {:?}",
        registry.len(),
        config.check_interval
    );

    let runtime = DockerRuntime::connect(&config.docker_socket).with_context(|| {
        format!(
            "failed to set up docker client for {}",
            config.docker_socket.display()
        )
    })?;

    let monitor = Monitor::new(&config, registry, Arc::new(runtime));
    let handle = monitor.start();

    let api_config = ApiConfig {
        bind_addr: config.bind_addr,
        ..ApiConfig::default()
    };
    let state = ApiState::new(monitor, config.plugs_metrics_url.clone());
    spawn_api_server(api_config, state).await?;

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("shutting down");
    handle.shutdown().await?;

    Ok(())
}
