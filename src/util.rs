use std::net::Ipv4Addr;
use std::str::FromStr;

const MONITOR_PORT: &str = "MONITOR_PORT";

const DEFAULT_PORT: u16 = 3100;

pub fn get_default_port() -> u16 {
    DEFAULT_PORT
}

pub fn get_port() -> u16 {
    env_or(MONITOR_PORT, DEFAULT_PORT)
}

const MONITOR_ADDR: &str = "MONITOR_ADDR";

const DEFAULT_ADDR: Ipv4Addr = Ipv4Addr::new(0, 0, 0, 0);

pub fn get_addr() -> Ipv4Addr {
    env_or(MONITOR_ADDR, DEFAULT_ADDR)
}

/// Read a non-empty environment variable
pub fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Read and parse an environment variable, falling back on absence or parse errors
pub fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env_string(key)
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

/// Round to two decimals for reporting
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn bytes_to_mb(bytes: u64) -> f64 {
    bytes as f64 / 1024.0 / 1024.0
}
