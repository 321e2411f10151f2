//! Probes run against the monitored fleet

pub mod health;

pub use health::HealthChecker;
