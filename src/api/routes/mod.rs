pub mod containers;
pub mod health;
pub mod metrics;
pub mod status;
