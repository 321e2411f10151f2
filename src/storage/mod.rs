//! In-process state of the monitor
//!
//! - **current**: latest `ServiceHealth` per service, overwritten every cycle
//! - **history**: ring buffer of per-cycle snapshots used for uptime and
//!   historical queries
//!
//! Nothing here is persisted; a restart starts with an empty history.

pub mod current;
pub mod history;

pub use current::HealthStore;
pub use history::HistoryBuffer;
