//! Actor-based background tasks
//!
//! Each actor runs as an independent async task and is driven through a
//! cloneable handle over a Tokio mpsc channel.
//!
//! ## Architecture Overview
//!
//! ```text
//!            ┌──────────────────┐
//!            │  aims-monitor    │
//!            └────────┬─────────┘
//!                     │ Monitor::start()
//!            ┌────────▼─────────┐   CheckNow / Shutdown
//!            │   MonitorActor   │◄──────────────────── MonitorHandle
//!            └────────┬─────────┘
//!                     │ transitions (bounded queue, try_send)
//!            ┌────────▼─────────┐
//!            │    AlertActor    │──► webhook POST
//!            └──────────────────┘
//! ```
//!
//! ## Communication Patterns
//!
//! 1. **Commands**: Each actor has an mpsc command channel for control messages
//! 2. **Request/Response**: oneshot channels for synchronous queries
//! 3. **Fire-and-forget**: alerts are queued with `try_send` and never awaited

pub mod alert;
pub mod messages;
pub mod monitor;
