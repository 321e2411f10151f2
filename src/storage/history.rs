//! Bounded history of health snapshots
//!
//! Snapshots are kept in a ring buffer with a fixed capacity. When the buffer
//! is full the oldest snapshot is evicted, so at the configured cycle interval
//! the buffer always covers an exact rolling window (24h by default).

use std::collections::VecDeque;

use tracing::trace;

use crate::HealthSnapshot;

/// Fixed-capacity FIFO store of per-cycle snapshots
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    capacity: usize,
    snapshots: VecDeque<HealthSnapshot>,
}

impl HistoryBuffer {
    /// Create a buffer holding at most `capacity` snapshots (at least one)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            snapshots: VecDeque::with_capacity(capacity.min(4096)),
        }
    }

    /// Append a snapshot, evicting the oldest one when full
    pub fn append(&mut self, snapshot: HealthSnapshot) {
        if self.snapshots.len() == self.capacity {
            self.snapshots.pop_front();
            trace!("history full, evicted oldest snapshot");
        }
        self.snapshots.push_back(snapshot);
    }

    /// The last `limit` snapshots, oldest first
    pub fn recent(&self, limit: usize) -> Vec<HealthSnapshot> {
        let limit = limit.min(self.snapshots.len());
        self.snapshots
            .iter()
            .skip(self.snapshots.len() - limit)
            .cloned()
            .collect()
    }

    /// Share of snapshots in which every service was up, in percent
    ///
    /// An empty history reports 100.
    pub fn uptime_percent(&self) -> f64 {
        if self.snapshots.is_empty() {
            return 100.0;
        }

        let healthy = self.snapshots.iter().filter(|s| s.all_up()).count();
        healthy as f64 / self.snapshots.len() as f64 * 100.0
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
