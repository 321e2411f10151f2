//! Current health per service
//!
//! One record per service name, overwritten in place by the checker. Records
//! are replaced whole under the write lock, so readers never see a partially
//! updated entry.

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::{ServiceHealth, ServiceStatus};

#[derive(Debug, Default)]
pub struct HealthStore {
    services: RwLock<HashMap<String, ServiceHealth>>,
}

impl HealthStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the entry for `health.name`
    pub async fn update(&self, health: ServiceHealth) {
        let mut services = self.services.write().await;
        services.insert(health.name.clone(), health);
    }

    pub async fn get(&self, name: &str) -> Option<ServiceHealth> {
        self.services.read().await.get(name).cloned()
    }

    /// Status per service, used to diff a new cycle against the previous one
    pub async fn statuses(&self) -> HashMap<String, ServiceStatus> {
        self.services
            .read()
            .await
            .iter()
            .map(|(name, health)| (name.clone(), health.status))
            .collect()
    }

    /// All current entries, sorted by name
    pub async fn all(&self) -> Vec<ServiceHealth> {
        let mut services: Vec<_> = self.services.read().await.values().cloned().collect();
        services.sort_by(|a, b| a.name.cmp(&b.name));
        services
    }
}
