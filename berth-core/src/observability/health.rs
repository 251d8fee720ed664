//! Daemon health reporting.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Health of the daemon or one of its subsystems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "healthy"),
            HealthStatus::Degraded => write!(f, "degraded"),
            HealthStatus::Unhealthy => write!(f, "unhealthy"),
        }
    }
}

/// Health of one subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubsystemHealth {
    pub name: String,
    pub status: HealthStatus,
    pub message: Option<String>,
}

/// Aggregated health report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    /// Worst status among subsystems (healthy when there are none)
    pub status: HealthStatus,
    pub version: String,
    pub subsystems: Vec<SubsystemHealth>,
}

/// Tracks subsystem health for the Health RPC.
#[derive(Clone, Default)]
pub struct HealthChecker {
    subsystems: Arc<RwLock<Vec<SubsystemHealth>>>,
}

impl HealthChecker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the status of a subsystem, registering it on first use.
    pub async fn set(&self, name: &str, status: HealthStatus, message: Option<String>) {
        let mut subsystems = self.subsystems.write().await;
        match subsystems.iter_mut().find(|s| s.name == name) {
            Some(existing) => {
                existing.status = status;
                existing.message = message;
            }
            None => subsystems.push(SubsystemHealth { name: name.to_string(), status, message }),
        }
    }

    /// Current report.
    pub async fn report(&self) -> HealthReport {
        let subsystems = self.subsystems.read().await.clone();
        let status =
            subsystems.iter().map(|s| s.status).max().unwrap_or(HealthStatus::Healthy);

        HealthReport { status, version: env!("CARGO_PKG_VERSION").to_string(), subsystems }
    }
}
