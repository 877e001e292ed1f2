//! Health check and ladder statistics
//!
//! Liveness only looks at the running flag; the full check also reads the
//! store so a poisoned lock or a broken backend shows up as unhealthy.

use crate::service::app::AppState;
use crate::storage::StorageCounts;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::error;

/// Health check status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
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

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheck {
    /// Overall service status
    pub status: HealthStatus,
    pub service: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Detailed component checks
    pub checks: Vec<ComponentCheck>,
    pub stats: LadderStats,
}

/// Individual component health check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentCheck {
    pub name: String,
    pub status: HealthStatus,
    /// Set when the component is not healthy
    pub message: Option<String>,
    pub duration_ms: u64,
}

/// Ladder statistics for health reporting
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LadderStats {
    pub players: usize,
    pub teams: usize,
    pub singles_games: usize,
    pub doubles_games: usize,
    /// Submissions retried after losing a race with another game
    pub commit_conflicts: u64,
    pub teams_created: u64,
    pub uptime_seconds: u64,
}

impl HealthCheck {
    /// Perform a full health check of the service
    pub async fn check(app_state: &AppState) -> Result<Self> {
        let mut checks = Vec::new();

        checks.push(Self::check_service_running(app_state).await);

        let (storage_check, counts) = Self::check_storage(app_state);
        checks.push(storage_check);

        let status = checks
            .iter()
            .map(|check| check.status)
            .fold(HealthStatus::Healthy, worst);

        let counts = counts.unwrap_or_default();
        let metrics = app_state.metrics();
        let stats = LadderStats {
            players: counts.players,
            teams: counts.teams,
            singles_games: counts.singles_games,
            doubles_games: counts.doubles_games,
            commit_conflicts: metrics.recording().commit_conflicts_total.get(),
            teams_created: metrics.roster().teams_created_total.get(),
            uptime_seconds: app_state.uptime().as_secs(),
        };

        Ok(HealthCheck {
            status,
            service: app_state.config().service.name.clone(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: chrono::Utc::now(),
            checks,
            stats,
        })
    }

    /// Simple liveness check - just verify service is running
    pub async fn liveness_check(app_state: &AppState) -> Result<HealthStatus> {
        if app_state.is_running().await {
            Ok(HealthStatus::Healthy)
        } else {
            Ok(HealthStatus::Unhealthy)
        }
    }

    async fn check_service_running(app_state: &AppState) -> ComponentCheck {
        let start = std::time::Instant::now();

        let (status, message) = if app_state.is_running().await {
            (HealthStatus::Healthy, None)
        } else {
            (
                HealthStatus::Unhealthy,
                Some("Service is not running".to_string()),
            )
        };

        ComponentCheck {
            name: "service_running".to_string(),
            status,
            message,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }

    fn check_storage(app_state: &AppState) -> (ComponentCheck, Option<StorageCounts>) {
        let start = std::time::Instant::now();

        let (status, message, counts) = match app_state.storage().counts() {
            Ok(counts) => (HealthStatus::Healthy, None, Some(counts)),
            Err(e) => {
                error!("Storage health check failed: {}", e);
                (
                    HealthStatus::Unhealthy,
                    Some(format!("Storage check failed: {}", e)),
                    None,
                )
            }
        };

        let check = ComponentCheck {
            name: "storage".to_string(),
            status,
            message,
            duration_ms: start.elapsed().as_millis() as u64,
        };
        (check, counts)
    }
}

fn worst(a: HealthStatus, b: HealthStatus) -> HealthStatus {
    match (a, b) {
        (HealthStatus::Unhealthy, _) | (_, HealthStatus::Unhealthy) => HealthStatus::Unhealthy,
        (HealthStatus::Degraded, _) | (_, HealthStatus::Degraded) => HealthStatus::Degraded,
        _ => HealthStatus::Healthy,
    }
}
