//! Main application state and service coordination
//!
//! This module contains the AppState that wires storage, the rating
//! engine, the match recorder and metrics together, and runs the HTTP
//! server until shutdown.

use crate::config::AppConfig;
use crate::matches::MatchRecorder;
use crate::metrics::MetricsCollector;
use crate::rating::{EloRatingCalculator, OpponentEstimator, RatingCalculator};
use crate::service::routes::{HttpServer, HttpServerConfig};
use crate::storage::{InMemoryLadderStorage, LadderStorage};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Service-level errors
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Service initialization error: {message}")]
    Initialization { message: String },

    #[error("Background task error: {message}")]
    BackgroundTask { message: String },
}

/// Main application state containing all service components
pub struct AppState {
    /// Application configuration
    config: AppConfig,

    /// Player, team and game rows
    storage: Arc<dyn LadderStorage>,

    /// Game submission entry point
    recorder: MatchRecorder,

    /// Win probabilities against every opponent
    opponents: Arc<OpponentEstimator>,

    /// Prometheus metrics
    metrics: Arc<MetricsCollector>,

    /// Service status
    is_running: Arc<RwLock<bool>>,

    started_at: Instant,
}

impl AppState {
    /// Initialize the application with an empty in-memory ladder
    pub fn new(config: AppConfig) -> Result<Self, ServiceError> {
        Self::with_storage(config, Arc::new(InMemoryLadderStorage::new()))
    }

    /// Initialize the application over an existing store
    pub fn with_storage(
        config: AppConfig,
        storage: Arc<dyn LadderStorage>,
    ) -> Result<Self, ServiceError> {
        info!("Initializing foos-ladder service");

        crate::config::validate_config(&config).map_err(|e| ServiceError::Configuration {
            message: e.to_string(),
        })?;

        let calculator: Arc<dyn RatingCalculator> = Arc::new(
            EloRatingCalculator::new(config.rating.clone()).map_err(|e| {
                ServiceError::Initialization {
                    message: format!("Failed to create rating calculator: {}", e),
                }
            })?,
        );

        let metrics =
            Arc::new(
                MetricsCollector::new().map_err(|e| ServiceError::Initialization {
                    message: format!("Failed to create metrics collector: {}", e),
                })?,
            );

        let recorder = MatchRecorder::new(
            storage.clone(),
            calculator.clone(),
            metrics.clone(),
            config.recorder.clone(),
        );
        let opponents = Arc::new(OpponentEstimator::new(storage.clone(), calculator));

        if let Ok(counts) = storage.counts() {
            metrics.set_players_registered(counts.players);
        }

        Ok(Self {
            config,
            storage,
            recorder,
            opponents,
            metrics,
            is_running: Arc::new(RwLock::new(false)),
            started_at: Instant::now(),
        })
    }

    /// Register the given names, skipping any that are already on the roster
    pub fn seed_players(&self, names: &[String]) -> Result<usize, ServiceError> {
        let existing = self
            .storage
            .list_players()
            .map_err(|e| ServiceError::Initialization {
                message: format!("Failed to list players: {}", e),
            })?;

        let mut created = 0;
        for name in names {
            if existing.iter().any(|player| player.name == name.trim()) {
                warn!("Player '{}' already registered, skipping", name);
                continue;
            }

            self.recorder
                .register_player(name)
                .map_err(|e| ServiceError::Initialization {
                    message: format!("Failed to register player '{}': {}", name, e),
                })?;
            created += 1;
        }

        Ok(created)
    }

    /// Serve the HTTP API until `shutdown` resolves
    pub async fn serve(
        self: Arc<Self>,
        shutdown: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> Result<(), ServiceError> {
        let server = HttpServer::new(
            HttpServerConfig {
                host: self.config.service.http_host.clone(),
                port: self.config.service.http_port,
            },
            self.clone(),
        );

        *self.is_running.write().await = true;
        info!("Foos ladder service started");

        let handle: JoinHandle<anyhow::Result<()>> =
            tokio::spawn(async move { server.run(shutdown).await });

        let result = match handle.await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                error!("HTTP server failed: {}", e);
                Err(ServiceError::BackgroundTask {
                    message: e.to_string(),
                })
            }
            Err(e) => Err(ServiceError::BackgroundTask {
                message: format!("HTTP server task panicked: {}", e),
            }),
        };

        *self.is_running.write().await = false;

        if let Ok(counts) = self.storage.counts() {
            info!(
                "Final ladder statistics: {} players, {} teams, {} singles games, {} doubles games",
                counts.players, counts.teams, counts.singles_games, counts.doubles_games
            );
        }
        info!("Foos ladder service stopped");

        result
    }

    /// Mark the service as running without binding a socket
    pub async fn mark_running(&self, running: bool) {
        *self.is_running.write().await = running;
    }

    /// Get service configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Check if service is running
    pub async fn is_running(&self) -> bool {
        *self.is_running.read().await
    }

    pub fn storage(&self) -> Arc<dyn LadderStorage> {
        self.storage.clone()
    }

    pub fn recorder(&self) -> &MatchRecorder {
        &self.recorder
    }

    pub fn opponents(&self) -> Arc<OpponentEstimator> {
        self.opponents.clone()
    }

    pub fn metrics(&self) -> Arc<MetricsCollector> {
        self.metrics.clone()
    }

    pub fn uptime(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }
}
