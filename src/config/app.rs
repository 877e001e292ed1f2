//! Main application configuration
//!
//! This module defines the primary configuration structures for the
//! foos-ladder service, including TOML and environment variable loading and
//! validation.

use crate::config::rating::RatingConfig;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub rating: RatingConfig,
    pub recorder: RecorderSettings,
}

/// Service-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging and metrics
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Interface the HTTP API binds to
    pub http_host: String,
    /// Port for the HTTP API, health and metrics endpoints
    pub http_port: u16,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,
}

/// Match recording settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderSettings {
    /// Total attempts for a submission whose commit hits a concurrent update
    pub max_commit_attempts: u32,
    /// Number of games returned by the recent games listing
    pub recent_games_limit: usize,
    /// Singles games a player needs before appearing in the standings
    pub min_ranked_games: u32,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "foos-ladder".to_string(),
            log_level: "info".to_string(),
            http_host: "0.0.0.0".to_string(),
            http_port: 8080,
            shutdown_timeout_seconds: 30,
        }
    }
}

impl Default for RecorderSettings {
    fn default() -> Self {
        Self {
            max_commit_attempts: 3,
            recent_games_limit: 10,
            min_ranked_games: 4,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file; missing keys keep their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw).context("Invalid TOML configuration")?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        // Service settings
        if let Ok(name) = env::var("SERVICE_NAME") {
            config.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            config.service.log_level = log_level;
        }
        if let Ok(host) = env::var("HTTP_HOST") {
            config.service.http_host = host;
        }
        if let Ok(port) = env::var("HTTP_PORT") {
            config.service.http_port = port
                .parse()
                .map_err(|_| anyhow!("Invalid HTTP_PORT value: {}", port))?;
        }
        if let Ok(timeout) = env::var("SHUTDOWN_TIMEOUT_SECONDS") {
            config.service.shutdown_timeout_seconds = timeout
                .parse()
                .map_err(|_| anyhow!("Invalid SHUTDOWN_TIMEOUT_SECONDS value: {}", timeout))?;
        }

        // Rating settings
        if let Ok(default_rating) = env::var("DEFAULT_RATING") {
            config.rating.default_rating = default_rating
                .parse()
                .map_err(|_| anyhow!("Invalid DEFAULT_RATING value: {}", default_rating))?;
        }

        // Recorder settings
        if let Ok(attempts) = env::var("MAX_COMMIT_ATTEMPTS") {
            config.recorder.max_commit_attempts = attempts
                .parse()
                .map_err(|_| anyhow!("Invalid MAX_COMMIT_ATTEMPTS value: {}", attempts))?;
        }
        if let Ok(limit) = env::var("RECENT_GAMES_LIMIT") {
            config.recorder.recent_games_limit = limit
                .parse()
                .map_err(|_| anyhow!("Invalid RECENT_GAMES_LIMIT value: {}", limit))?;
        }
        if let Ok(min_games) = env::var("MIN_RANKED_GAMES") {
            config.recorder.min_ranked_games = min_games
                .parse()
                .map_err(|_| anyhow!("Invalid MIN_RANKED_GAMES value: {}", min_games))?;
        }

        validate_config(&config)?;
        Ok(config)
    }

    /// Get shutdown timeout as Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.service.shutdown_timeout_seconds)
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    if config.service.http_port == 0 {
        return Err(anyhow!("HTTP port cannot be 0"));
    }
    if config.service.shutdown_timeout_seconds == 0 {
        return Err(anyhow!("Shutdown timeout must be greater than 0"));
    }

    if config.recorder.max_commit_attempts == 0 {
        return Err(anyhow!("Max commit attempts must be at least 1"));
    }
    if config.recorder.recent_games_limit == 0 {
        return Err(anyhow!("Recent games limit must be greater than 0"));
    }

    config.rating.validate()?;

    Ok(())
}
