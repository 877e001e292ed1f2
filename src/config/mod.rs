//! Configuration management for the foos-ladder service
//!
//! This module handles configuration loading from TOML files and environment
//! variables, validation, and default values.

pub mod app;
pub mod rating;

// Re-export commonly used types
pub use app::{validate_config, AppConfig, RecorderSettings, ServiceSettings};
pub use rating::RatingConfig;
