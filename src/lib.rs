//! Foos Ladder - foosball result validation and Elo ladder
//!
//! This crate validates singles and doubles foosball results against house
//! scoring rules, resolves doubles teams, rates every accepted game with Elo
//! and serves the ladder over a JSON API.

pub mod config;
pub mod error;
pub mod matches;
pub mod metrics;
pub mod rating;
pub mod service;
pub mod storage;
pub mod types;
pub mod utils;
pub mod validation;

// Re-export commonly used types and traits
pub use error::{LadderError, Result, StorageError};
pub use types::*;

// Re-export key components
pub use matches::{MatchRecorder, RecentGames, TeamResolver};
pub use rating::{EloRatingCalculator, OpponentEstimator, RatingCalculator};
pub use storage::{InMemoryLadderStorage, LadderStorage};
pub use validation::{DoublesSubmission, SinglesSubmission};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
