//! Rating system integration using the Elo algorithm
//!
//! This module provides rating calculations via the skillratings crate and
//! the opponent win-probability view built on top of them.

pub mod calculator;
pub mod elo;
pub mod opponents;

// Re-export commonly used types
pub use calculator::{RatingCalculator, RatingUpdate};
pub use elo::EloRatingCalculator;
pub use opponents::{OpponentEstimator, OpponentSummary};
