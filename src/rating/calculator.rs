//! Rating calculator trait
//!
//! This module defines the interface the match recorder and the opponent
//! estimator use for rating arithmetic.

use crate::types::Outcome;
use serde::{Deserialize, Serialize};

/// Ratings of both participants before and after one game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingUpdate {
    pub start_a: i32,
    pub end_a: i32,
    pub start_b: i32,
    pub end_b: i32,
}

impl RatingUpdate {
    pub fn delta_a(&self) -> i32 {
        self.end_a - self.start_a
    }

    pub fn delta_b(&self) -> i32 {
        self.end_b - self.start_b
    }
}

/// Trait for calculating rating changes after games
pub trait RatingCalculator: Send + Sync {
    /// New rating for a participant given its opponent and its own outcome
    fn updated_rating(&self, rating: i32, opponent_rating: i32, outcome: Outcome) -> i32;

    /// Probability that a participant rated `rating` beats one rated
    /// `opponent_rating`
    fn win_probability(&self, rating: i32, opponent_rating: i32) -> f64;

    /// Rating assigned to new players and teams
    fn initial_rating(&self) -> i32;

    /// Rate both sides of a game from their pre-game ratings
    ///
    /// `outcome_a` is side A's result. Neither side sees the other's new
    /// rating, so the order of evaluation does not matter.
    fn rate(&self, rating_a: i32, rating_b: i32, outcome_a: Outcome) -> RatingUpdate {
        RatingUpdate {
            start_a: rating_a,
            end_a: self.updated_rating(rating_a, rating_b, outcome_a),
            start_b: rating_b,
            end_b: self.updated_rating(rating_b, rating_a, outcome_a.reversed()),
        }
    }
}
