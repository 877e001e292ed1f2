//! Elo rating implementation
//!
//! Wraps the skillratings Elo update with a K-factor chosen per participant
//! from its own pre-game rating, and rounds results to whole points
//! (halves away from zero).

use crate::config::RatingConfig;
use crate::rating::calculator::RatingCalculator;
use crate::types::Outcome;
use skillratings::elo::{elo, expected_score, EloConfig, EloRating};
use skillratings::Outcomes;

/// Elo rating calculator with tiered K-factors
#[derive(Debug, Clone, Default)]
pub struct EloRatingCalculator {
    config: RatingConfig,
}

impl EloRatingCalculator {
    /// Create a new Elo rating calculator
    pub fn new(config: RatingConfig) -> anyhow::Result<Self> {
        config.validate()?;

        Ok(Self { config })
    }

    pub fn config(&self) -> &RatingConfig {
        &self.config
    }

    /// K-factor applied to a participant with this pre-game rating
    pub fn k_factor(&self, rating: i32) -> f64 {
        self.config.k_factor_for(rating)
    }
}

impl RatingCalculator for EloRatingCalculator {
    fn updated_rating(&self, rating: i32, opponent_rating: i32, outcome: Outcome) -> i32 {
        let player = EloRating {
            rating: f64::from(rating),
        };
        let opponent = EloRating {
            rating: f64::from(opponent_rating),
        };
        let config = EloConfig {
            k: self.k_factor(rating),
        };

        let (updated, _) = elo(&player, &opponent, &to_outcomes(outcome), &config);
        updated.rating.round() as i32
    }

    fn win_probability(&self, rating: i32, opponent_rating: i32) -> f64 {
        let (expected, _) = expected_score(
            &EloRating {
                rating: f64::from(rating),
            },
            &EloRating {
                rating: f64::from(opponent_rating),
            },
        );
        expected
    }

    fn initial_rating(&self) -> i32 {
        self.config.default_rating
    }
}

fn to_outcomes(outcome: Outcome) -> Outcomes {
    match outcome {
        Outcome::Win => Outcomes::WIN,
        Outcome::Loss => Outcomes::LOSS,
        Outcome::Draw => Outcomes::DRAW,
    }
}
