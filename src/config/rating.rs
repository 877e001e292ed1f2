//! Rating system configuration

use serde::{Deserialize, Serialize};

/// Elo parameters: starting rating and the K-factor tiers
///
/// A rating at or below `intermediate_threshold` uses `base_k_factor`,
/// a rating strictly between the two thresholds uses
/// `intermediate_k_factor`, and a rating at or above `master_threshold`
/// uses `master_k_factor`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingConfig {
    pub default_rating: i32,
    pub base_k_factor: f64,
    pub intermediate_k_factor: f64,
    pub master_k_factor: f64,
    pub intermediate_threshold: i32,
    pub master_threshold: i32,
}

impl Default for RatingConfig {
    fn default() -> Self {
        Self {
            default_rating: crate::types::DEFAULT_RATING,
            base_k_factor: 32.0,
            intermediate_k_factor: 24.0,
            master_k_factor: 16.0,
            intermediate_threshold: 2100,
            master_threshold: 2400,
        }
    }
}

impl RatingConfig {
    /// K-factor for a player's pre-game rating
    pub fn k_factor_for(&self, rating: i32) -> f64 {
        if rating >= self.master_threshold {
            self.master_k_factor
        } else if rating > self.intermediate_threshold {
            self.intermediate_k_factor
        } else {
            self.base_k_factor
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.base_k_factor <= 0.0
            || self.intermediate_k_factor <= 0.0
            || self.master_k_factor <= 0.0
        {
            anyhow::bail!("K-factors must be positive");
        }
        if self.intermediate_threshold >= self.master_threshold {
            anyhow::bail!(
                "Intermediate threshold {} must be below master threshold {}",
                self.intermediate_threshold,
                self.master_threshold
            );
        }
        if self.default_rating <= 0 {
            anyhow::bail!("Default rating must be positive");
        }
        Ok(())
    }
}
