//! Head-to-head summaries and win probabilities against every opponent

use crate::error::{LadderError, Result};
use crate::rating::RatingCalculator;
use crate::storage::LadderStorage;
use crate::types::{Outcome, PlayerId};
use crate::utils::to_percentage;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// How a player fares against one other player in singles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpponentSummary {
    pub opponent_id: PlayerId,
    pub name: String,
    pub rating: i32,
    /// Chance the focal player wins, in percent with one decimal
    pub win_probability: f64,
    pub wins: u32,
    pub losses: u32,
}

pub struct OpponentEstimator {
    storage: Arc<dyn LadderStorage>,
    calculator: Arc<dyn RatingCalculator>,
}

impl OpponentEstimator {
    pub fn new(storage: Arc<dyn LadderStorage>, calculator: Arc<dyn RatingCalculator>) -> Self {
        Self {
            storage,
            calculator,
        }
    }

    /// One summary per other registered player, ordered by id
    ///
    /// Wins and losses count singles games only; draws are left out.
    pub fn summaries(&self, player_id: PlayerId) -> Result<Vec<OpponentSummary>> {
        let player = self
            .storage
            .get_player(player_id)?
            .ok_or(LadderError::UnknownPlayer { player_id })?;

        let mut head_to_head: HashMap<PlayerId, (u32, u32)> = HashMap::new();
        for game in self.storage.singles_games()? {
            let opponent = if game.side1.competitor == player_id {
                game.side2.competitor
            } else if game.side2.competitor == player_id {
                game.side1.competitor
            } else {
                continue;
            };

            let tally = head_to_head.entry(opponent).or_default();
            match game.outcome_for(player_id) {
                Some(Outcome::Win) => tally.0 += 1,
                Some(Outcome::Loss) => tally.1 += 1,
                _ => {}
            }
        }

        let summaries = self
            .storage
            .list_players()?
            .into_iter()
            .filter(|opponent| opponent.id != player_id)
            .map(|opponent| {
                let (wins, losses) = head_to_head.get(&opponent.id).copied().unwrap_or_default();
                OpponentSummary {
                    opponent_id: opponent.id,
                    win_probability: to_percentage(
                        self.calculator
                            .win_probability(player.rating, opponent.rating),
                    ),
                    name: opponent.name,
                    rating: opponent.rating,
                    wins,
                    losses,
                }
            })
            .collect();

        Ok(summaries)
    }
}
