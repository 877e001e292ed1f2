//! Match recording
//!
//! The recorder is the single entry point for accepting a game. It parses
//! and validates the submission, resolves teams for doubles, computes the
//! new ratings from pre-game values and hands storage one commit batch.
//! Commits that lose a race with a concurrent game are retried from a fresh
//! read.

use crate::config::RecorderSettings;
use crate::error::{LadderError, Result, StorageError};
use crate::matches::teams::TeamResolver;
use crate::metrics::MetricsCollector;
use crate::rating::{EloRatingCalculator, RatingCalculator};
use crate::storage::{DoublesCommit, GameCommit, LadderStorage, ParticipantUpdate};
use crate::types::{DoublesGame, GameKind, Player, PlayerId, SinglesGame, Team, TeamId, TeamKey};
use crate::utils::{current_timestamp, non_blank};
use crate::validation::{parse_id, validate_scores, DoublesSubmission, RawScore, SinglesSubmission};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// The latest games of both kinds, newest first
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecentGames {
    pub singles: Vec<SinglesGame>,
    pub doubles: Vec<DoublesGame>,
}

/// Validates submissions and commits rated games
#[derive(Clone)]
pub struct MatchRecorder {
    storage: Arc<dyn LadderStorage>,
    calculator: Arc<dyn RatingCalculator>,
    teams: TeamResolver,
    metrics: Arc<MetricsCollector>,
    settings: RecorderSettings,
}

impl MatchRecorder {
    pub fn new(
        storage: Arc<dyn LadderStorage>,
        calculator: Arc<dyn RatingCalculator>,
        metrics: Arc<MetricsCollector>,
        settings: RecorderSettings,
    ) -> Self {
        let teams = TeamResolver::new(
            storage.clone(),
            metrics.clone(),
            calculator.initial_rating(),
        );

        Self {
            storage,
            calculator,
            teams,
            metrics,
            settings,
        }
    }

    /// Recorder with the default Elo configuration and a private registry
    pub fn with_defaults(storage: Arc<dyn LadderStorage>) -> Self {
        Self::new(
            storage,
            Arc::new(EloRatingCalculator::default()),
            Arc::new(MetricsCollector::default()),
            RecorderSettings::default(),
        )
    }

    pub fn storage(&self) -> Arc<dyn LadderStorage> {
        self.storage.clone()
    }

    pub fn calculator(&self) -> Arc<dyn RatingCalculator> {
        self.calculator.clone()
    }

    /// Register a player at the initial rating
    pub fn register_player(&self, name: &str) -> Result<Player> {
        let name = non_blank(Some(name)).ok_or_else(|| LadderError::invalid_input("name"))?;
        let player = self
            .storage
            .create_player(name, self.calculator.initial_rating())?;

        info!(
            "Registered player {} ({}) at rating {}",
            player.name, player.id, player.rating
        );
        self.metrics
            .set_players_registered(self.storage.counts()?.players);

        Ok(player)
    }

    pub fn player(&self, player_id: PlayerId) -> Result<Player> {
        self.storage
            .get_player(player_id)?
            .ok_or(LadderError::UnknownPlayer { player_id })
    }

    pub fn team(&self, team_id: TeamId) -> Result<Team> {
        self.storage
            .get_team(team_id)?
            .ok_or(LadderError::UnknownTeam { team_id })
    }

    /// Every registered player, highest rating first
    pub fn roster(&self) -> Result<Vec<Player>> {
        let mut players = self.storage.list_players()?;
        players.sort_by(|a, b| b.rating.cmp(&a.rating).then(a.id.cmp(&b.id)));
        Ok(players)
    }

    /// Players with at least `min_ranked_games` singles games, ranked by rating
    pub fn standings(&self) -> Result<Vec<Player>> {
        let min_games = self.settings.min_ranked_games;
        let mut players = self.roster()?;
        players.retain(|player| player.singles.games_played >= min_games);
        Ok(players)
    }

    /// Teams ranked by rating, ties broken by id
    pub fn team_standings(&self) -> Result<Vec<Team>> {
        let mut teams = self.storage.list_teams()?;
        teams.sort_by(|a, b| b.rating.cmp(&a.rating).then(a.id.cmp(&b.id)));
        Ok(teams)
    }

    /// Singles games the player took part in, newest first
    pub fn player_history(&self, player_id: PlayerId) -> Result<Vec<SinglesGame>> {
        self.player(player_id)?;

        let mut games: Vec<SinglesGame> = self
            .storage
            .singles_games()?
            .into_iter()
            .filter(|game| game.involves(player_id))
            .collect();
        games.reverse();
        Ok(games)
    }

    /// Latest games of each kind; `None` uses the configured limit
    pub fn recent_games(&self, limit: Option<usize>) -> Result<RecentGames> {
        let limit = limit.unwrap_or(self.settings.recent_games_limit);

        let singles = self
            .storage
            .singles_games()?
            .into_iter()
            .rev()
            .take(limit)
            .collect();
        let doubles = self
            .storage
            .doubles_games()?
            .into_iter()
            .rev()
            .take(limit)
            .collect();

        Ok(RecentGames { singles, doubles })
    }

    /// Validate, rate and persist a 1v1 result
    pub fn record_singles(&self, submission: &SinglesSubmission) -> Result<SinglesGame> {
        let timer = self.metrics.start_timer();
        let result = self.try_record_singles(submission);

        match &result {
            Ok(game) => {
                self.metrics.record_game(GameKind::Singles, timer.stop());
                info!(
                    "Recorded singles game {}: {} {}-{} {} (rating {:+} / {:+})",
                    game.id,
                    game.side1.competitor,
                    game.side1.score,
                    game.side2.score,
                    game.side2.competitor,
                    game.side1.rating_change(),
                    game.side2.rating_change()
                );
            }
            Err(e) => self.report_failure(GameKind::Singles, e),
        }

        result
    }

    /// Validate, resolve teams, rate and persist a 2v2 result
    pub fn record_doubles(&self, submission: &DoublesSubmission) -> Result<DoublesGame> {
        let timer = self.metrics.start_timer();
        let result = self.try_record_doubles(submission);

        match &result {
            Ok(game) => {
                self.metrics.record_game(GameKind::Doubles, timer.stop());
                info!(
                    "Recorded doubles game {}: team {} {}-{} team {} (rating {:+} / {:+})",
                    game.id,
                    game.side1.competitor,
                    game.side1.score,
                    game.side2.score,
                    game.side2.competitor,
                    game.side1.rating_change(),
                    game.side2.rating_change()
                );
            }
            Err(e) => self.report_failure(GameKind::Doubles, e),
        }

        result
    }

    fn report_failure(&self, kind: GameKind, err: &LadderError) {
        self.metrics.record_rejection(kind, err.kind());
        if err.is_rejection() {
            debug!("Rejected {} submission: {}", kind, err);
        } else {
            error!("Failed to record {} game: {}", kind, err);
        }
    }

    fn try_record_singles(&self, submission: &SinglesSubmission) -> Result<SinglesGame> {
        let player1: PlayerId = parse_id("player1", submission.player1.as_deref())?;
        let player2: PlayerId = parse_id("player2", submission.player2.as_deref())?;

        self.with_commit_retries(|| {
            let players = self.storage.get_players(&[player1, player2])?;
            let first = lookup(&players, player1)?;
            let second = lookup(&players, player2)?;

            let score = validate_scores(
                &player1,
                &player2,
                RawScore::new("player1_score", submission.player1_score.as_deref()),
                RawScore::new("player2_score", submission.player2_score.as_deref()),
            )?;

            let update = self
                .calculator
                .rate(first.rating, second.rating, score.outcome);

            let commit = GameCommit {
                side1: ParticipantUpdate {
                    id: first.id,
                    expected_revision: first.revision,
                    start_rating: update.start_a,
                    end_rating: update.end_a,
                    outcome: score.outcome,
                },
                side2: ParticipantUpdate {
                    id: second.id,
                    expected_revision: second.revision,
                    start_rating: update.start_b,
                    end_rating: update.end_b,
                    outcome: score.outcome.reversed(),
                },
                score1: score.score_a,
                score2: score.score_b,
                played_at: current_timestamp(),
            };

            Ok(self.storage.commit_singles(commit)?)
        })
    }

    fn try_record_doubles(&self, submission: &DoublesSubmission) -> Result<DoublesGame> {
        let team1player1: PlayerId =
            parse_id("team1player1", submission.team1player1.as_deref())?;
        let team1player2: PlayerId =
            parse_id("team1player2", submission.team1player2.as_deref())?;
        let team2player1: PlayerId =
            parse_id("team2player1", submission.team2player1.as_deref())?;
        let team2player2: PlayerId =
            parse_id("team2player2", submission.team2player2.as_deref())?;
        let lineup = [team1player1, team1player2, team2player1, team2player2];

        self.with_commit_retries(|| {
            let players = self.storage.get_players(&lineup)?;
            for player_id in lineup {
                lookup(&players, player_id)?;
            }

            let key1 =
                TeamKey::new(team1player1, team1player2).ok_or(LadderError::DuplicateCompetitor)?;
            let key2 =
                TeamKey::new(team2player1, team2player2).ok_or(LadderError::DuplicateCompetitor)?;

            // Every rule passes before any team row is created
            let score = validate_scores(
                &key1,
                &key2,
                RawScore::new("team1_score", submission.team1_score.as_deref()),
                RawScore::new("team2_score", submission.team2_score.as_deref()),
            )?;

            let team1 = self.teams.resolve_key(key1, team1player1, team1player2)?;
            let team2 = self.teams.resolve_key(key2, team2player1, team2player2)?;

            let update = self
                .calculator
                .rate(team1.rating, team2.rating, score.outcome);
            let outcome1 = score.outcome;
            let outcome2 = score.outcome.reversed();

            let member_outcomes = team1
                .members()
                .into_iter()
                .map(|player_id| (player_id, outcome1))
                .chain(
                    team2
                        .members()
                        .into_iter()
                        .map(|player_id| (player_id, outcome2)),
                )
                .collect();

            let commit = DoublesCommit {
                game: GameCommit {
                    side1: ParticipantUpdate {
                        id: team1.id,
                        expected_revision: team1.revision,
                        start_rating: update.start_a,
                        end_rating: update.end_a,
                        outcome: outcome1,
                    },
                    side2: ParticipantUpdate {
                        id: team2.id,
                        expected_revision: team2.revision,
                        start_rating: update.start_b,
                        end_rating: update.end_b,
                        outcome: outcome2,
                    },
                    score1: score.score_a,
                    score2: score.score_b,
                    played_at: current_timestamp(),
                },
                member_outcomes,
            };

            Ok(self.storage.commit_doubles(commit)?)
        })
    }

    /// Re-run `attempt` while storage reports a stale read
    fn with_commit_retries<T>(&self, mut attempt: impl FnMut() -> Result<T>) -> Result<T> {
        let max_attempts = self.settings.max_commit_attempts.max(1);
        let mut attempts = 1;

        loop {
            match attempt() {
                Err(LadderError::Storage(StorageError::Conflict { record }))
                    if attempts < max_attempts =>
                {
                    self.metrics.record_commit_conflict();
                    attempts += 1;
                    warn!(
                        "Concurrent update on {}, retrying (attempt {} of {})",
                        record, attempts, max_attempts
                    );
                }
                other => return other,
            }
        }
    }
}

fn lookup(players: &HashMap<PlayerId, Player>, player_id: PlayerId) -> Result<&Player> {
    players
        .get(&player_id)
        .ok_or(LadderError::UnknownPlayer { player_id })
}
