//! Storage interface for players, teams and game records
//!
//! The core never assigns identifiers or mutates rows itself. It reads
//! current state, computes the new state, and hands the storage a commit
//! batch that must be applied entirely or not at all.

pub mod memory;

pub use memory::InMemoryLadderStorage;

use crate::error::StorageError;
use crate::types::{
    DoublesGame, Outcome, Player, PlayerId, SinglesGame, Team, TeamId, TeamKey,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Result type for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// New state for one rated participant of a game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantUpdate<Id> {
    pub id: Id,
    /// Revision the recorder read; the commit fails with `Conflict` if the
    /// row moved since
    pub expected_revision: u64,
    pub start_rating: i32,
    pub end_rating: i32,
    pub outcome: Outcome,
}

/// Everything needed to persist one game and update both participants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameCommit<Id> {
    pub side1: ParticipantUpdate<Id>,
    pub side2: ParticipantUpdate<Id>,
    pub score1: u8,
    pub score2: u8,
    pub played_at: DateTime<Utc>,
}

/// A doubles game plus the doubles tallies of the four team members
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoublesCommit {
    pub game: GameCommit<TeamId>,
    pub member_outcomes: Vec<(PlayerId, Outcome)>,
}

/// Row counts for health reporting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageCounts {
    pub players: usize,
    pub teams: usize,
    pub singles_games: usize,
    pub doubles_games: usize,
}

/// Trait for ladder storage operations
#[cfg_attr(test, mockall::automock)]
pub trait LadderStorage: Send + Sync {
    /// Register a new player with zeroed tallies
    fn create_player(&self, name: &str, rating: i32) -> StorageResult<Player>;

    /// Get a player by id
    fn get_player(&self, player_id: PlayerId) -> StorageResult<Option<Player>>;

    /// Get several players; absent ids are left out of the map
    fn get_players(&self, player_ids: &[PlayerId]) -> StorageResult<HashMap<PlayerId, Player>>;

    /// All players ordered by id
    fn list_players(&self) -> StorageResult<Vec<Player>>;

    /// Get a team by id
    fn get_team(&self, team_id: TeamId) -> StorageResult<Option<Team>>;

    /// Find the team for an unordered pair of players
    fn find_team(&self, key: TeamKey) -> StorageResult<Option<Team>>;

    /// Insert a team; fails with `DuplicateTeam` if the pair already has one
    fn insert_team(&self, player1: PlayerId, player2: PlayerId, rating: i32)
        -> StorageResult<Team>;

    /// All teams ordered by id
    fn list_teams(&self) -> StorageResult<Vec<Team>>;

    /// Persist a singles game and both players' new rating and singles tally
    fn commit_singles(&self, commit: GameCommit<PlayerId>) -> StorageResult<SinglesGame>;

    /// Persist a doubles game, both teams' updates and the members' tallies
    fn commit_doubles(&self, commit: DoublesCommit) -> StorageResult<DoublesGame>;

    /// All singles games, oldest first
    fn singles_games(&self) -> StorageResult<Vec<SinglesGame>>;

    /// All doubles games, oldest first
    fn doubles_games(&self) -> StorageResult<Vec<DoublesGame>>;

    /// Row counts per table
    fn counts(&self) -> StorageResult<StorageCounts>;
}
