//! Error types for the ladder service
//!
//! Core operations return [`LadderError`] so callers can branch on the failure
//! kind. Binary, configuration and server plumbing use `anyhow`.

use crate::types::{PlayerId, Side, TeamId};

/// Result type alias for core ladder operations
pub type Result<T> = std::result::Result<T, LadderError>;

/// Failures surfaced by validation, team resolution and match recording
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LadderError {
    #[error("Invalid input for field '{field}'")]
    InvalidInput { field: String },

    #[error("The same competitor was submitted on both sides")]
    DuplicateCompetitor,

    #[error("Player not found: {player_id}")]
    UnknownPlayer { player_id: PlayerId },

    #[error("Team not found: {team_id}")]
    UnknownTeam { team_id: TeamId },

    #[error("{side} score {score} is outside the range 0-11")]
    ScoreOutOfRange { side: Side, score: i64 },

    #[error("A score of 11 is only reachable as an 11-9 tiebreak")]
    IllegalTiebreakScore,

    #[error("A game cannot finish 10-9")]
    IllegalWinByOne,

    #[error("Score does not describe a finished game")]
    IndeterminateResult,

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl LadderError {
    pub fn invalid_input(field: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
        }
    }

    /// Stable label for logs, metrics and API bodies
    pub fn kind(&self) -> &'static str {
        match self {
            LadderError::InvalidInput { .. } => "invalid_input",
            LadderError::DuplicateCompetitor => "duplicate_competitor",
            LadderError::UnknownPlayer { .. } => "unknown_player",
            LadderError::UnknownTeam { .. } => "unknown_team",
            LadderError::ScoreOutOfRange { .. } => "score_out_of_range",
            LadderError::IllegalTiebreakScore => "illegal_tiebreak_score",
            LadderError::IllegalWinByOne => "illegal_win_by_one",
            LadderError::IndeterminateResult => "indeterminate_result",
            LadderError::Storage(_) => "storage_error",
        }
    }

    /// True for rejections of the submitted data, false for storage failures
    pub fn is_rejection(&self) -> bool {
        !matches!(self, LadderError::Storage(_))
    }
}

/// Failures raised by a [`crate::storage::LadderStorage`] implementation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    #[error("Concurrent update detected on {record}")]
    Conflict { record: String },

    #[error("A team already exists for players {player_a} and {player_b}")]
    DuplicateTeam { player_a: PlayerId, player_b: PlayerId },

    #[error("Record missing during commit: {record}")]
    MissingRecord { record: String },

    #[error("Failed to acquire {lock} lock")]
    LockPoisoned { lock: &'static str },
}
