//! Common types used throughout the ladder service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Rating every new player and team starts with
pub const DEFAULT_RATING: i32 = 1000;

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse().map($name)
            }
        }
    };
}

arena_id!(
    /// Storage-assigned identifier of a player
    PlayerId
);
arena_id!(
    /// Storage-assigned identifier of a team
    TeamId
);
arena_id!(
    /// Storage-assigned identifier of a singles or doubles game
    GameId
);

/// Which side of a submission a value belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    One,
    Two,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::One => write!(f, "side 1"),
            Side::Two => write!(f, "side 2"),
        }
    }
}

/// Kind of game being recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameKind {
    Singles,
    Doubles,
}

impl GameKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameKind::Singles => "singles",
            GameKind::Doubles => "doubles",
        }
    }
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a game from one participant's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Win,
    Loss,
    Draw,
}

impl Outcome {
    /// Resolve the outcome for the owner of `own` against `other`
    pub fn from_scores(own: u8, other: u8) -> Self {
        match own.cmp(&other) {
            std::cmp::Ordering::Greater => Outcome::Win,
            std::cmp::Ordering::Less => Outcome::Loss,
            std::cmp::Ordering::Equal => Outcome::Draw,
        }
    }

    /// The same result seen from the opponent's side
    pub fn reversed(self) -> Self {
        match self {
            Outcome::Win => Outcome::Loss,
            Outcome::Loss => Outcome::Win,
            Outcome::Draw => Outcome::Draw,
        }
    }
}

/// Win/loss/draw tally for one game mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordCounters {
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub games_played: u32,
}

impl RecordCounters {
    /// Count one more game with the given outcome
    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Win => self.wins += 1,
            Outcome::Loss => self.losses += 1,
            Outcome::Draw => self.draws += 1,
        }
        self.games_played += 1;
    }
}

/// A registered player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub rating: i32,
    pub singles: RecordCounters,
    pub doubles: RecordCounters,
    /// Bumped on every committed change to this row
    pub revision: u64,
    pub created_at: DateTime<Utc>,
}

/// Order-independent identity of a two-player team
///
/// The lower player id is always stored first, so `(a, b)` and `(b, a)`
/// produce equal keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TeamKey {
    low: PlayerId,
    high: PlayerId,
}

impl TeamKey {
    /// Build the canonical key, or `None` when both ids are the same player
    pub fn new(a: PlayerId, b: PlayerId) -> Option<Self> {
        match a.cmp(&b) {
            std::cmp::Ordering::Less => Some(Self { low: a, high: b }),
            std::cmp::Ordering::Greater => Some(Self { low: b, high: a }),
            std::cmp::Ordering::Equal => None,
        }
    }

    pub fn players(&self) -> [PlayerId; 2] {
        [self.low, self.high]
    }

    pub fn contains(&self, player_id: PlayerId) -> bool {
        self.low == player_id || self.high == player_id
    }

    pub fn shares_player_with(&self, other: &TeamKey) -> bool {
        other.contains(self.low) || other.contains(self.high)
    }
}

impl fmt::Display for TeamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}, {}}}", self.low, self.high)
    }
}

/// A persisted doubles pairing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    /// Members in the order of the submission that created the team
    pub player1: PlayerId,
    pub player2: PlayerId,
    pub rating: i32,
    pub record: RecordCounters,
    pub revision: u64,
    pub created_at: DateTime<Utc>,
}

impl Team {
    pub fn key(&self) -> TeamKey {
        // player1 != player2 is enforced when a team is inserted
        TeamKey::new(self.player1, self.player2).unwrap_or(TeamKey {
            low: self.player1,
            high: self.player2,
        })
    }

    pub fn members(&self) -> [PlayerId; 2] {
        [self.player1, self.player2]
    }
}

/// One competitor's line in a game record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSide<Id> {
    pub competitor: Id,
    pub score: u8,
    pub start_rating: i32,
    pub end_rating: i32,
}

impl<Id> GameSide<Id> {
    pub fn rating_change(&self) -> i32 {
        self.end_rating - self.start_rating
    }
}

/// Immutable record of an accepted game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord<Id> {
    pub id: GameId,
    pub side1: GameSide<Id>,
    pub side2: GameSide<Id>,
    pub played_at: DateTime<Utc>,
}

impl<Id: Copy + PartialEq> GameRecord<Id> {
    /// Outcome from side 1's perspective
    pub fn outcome(&self) -> Outcome {
        Outcome::from_scores(self.side1.score, self.side2.score)
    }

    pub fn winner(&self) -> Option<Id> {
        match self.outcome() {
            Outcome::Win => Some(self.side1.competitor),
            Outcome::Loss => Some(self.side2.competitor),
            Outcome::Draw => None,
        }
    }

    pub fn involves(&self, competitor: Id) -> bool {
        self.side1.competitor == competitor || self.side2.competitor == competitor
    }

    /// Outcome for `competitor`, or `None` if it did not take part
    pub fn outcome_for(&self, competitor: Id) -> Option<Outcome> {
        if self.side1.competitor == competitor {
            Some(self.outcome())
        } else if self.side2.competitor == competitor {
            Some(self.outcome().reversed())
        } else {
            None
        }
    }
}

/// 1v1 game between two players
pub type SinglesGame = GameRecord<PlayerId>;

/// 2v2 game between two teams
pub type DoublesGame = GameRecord<TeamId>;
