//! In-memory storage implementation
//!
//! All tables live behind a single `RwLock`. Commits check every row they
//! touch before mutating any of them, so a failed commit leaves no trace.

use crate::error::StorageError;
use crate::storage::{
    DoublesCommit, GameCommit, LadderStorage, ParticipantUpdate, StorageCounts, StorageResult,
};
use crate::types::{
    DoublesGame, GameId, GameRecord, GameSide, Player, PlayerId, RecordCounters, SinglesGame,
    Team, TeamId, TeamKey,
};
use crate::utils::current_timestamp;
use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

#[derive(Debug, Default)]
struct LadderTables {
    players: BTreeMap<PlayerId, Player>,
    teams: BTreeMap<TeamId, Team>,
    team_index: HashMap<TeamKey, TeamId>,
    singles: Vec<SinglesGame>,
    doubles: Vec<DoublesGame>,
    last_player_id: u64,
    last_team_id: u64,
    last_singles_id: u64,
    last_doubles_id: u64,
}

/// In-memory ladder storage
#[derive(Debug, Default)]
pub struct InMemoryLadderStorage {
    tables: RwLock<LadderTables>,
}

impl InMemoryLadderStorage {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StorageResult<RwLockReadGuard<'_, LadderTables>> {
        self.tables
            .read()
            .map_err(|_| StorageError::LockPoisoned { lock: "ladder read" })
    }

    fn write(&self) -> StorageResult<RwLockWriteGuard<'_, LadderTables>> {
        self.tables
            .write()
            .map_err(|_| StorageError::LockPoisoned {
                lock: "ladder write",
            })
    }
}

fn check_player(tables: &LadderTables, update: &ParticipantUpdate<PlayerId>) -> StorageResult<()> {
    let player = tables
        .players
        .get(&update.id)
        .ok_or_else(|| StorageError::MissingRecord {
            record: format!("player {}", update.id),
        })?;

    if player.revision != update.expected_revision || player.rating != update.start_rating {
        return Err(StorageError::Conflict {
            record: format!("player {}", update.id),
        });
    }
    Ok(())
}

fn check_team(tables: &LadderTables, update: &ParticipantUpdate<TeamId>) -> StorageResult<()> {
    let team = tables
        .teams
        .get(&update.id)
        .ok_or_else(|| StorageError::MissingRecord {
            record: format!("team {}", update.id),
        })?;

    if team.revision != update.expected_revision || team.rating != update.start_rating {
        return Err(StorageError::Conflict {
            record: format!("team {}", update.id),
        });
    }
    Ok(())
}

fn game_sides<Id: Copy>(commit: &GameCommit<Id>) -> (GameSide<Id>, GameSide<Id>) {
    (
        GameSide {
            competitor: commit.side1.id,
            score: commit.score1,
            start_rating: commit.side1.start_rating,
            end_rating: commit.side1.end_rating,
        },
        GameSide {
            competitor: commit.side2.id,
            score: commit.score2,
            start_rating: commit.side2.start_rating,
            end_rating: commit.side2.end_rating,
        },
    )
}

impl LadderStorage for InMemoryLadderStorage {
    fn create_player(&self, name: &str, rating: i32) -> StorageResult<Player> {
        let mut tables = self.write()?;

        tables.last_player_id += 1;
        let player = Player {
            id: PlayerId(tables.last_player_id),
            name: name.to_string(),
            rating,
            singles: RecordCounters::default(),
            doubles: RecordCounters::default(),
            revision: 0,
            created_at: current_timestamp(),
        };
        tables.players.insert(player.id, player.clone());

        Ok(player)
    }

    fn get_player(&self, player_id: PlayerId) -> StorageResult<Option<Player>> {
        Ok(self.read()?.players.get(&player_id).cloned())
    }

    fn get_players(&self, player_ids: &[PlayerId]) -> StorageResult<HashMap<PlayerId, Player>> {
        let tables = self.read()?;

        let mut result = HashMap::new();
        for player_id in player_ids {
            if let Some(player) = tables.players.get(player_id) {
                result.insert(*player_id, player.clone());
            }
        }

        Ok(result)
    }

    fn list_players(&self) -> StorageResult<Vec<Player>> {
        Ok(self.read()?.players.values().cloned().collect())
    }

    fn get_team(&self, team_id: TeamId) -> StorageResult<Option<Team>> {
        Ok(self.read()?.teams.get(&team_id).cloned())
    }

    fn find_team(&self, key: TeamKey) -> StorageResult<Option<Team>> {
        let tables = self.read()?;

        Ok(tables
            .team_index
            .get(&key)
            .and_then(|team_id| tables.teams.get(team_id))
            .cloned())
    }

    fn insert_team(
        &self,
        player1: PlayerId,
        player2: PlayerId,
        rating: i32,
    ) -> StorageResult<Team> {
        let key = TeamKey::new(player1, player2).ok_or(StorageError::DuplicateTeam {
            player_a: player1,
            player_b: player2,
        })?;

        let mut tables = self.write()?;

        if tables.team_index.contains_key(&key) {
            return Err(StorageError::DuplicateTeam {
                player_a: player1,
                player_b: player2,
            });
        }
        for player_id in key.players() {
            if !tables.players.contains_key(&player_id) {
                return Err(StorageError::MissingRecord {
                    record: format!("player {}", player_id),
                });
            }
        }

        tables.last_team_id += 1;
        let team = Team {
            id: TeamId(tables.last_team_id),
            player1,
            player2,
            rating,
            record: RecordCounters::default(),
            revision: 0,
            created_at: current_timestamp(),
        };
        tables.team_index.insert(key, team.id);
        tables.teams.insert(team.id, team.clone());

        debug!("Inserted team {} for players {}", team.id, key);
        Ok(team)
    }

    fn list_teams(&self) -> StorageResult<Vec<Team>> {
        Ok(self.read()?.teams.values().cloned().collect())
    }

    fn commit_singles(&self, commit: GameCommit<PlayerId>) -> StorageResult<SinglesGame> {
        let mut tables = self.write()?;

        check_player(&tables, &commit.side1)?;
        check_player(&tables, &commit.side2)?;

        for update in [&commit.side1, &commit.side2] {
            if let Some(player) = tables.players.get_mut(&update.id) {
                player.rating = update.end_rating;
                player.singles.record(update.outcome);
                player.revision += 1;
            }
        }

        tables.last_singles_id += 1;
        let (side1, side2) = game_sides(&commit);
        let game = GameRecord {
            id: GameId(tables.last_singles_id),
            side1,
            side2,
            played_at: commit.played_at,
        };
        tables.singles.push(game.clone());

        Ok(game)
    }

    fn commit_doubles(&self, commit: DoublesCommit) -> StorageResult<DoublesGame> {
        let mut tables = self.write()?;

        check_team(&tables, &commit.game.side1)?;
        check_team(&tables, &commit.game.side2)?;
        for (player_id, _) in &commit.member_outcomes {
            if !tables.players.contains_key(player_id) {
                return Err(StorageError::MissingRecord {
                    record: format!("player {}", player_id),
                });
            }
        }

        for update in [&commit.game.side1, &commit.game.side2] {
            if let Some(team) = tables.teams.get_mut(&update.id) {
                team.rating = update.end_rating;
                team.record.record(update.outcome);
                team.revision += 1;
            }
        }
        for (player_id, outcome) in &commit.member_outcomes {
            if let Some(player) = tables.players.get_mut(player_id) {
                player.doubles.record(*outcome);
                player.revision += 1;
            }
        }

        tables.last_doubles_id += 1;
        let (side1, side2) = game_sides(&commit.game);
        let game = GameRecord {
            id: GameId(tables.last_doubles_id),
            side1,
            side2,
            played_at: commit.game.played_at,
        };
        tables.doubles.push(game.clone());

        Ok(game)
    }

    fn singles_games(&self) -> StorageResult<Vec<SinglesGame>> {
        Ok(self.read()?.singles.clone())
    }

    fn doubles_games(&self) -> StorageResult<Vec<DoublesGame>> {
        Ok(self.read()?.doubles.clone())
    }

    fn counts(&self) -> StorageResult<StorageCounts> {
        let tables = self.read()?;

        Ok(StorageCounts {
            players: tables.players.len(),
            teams: tables.teams.len(),
            singles_games: tables.singles.len(),
            doubles_games: tables.doubles.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Outcome;

    fn singles_commit(
        a: &Player,
        b: &Player,
        end_a: i32,
        end_b: i32,
        outcome_a: Outcome,
    ) -> GameCommit<PlayerId> {
        GameCommit {
            side1: ParticipantUpdate {
                id: a.id,
                expected_revision: a.revision,
                start_rating: a.rating,
                end_rating: end_a,
                outcome: outcome_a,
            },
            side2: ParticipantUpdate {
                id: b.id,
                expected_revision: b.revision,
                start_rating: b.rating,
                end_rating: end_b,
                outcome: outcome_a.reversed(),
            },
            score1: 11,
            score2: 9,
            played_at: current_timestamp(),
        }
    }

    #[test]
    fn test_player_ids_are_assigned_sequentially() {
        let storage = InMemoryLadderStorage::new();
        let alice = storage.create_player("Alice", 1000).unwrap();
        let bob = storage.create_player("Bob", 1000).unwrap();

        assert_eq!(alice.id, PlayerId(1));
        assert_eq!(bob.id, PlayerId(2));
        assert_eq!(storage.get_player(bob.id).unwrap().unwrap().name, "Bob");
        assert!(storage.get_player(PlayerId(99)).unwrap().is_none());

        let found = storage
            .get_players(&[alice.id, PlayerId(99), bob.id])
            .unwrap();
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_team_insert_is_unique_per_pair() {
        let storage = InMemoryLadderStorage::new();
        let a = storage.create_player("A", 1000).unwrap();
        let b = storage.create_player("B", 1000).unwrap();

        let team = storage.insert_team(b.id, a.id, 1000).unwrap();
        assert_eq!(team.player1, b.id);

        let key = TeamKey::new(a.id, b.id).unwrap();
        assert_eq!(storage.find_team(key).unwrap().unwrap().id, team.id);

        let duplicate = storage.insert_team(a.id, b.id, 1000);
        assert!(matches!(duplicate, Err(StorageError::DuplicateTeam { .. })));
        assert_eq!(storage.list_teams().unwrap().len(), 1);
    }

    #[test]
    fn test_team_insert_requires_players() {
        let storage = InMemoryLadderStorage::new();
        let a = storage.create_player("A", 1000).unwrap();

        let result = storage.insert_team(a.id, PlayerId(42), 1000);
        assert!(matches!(result, Err(StorageError::MissingRecord { .. })));
        assert!(storage.list_teams().unwrap().is_empty());
    }

    #[test]
    fn test_commit_singles_updates_both_players() {
        let storage = InMemoryLadderStorage::new();
        let alice = storage.create_player("Alice", 1000).unwrap();
        let bob = storage.create_player("Bob", 1000).unwrap();

        let game = storage
            .commit_singles(singles_commit(&alice, &bob, 1016, 984, Outcome::Win))
            .unwrap();
        assert_eq!(game.id, GameId(1));
        assert_eq!(game.side1.start_rating, 1000);
        assert_eq!(game.side1.end_rating, 1016);

        let alice = storage.get_player(alice.id).unwrap().unwrap();
        let bob = storage.get_player(bob.id).unwrap().unwrap();
        assert_eq!(alice.rating, 1016);
        assert_eq!(alice.singles.wins, 1);
        assert_eq!(alice.revision, 1);
        assert_eq!(bob.rating, 984);
        assert_eq!(bob.singles.losses, 1);
        assert_eq!(bob.doubles, RecordCounters::default());
    }

    #[test]
    fn test_stale_commit_is_rejected_without_changes() {
        let storage = InMemoryLadderStorage::new();
        let alice = storage.create_player("Alice", 1000).unwrap();
        let bob = storage.create_player("Bob", 1000).unwrap();

        let first = singles_commit(&alice, &bob, 1016, 984, Outcome::Win);
        let stale = singles_commit(&alice, &bob, 984, 1016, Outcome::Loss);
        storage.commit_singles(first).unwrap();

        let result = storage.commit_singles(stale);
        assert!(matches!(result, Err(StorageError::Conflict { .. })));

        let counts = storage.counts().unwrap();
        assert_eq!(counts.singles_games, 1);
        let alice = storage.get_player(alice.id).unwrap().unwrap();
        assert_eq!(alice.rating, 1016);
        assert_eq!(alice.singles.games_played, 1);
    }

    #[test]
    fn test_commit_with_missing_player_changes_nothing() {
        let storage = InMemoryLadderStorage::new();
        let alice = storage.create_player("Alice", 1000).unwrap();
        let mut ghost = alice.clone();
        ghost.id = PlayerId(77);

        let result = storage.commit_singles(singles_commit(&alice, &ghost, 1016, 984, Outcome::Win));
        assert!(matches!(result, Err(StorageError::MissingRecord { .. })));

        let alice = storage.get_player(alice.id).unwrap().unwrap();
        assert_eq!(alice.rating, 1000);
        assert_eq!(alice.revision, 0);
        assert!(storage.singles_games().unwrap().is_empty());
    }

    #[test]
    fn test_commit_doubles_updates_teams_and_members() {
        let storage = InMemoryLadderStorage::new();
        let ids: Vec<PlayerId> = ["C", "D", "E", "F"]
            .iter()
            .map(|name| storage.create_player(name, 1000).unwrap().id)
            .collect();
        let team1 = storage.insert_team(ids[0], ids[1], 1000).unwrap();
        let team2 = storage.insert_team(ids[2], ids[3], 1000).unwrap();

        let commit = DoublesCommit {
            game: GameCommit {
                side1: ParticipantUpdate {
                    id: team1.id,
                    expected_revision: 0,
                    start_rating: 1000,
                    end_rating: 1000,
                    outcome: Outcome::Draw,
                },
                side2: ParticipantUpdate {
                    id: team2.id,
                    expected_revision: 0,
                    start_rating: 1000,
                    end_rating: 1000,
                    outcome: Outcome::Draw,
                },
                score1: 4,
                score2: 4,
                played_at: current_timestamp(),
            },
            member_outcomes: ids.iter().map(|id| (*id, Outcome::Draw)).collect(),
        };

        let game = storage.commit_doubles(commit).unwrap();
        assert_eq!(game.side1.competitor, team1.id);

        let team1 = storage.get_team(team1.id).unwrap().unwrap();
        assert_eq!(team1.record.draws, 1);
        assert_eq!(team1.revision, 1);
        for id in ids {
            let player = storage.get_player(id).unwrap().unwrap();
            assert_eq!(player.doubles.draws, 1);
            assert_eq!(player.singles.games_played, 0);
        }
    }
}
