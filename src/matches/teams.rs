//! Canonical team resolution
//!
//! A team is the unordered pair of its two players. Resolution is a
//! get-or-create keyed on [`TeamKey`], so `(a, b)` and `(b, a)` always land
//! on the same row.

use crate::error::{LadderError, Result, StorageError};
use crate::metrics::MetricsCollector;
use crate::storage::LadderStorage;
use crate::types::{PlayerId, Team, TeamKey};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Resolves player pairs to their persisted team
#[derive(Clone)]
pub struct TeamResolver {
    storage: Arc<dyn LadderStorage>,
    metrics: Arc<MetricsCollector>,
    initial_rating: i32,
}

impl TeamResolver {
    pub fn new(
        storage: Arc<dyn LadderStorage>,
        metrics: Arc<MetricsCollector>,
        initial_rating: i32,
    ) -> Self {
        Self {
            storage,
            metrics,
            initial_rating,
        }
    }

    /// Return the team for `{player_a, player_b}`, creating it on first use
    pub fn resolve(&self, player_a: PlayerId, player_b: PlayerId) -> Result<Team> {
        for player_id in [player_a, player_b] {
            if self.storage.get_player(player_id)?.is_none() {
                return Err(LadderError::UnknownPlayer { player_id });
            }
        }

        let key = TeamKey::new(player_a, player_b).ok_or(LadderError::DuplicateCompetitor)?;
        self.resolve_key(key, player_a, player_b)
    }

    /// Get-or-create for a key whose players are already known to exist
    pub(crate) fn resolve_key(
        &self,
        key: TeamKey,
        player1: PlayerId,
        player2: PlayerId,
    ) -> Result<Team> {
        if let Some(team) = self.storage.find_team(key)? {
            debug!("Resolved existing team {} for {}", team.id, key);
            return Ok(team);
        }

        match self.storage.insert_team(player1, player2, self.initial_rating) {
            Ok(team) => {
                info!("Created team {} for players {}", team.id, key);
                self.metrics.record_team_created();
                Ok(team)
            }
            Err(StorageError::DuplicateTeam { .. }) => {
                // Another submission created the pair between our read and insert
                warn!("Team for {} created concurrently, re-reading", key);
                self.storage.find_team(key)?.ok_or_else(|| {
                    LadderError::Storage(StorageError::MissingRecord {
                        record: format!("team {}", key),
                    })
                })
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{InMemoryLadderStorage, MockLadderStorage};
    use crate::types::{RecordCounters, TeamId};
    use crate::utils::current_timestamp;
    use mockall::predicate::eq;
    use mockall::Sequence;

    fn resolver_with(storage: Arc<dyn LadderStorage>) -> TeamResolver {
        TeamResolver::new(storage, Arc::new(MetricsCollector::default()), 1000)
    }

    fn team(id: u64, player1: u64, player2: u64) -> Team {
        Team {
            id: TeamId(id),
            player1: PlayerId(player1),
            player2: PlayerId(player2),
            rating: 1000,
            record: RecordCounters::default(),
            revision: 0,
            created_at: current_timestamp(),
        }
    }

    #[test]
    fn test_resolve_is_order_independent() {
        let storage = Arc::new(InMemoryLadderStorage::new());
        let a = storage.create_player("A", 1000).unwrap();
        let b = storage.create_player("B", 1000).unwrap();
        let resolver = resolver_with(storage.clone());

        let first = resolver.resolve(a.id, b.id).unwrap();
        let second = resolver.resolve(b.id, a.id).unwrap();
        let third = resolver.resolve(a.id, b.id).unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.id, third.id);
        assert_eq!(first.rating, 1000);
        assert_eq!(first.record, RecordCounters::default());
        assert_eq!(storage.list_teams().unwrap().len(), 1);
    }

    #[test]
    fn test_resolve_rejects_unknown_and_duplicate_players() {
        let storage = Arc::new(InMemoryLadderStorage::new());
        let a = storage.create_player("A", 1000).unwrap();
        let resolver = resolver_with(storage.clone());

        assert_eq!(
            resolver.resolve(a.id, PlayerId(9)).unwrap_err(),
            LadderError::UnknownPlayer {
                player_id: PlayerId(9)
            }
        );
        assert_eq!(
            resolver.resolve(a.id, a.id).unwrap_err(),
            LadderError::DuplicateCompetitor
        );
        assert!(storage.list_teams().unwrap().is_empty());
    }

    #[test]
    fn test_lost_insert_race_rereads_once() {
        let mut storage = MockLadderStorage::new();
        let key = TeamKey::new(PlayerId(1), PlayerId(2)).unwrap();
        let mut seq = Sequence::new();

        storage
            .expect_find_team()
            .with(eq(key))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(None));
        storage
            .expect_insert_team()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|a, b, _| {
                Err(StorageError::DuplicateTeam {
                    player_a: a,
                    player_b: b,
                })
            });
        storage
            .expect_find_team()
            .with(eq(key))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(Some(team(7, 2, 1))));

        let resolver = resolver_with(Arc::new(storage));
        let resolved = resolver
            .resolve_key(key, PlayerId(1), PlayerId(2))
            .unwrap();
        assert_eq!(resolved.id, TeamId(7));
    }

    #[test]
    fn test_storage_failure_is_surfaced() {
        let mut storage = MockLadderStorage::new();
        storage.expect_find_team().returning(|_| Ok(None));
        storage.expect_insert_team().returning(|_, _, _| {
            Err(StorageError::LockPoisoned {
                lock: "ladder write",
            })
        });

        let resolver = resolver_with(Arc::new(storage));
        let key = TeamKey::new(PlayerId(1), PlayerId(2)).unwrap();
        let err = resolver
            .resolve_key(key, PlayerId(1), PlayerId(2))
            .unwrap_err();
        assert_eq!(err.kind(), "storage_error");
    }
}
