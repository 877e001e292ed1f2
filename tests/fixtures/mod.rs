//! Test fixtures and storage wrappers for integration testing

#![allow(dead_code)]

use foos_ladder::config::RecorderSettings;
use foos_ladder::error::StorageError;
use foos_ladder::matches::MatchRecorder;
use foos_ladder::metrics::MetricsCollector;
use foos_ladder::rating::EloRatingCalculator;
use foos_ladder::storage::{
    DoublesCommit, GameCommit, InMemoryLadderStorage, LadderStorage, StorageCounts,
    StorageResult,
};
use foos_ladder::types::{DoublesGame, Player, PlayerId, SinglesGame, Team, TeamId, TeamKey};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Runs against the inner store just before a commit reaches it
pub type CommitHook = Box<dyn FnOnce(&InMemoryLadderStorage) + Send>;

/// In-memory storage that can fail or interleave with commits on demand
#[derive(Default)]
pub struct FlakyStorage {
    inner: InMemoryLadderStorage,
    failures: Mutex<Vec<StorageError>>,
    before_commit: Mutex<Option<CommitHook>>,
    commit_calls: AtomicUsize,
}

impl FlakyStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inner(&self) -> &InMemoryLadderStorage {
        &self.inner
    }

    /// Fail the next commits with these errors, in order
    pub fn fail_next_commits(&self, errors: Vec<StorageError>) {
        let mut failures = self.failures.lock().unwrap();
        *failures = errors;
        failures.reverse();
    }

    /// Run `hook` once, right before the next commit is applied
    pub fn before_next_commit(&self, hook: CommitHook) {
        *self.before_commit.lock().unwrap() = Some(hook);
    }

    pub fn commit_calls(&self) -> usize {
        self.commit_calls.load(Ordering::SeqCst)
    }

    fn prepare_commit(&self) -> StorageResult<()> {
        self.commit_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(hook) = self.before_commit.lock().unwrap().take() {
            hook(&self.inner);
        }

        match self.failures.lock().unwrap().pop() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl LadderStorage for FlakyStorage {
    fn create_player(&self, name: &str, rating: i32) -> StorageResult<Player> {
        self.inner.create_player(name, rating)
    }

    fn get_player(&self, player_id: PlayerId) -> StorageResult<Option<Player>> {
        self.inner.get_player(player_id)
    }

    fn get_players(&self, player_ids: &[PlayerId]) -> StorageResult<HashMap<PlayerId, Player>> {
        self.inner.get_players(player_ids)
    }

    fn list_players(&self) -> StorageResult<Vec<Player>> {
        self.inner.list_players()
    }

    fn get_team(&self, team_id: TeamId) -> StorageResult<Option<Team>> {
        self.inner.get_team(team_id)
    }

    fn find_team(&self, key: TeamKey) -> StorageResult<Option<Team>> {
        self.inner.find_team(key)
    }

    fn insert_team(
        &self,
        player1: PlayerId,
        player2: PlayerId,
        rating: i32,
    ) -> StorageResult<Team> {
        self.inner.insert_team(player1, player2, rating)
    }

    fn list_teams(&self) -> StorageResult<Vec<Team>> {
        self.inner.list_teams()
    }

    fn commit_singles(&self, commit: GameCommit<PlayerId>) -> StorageResult<SinglesGame> {
        self.prepare_commit()?;
        self.inner.commit_singles(commit)
    }

    fn commit_doubles(&self, commit: DoublesCommit) -> StorageResult<DoublesGame> {
        self.prepare_commit()?;
        self.inner.commit_doubles(commit)
    }

    fn singles_games(&self) -> StorageResult<Vec<SinglesGame>> {
        self.inner.singles_games()
    }

    fn doubles_games(&self) -> StorageResult<Vec<DoublesGame>> {
        self.inner.doubles_games()
    }

    fn counts(&self) -> StorageResult<StorageCounts> {
        self.inner.counts()
    }
}

/// Recorder over `storage` with default Elo settings
pub fn recorder_over(
    storage: Arc<dyn LadderStorage>,
    max_commit_attempts: u32,
) -> (MatchRecorder, Arc<MetricsCollector>) {
    let metrics = Arc::new(MetricsCollector::new().expect("Failed to create metrics collector"));
    let recorder = MatchRecorder::new(
        storage,
        Arc::new(EloRatingCalculator::default()),
        metrics.clone(),
        RecorderSettings {
            max_commit_attempts,
            ..Default::default()
        },
    );
    (recorder, metrics)
}

/// Register players by name and return their ids in order
pub fn register_all(recorder: &MatchRecorder, names: &[&str]) -> Vec<PlayerId> {
    names
        .iter()
        .map(|name| recorder.register_player(name).unwrap().id)
        .collect()
}
