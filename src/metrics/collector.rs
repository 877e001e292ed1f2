//! Metrics collection using Prometheus
//!
//! This module provides metrics collection for the foos-ladder service
//! using Prometheus metrics.

use crate::types::GameKind;
use anyhow::Result;
use prometheus::{
    HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Main metrics collector for the ladder service
#[derive(Clone)]
pub struct MetricsCollector {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Game recording metrics
    recording_metrics: RecordingMetrics,

    /// Roster metrics
    roster_metrics: RosterMetrics,
}

/// Game recording metrics
#[derive(Clone)]
pub struct RecordingMetrics {
    /// Accepted games by kind
    pub games_recorded_total: IntCounterVec,

    /// Rejected submissions by kind and error
    pub submissions_rejected_total: IntCounterVec,

    /// Commits retried after a concurrent update
    pub commit_conflicts_total: IntCounter,

    /// Time from submission to committed game
    pub recording_duration_seconds: HistogramVec,
}

/// Player and team roster metrics
#[derive(Clone)]
pub struct RosterMetrics {
    /// Registered players
    pub players_registered: IntGauge,

    /// Teams created on first doubles submission
    pub teams_created_total: IntCounter,
}

impl MetricsCollector {
    /// Create a new metrics collector with default registry
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        Self::with_registry(registry)
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let recording_metrics = RecordingMetrics::new(&registry)?;
        let roster_metrics = RosterMetrics::new(&registry)?;

        Ok(Self {
            registry,
            recording_metrics,
            roster_metrics,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    /// Get recording metrics
    pub fn recording(&self) -> &RecordingMetrics {
        &self.recording_metrics
    }

    /// Get roster metrics
    pub fn roster(&self) -> &RosterMetrics {
        &self.roster_metrics
    }

    /// Record an accepted game
    pub fn record_game(&self, kind: GameKind, duration: Duration) {
        self.recording_metrics
            .games_recorded_total
            .with_label_values(&[kind.as_str()])
            .inc();

        self.recording_metrics
            .recording_duration_seconds
            .with_label_values(&[kind.as_str()])
            .observe(duration.as_secs_f64());
    }

    /// Record a rejected or failed submission
    pub fn record_rejection(&self, kind: GameKind, reason: &str) {
        self.recording_metrics
            .submissions_rejected_total
            .with_label_values(&[kind.as_str(), reason])
            .inc();
    }

    /// Record a commit that lost a race and will be retried
    pub fn record_commit_conflict(&self) {
        self.recording_metrics.commit_conflicts_total.inc();
    }

    /// Record a newly created team
    pub fn record_team_created(&self) {
        self.roster_metrics.teams_created_total.inc();
    }

    /// Update the registered player gauge
    pub fn set_players_registered(&self, count: usize) {
        self.roster_metrics.players_registered.set(count as i64);
    }

    /// Create a timer for measuring operation duration
    pub fn start_timer(&self) -> MetricsTimer {
        MetricsTimer::new()
    }
}

/// Timer for measuring operation durations
pub struct MetricsTimer {
    start: Instant,
}

impl MetricsTimer {
    fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get the elapsed duration
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop the timer and return the duration
    pub fn stop(self) -> Duration {
        self.elapsed()
    }
}

impl RecordingMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let games_recorded_total = IntCounterVec::new(
            Opts::new("foos_ladder_games_recorded_total", "Total games recorded"),
            &["kind"],
        )?;
        registry.register(Box::new(games_recorded_total.clone()))?;

        let submissions_rejected_total = IntCounterVec::new(
            Opts::new(
                "foos_ladder_submissions_rejected_total",
                "Total game submissions rejected",
            ),
            &["kind", "reason"],
        )?;
        registry.register(Box::new(submissions_rejected_total.clone()))?;

        let commit_conflicts_total = IntCounter::new(
            "foos_ladder_commit_conflicts_total",
            "Commits retried after a concurrent update",
        )?;
        registry.register(Box::new(commit_conflicts_total.clone()))?;

        let recording_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "foos_ladder_recording_duration_seconds",
                "Game recording time",
            )
            .buckets(vec![0.0001, 0.001, 0.005, 0.01, 0.05, 0.1]),
            &["kind"],
        )?;
        registry.register(Box::new(recording_duration_seconds.clone()))?;

        Ok(Self {
            games_recorded_total,
            submissions_rejected_total,
            commit_conflicts_total,
            recording_duration_seconds,
        })
    }
}

impl RosterMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let players_registered =
            IntGauge::new("foos_ladder_players_registered", "Registered players")?;
        registry.register(Box::new(players_registered.clone()))?;

        let teams_created_total =
            IntCounter::new("foos_ladder_teams_created_total", "Total teams created")?;
        registry.register(Box::new(teams_created_total.clone()))?;

        Ok(Self {
            players_registered,
            teams_created_total,
        })
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new().expect("Failed to create default metrics collector")
    }
}
