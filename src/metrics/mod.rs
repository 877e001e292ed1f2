//! Metrics for the foos-ladder service
//!
//! Prometheus counters and histograms for game recording, exposed by the
//! HTTP server at `/metrics`.

pub mod collector;

pub use collector::{MetricsCollector, MetricsTimer, RecordingMetrics, RosterMetrics};
