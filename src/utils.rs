//! Utility functions for the ladder service

use chrono::{DateTime, Utc};

/// Get the current UTC timestamp
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now()
}

/// Express a probability in [0, 1] as a percentage with one decimal place
///
/// Halves round away from zero.
pub fn to_percentage(probability: f64) -> f64 {
    (probability * 1000.0).round() / 10.0
}

/// Treat a missing or blank form field as absent
pub fn non_blank(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|value| !value.is_empty())
}
