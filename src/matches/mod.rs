//! Game submission handling
//!
//! [`MatchRecorder`] accepts singles and doubles results; [`TeamResolver`]
//! maps player pairs onto canonical team rows.

pub mod recorder;
pub mod teams;

pub use recorder::{MatchRecorder, RecentGames};
pub use teams::TeamResolver;
