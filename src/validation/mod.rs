//! Submission validation
//!
//! Score house rules plus the typed request structs the recorder accepts.

pub mod scores;
pub mod submission;

pub use scores::{check_house_rules, parse_score, validate_scores, RawScore, ValidatedScore};
pub use submission::{parse_id, DoublesSubmission, SinglesSubmission};
