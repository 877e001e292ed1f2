//! Typed submission requests and identifier parsing
//!
//! Submissions carry every field as raw optional text, the way it comes out
//! of an HTML form or a loosely typed JSON body. Parsing happens in the core
//! so a missing or malformed field becomes `InvalidInput` naming the field.

use crate::error::{LadderError, Result};
use crate::utils::non_blank;
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::str::FromStr;

/// Accept a field as text, a JSON number or null
fn lenient_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => Ok(Some(text)),
        Some(Value::Number(number)) => Ok(Some(number.to_string())),
        Some(other) => Err(de::Error::custom(format!(
            "expected text or a number, found {}",
            other
        ))),
    }
}

/// A 1v1 result as submitted
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SinglesSubmission {
    #[serde(deserialize_with = "lenient_text")]
    pub player1: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub player2: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub player1_score: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub player2_score: Option<String>,
}

impl SinglesSubmission {
    pub fn new(
        player1: impl ToString,
        player2: impl ToString,
        player1_score: impl ToString,
        player2_score: impl ToString,
    ) -> Self {
        Self {
            player1: Some(player1.to_string()),
            player2: Some(player2.to_string()),
            player1_score: Some(player1_score.to_string()),
            player2_score: Some(player2_score.to_string()),
        }
    }
}

/// A 2v2 result as submitted
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DoublesSubmission {
    #[serde(deserialize_with = "lenient_text")]
    pub team1player1: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub team1player2: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub team2player1: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub team2player2: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub team1_score: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub team2_score: Option<String>,
}

impl DoublesSubmission {
    pub fn new(
        team1: [impl ToString; 2],
        team2: [impl ToString; 2],
        team1_score: impl ToString,
        team2_score: impl ToString,
    ) -> Self {
        let [t1p1, t1p2] = team1;
        let [t2p1, t2p2] = team2;
        Self {
            team1player1: Some(t1p1.to_string()),
            team1player2: Some(t1p2.to_string()),
            team2player1: Some(t2p1.to_string()),
            team2player2: Some(t2p2.to_string()),
            team1_score: Some(team1_score.to_string()),
            team2_score: Some(team2_score.to_string()),
        }
    }
}

/// Parse a required identifier field
pub fn parse_id<T: FromStr>(field: &str, raw: Option<&str>) -> Result<T> {
    non_blank(raw)
        .and_then(|text| text.parse().ok())
        .ok_or_else(|| LadderError::invalid_input(field))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PlayerId;

    #[test]
    fn test_parse_id() {
        let id: PlayerId = parse_id("player1", Some("42")).unwrap();
        assert_eq!(id, PlayerId(42));

        assert_eq!(
            parse_id::<PlayerId>("player1", None),
            Err(LadderError::invalid_input("player1"))
        );
        assert_eq!(
            parse_id::<PlayerId>("player2", Some("")),
            Err(LadderError::invalid_input("player2"))
        );
        assert_eq!(
            parse_id::<PlayerId>("player2", Some("bob")),
            Err(LadderError::invalid_input("player2"))
        );
    }

    #[test]
    fn test_submission_from_partial_json() {
        let submission: SinglesSubmission =
            serde_json::from_str(r#"{"player1": "1", "player2": "2", "player1_score": "10"}"#)
                .unwrap();
        assert_eq!(submission.player1.as_deref(), Some("1"));
        assert_eq!(submission.player2_score, None);
    }

    #[test]
    fn test_submission_accepts_numbers() {
        let submission: DoublesSubmission = serde_json::from_str(
            r#"{"team1player1": 1, "team1player2": "2", "team2player1": 3,
                "team2player2": 4, "team1_score": 10, "team2_score": null}"#,
        )
        .unwrap();
        assert_eq!(submission.team1player1.as_deref(), Some("1"));
        assert_eq!(submission.team1_score.as_deref(), Some("10"));
        assert_eq!(submission.team2_score, None);

        // Non-integral numbers survive as text and fail later as invalid input
        let submission: SinglesSubmission =
            serde_json::from_str(r#"{"player1_score": 7.5}"#).unwrap();
        assert_eq!(submission.player1_score.as_deref(), Some("7.5"));
    }

    #[test]
    fn test_structured_field_values_are_rejected() {
        assert!(serde_json::from_str::<SinglesSubmission>(r#"{"player1": [1]}"#).is_err());
        assert!(serde_json::from_str::<SinglesSubmission>(r#"{"player1_score": true}"#).is_err());
        assert!(
            serde_json::from_str::<DoublesSubmission>(r#"{"team1player1": {"id": 1}}"#).is_err()
        );
    }

    #[test]
    fn test_doubles_constructor() {
        let submission = DoublesSubmission::new([1, 2], [3, 4], 10, 4);
        assert_eq!(submission.team2player2.as_deref(), Some("4"));
        assert_eq!(submission.team1_score.as_deref(), Some("10"));
    }
}
