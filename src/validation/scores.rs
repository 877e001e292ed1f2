//! House-rule score validation
//!
//! A game is played to 10. At 10-9 the game continues and can only finish
//! 11-9. Any pair below 10 must be level (recorded as a draw); a decisive
//! pair below 10 is an unfinished game and is refused.

use crate::error::{LadderError, Result};
use crate::types::{Outcome, PlayerId, Side, TeamId, TeamKey};
use crate::utils::non_blank;
use serde::{Deserialize, Serialize};
use std::num::IntErrorKind;

pub const MAX_SCORE: i64 = 11;
pub const TIEBREAK_LOSING_SCORE: i64 = 9;
pub const WINNING_SCORE: i64 = 10;

/// Something that can stand on one side of a game
pub trait Competitor {
    /// True when the two sides cannot legally meet
    fn clashes_with(&self, other: &Self) -> bool;
}

impl Competitor for PlayerId {
    fn clashes_with(&self, other: &Self) -> bool {
        self == other
    }
}

impl Competitor for TeamId {
    fn clashes_with(&self, other: &Self) -> bool {
        self == other
    }
}

/// Two lineups clash when they are the same pair or share a player
impl Competitor for TeamKey {
    fn clashes_with(&self, other: &Self) -> bool {
        self.shares_player_with(other)
    }
}

/// A score field exactly as it arrived from the caller
#[derive(Debug, Clone, Copy)]
pub struct RawScore<'a> {
    /// Field name reported in `InvalidInput`
    pub field: &'a str,
    pub value: Option<&'a str>,
}

impl<'a> RawScore<'a> {
    pub fn new(field: &'a str, value: Option<&'a str>) -> Self {
        Self { field, value }
    }
}

/// A score pair that passed every house rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedScore {
    pub score_a: u8,
    pub score_b: u8,
    /// Result from side A's perspective
    pub outcome: Outcome,
}

/// Parse one raw score; missing or blank counts as zero
///
/// Integers too large for `i64` saturate so they fail the range rule rather
/// than being reported as non-numeric.
pub fn parse_score(raw: RawScore<'_>) -> Result<i64> {
    let Some(text) = non_blank(raw.value) else {
        return Ok(0);
    };

    match text.parse::<i64>() {
        Ok(score) => Ok(score),
        Err(e) => match e.kind() {
            IntErrorKind::PosOverflow => Ok(i64::MAX),
            IntErrorKind::NegOverflow => Ok(i64::MIN),
            _ => Err(LadderError::invalid_input(raw.field)),
        },
    }
}

/// Run every rule against a submitted pair of competitors and scores
///
/// Rules are checked in order and the first failure is returned:
/// parse, distinct competitors, range, 11-9 tiebreak, no 10-9 finish,
/// level scores below 10.
pub fn validate_scores<C: Competitor>(
    competitor_a: &C,
    competitor_b: &C,
    raw_a: RawScore<'_>,
    raw_b: RawScore<'_>,
) -> Result<ValidatedScore> {
    let score_a = parse_score(raw_a)?;
    let score_b = parse_score(raw_b)?;

    if competitor_a.clashes_with(competitor_b) {
        return Err(LadderError::DuplicateCompetitor);
    }

    check_house_rules(score_a, score_b)
}

/// Rules 3 to 6 on already parsed scores
pub fn check_house_rules(score_a: i64, score_b: i64) -> Result<ValidatedScore> {
    for (side, score) in [(Side::One, score_a), (Side::Two, score_b)] {
        if !(0..=MAX_SCORE).contains(&score) {
            return Err(LadderError::ScoreOutOfRange { side, score });
        }
    }

    if (score_a == MAX_SCORE && score_b != TIEBREAK_LOSING_SCORE)
        || (score_b == MAX_SCORE && score_a != TIEBREAK_LOSING_SCORE)
    {
        return Err(LadderError::IllegalTiebreakScore);
    }

    if (score_a == WINNING_SCORE && score_b == TIEBREAK_LOSING_SCORE)
        || (score_b == WINNING_SCORE && score_a == TIEBREAK_LOSING_SCORE)
    {
        return Err(LadderError::IllegalWinByOne);
    }

    let finished = score_a >= WINNING_SCORE || score_b >= WINNING_SCORE;
    if !finished && score_a != score_b {
        return Err(LadderError::IndeterminateResult);
    }

    // Both values are within 0..=11 here
    let score_a = score_a as u8;
    let score_b = score_b as u8;

    Ok(ValidatedScore {
        score_a,
        score_b,
        outcome: Outcome::from_scores(score_a, score_b),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn validate(a: &str, b: &str) -> Result<ValidatedScore> {
        validate_scores(
            &PlayerId(1),
            &PlayerId(2),
            RawScore::new("score_a", Some(a)),
            RawScore::new("score_b", Some(b)),
        )
    }

    #[test]
    fn test_tiebreak_scores_accepted() {
        let win = validate("11", "9").unwrap();
        assert_eq!(win.outcome, Outcome::Win);
        assert_eq!((win.score_a, win.score_b), (11, 9));

        let loss = validate("9", "11").unwrap();
        assert_eq!(loss.outcome, Outcome::Loss);
    }

    #[test]
    fn test_eleven_without_nine_rejected() {
        assert_eq!(validate("11", "10"), Err(LadderError::IllegalTiebreakScore));
        assert_eq!(validate("10", "11"), Err(LadderError::IllegalTiebreakScore));
        assert_eq!(validate("11", "0"), Err(LadderError::IllegalTiebreakScore));
        assert_eq!(validate("11", "11"), Err(LadderError::IllegalTiebreakScore));
    }

    #[test]
    fn test_ten_nine_rejected() {
        assert_eq!(validate("10", "9"), Err(LadderError::IllegalWinByOne));
        assert_eq!(validate("9", "10"), Err(LadderError::IllegalWinByOne));
    }

    #[test]
    fn test_unfinished_games_rejected() {
        assert_eq!(validate("5", "3"), Err(LadderError::IndeterminateResult));
        assert_eq!(validate("9", "2"), Err(LadderError::IndeterminateResult));
        assert_eq!(validate("0", "1"), Err(LadderError::IndeterminateResult));
    }

    #[test]
    fn test_level_scores_are_draws() {
        for score in 0..=9 {
            let text = score.to_string();
            let result = validate(&text, &text).unwrap();
            assert_eq!(result.outcome, Outcome::Draw);
        }
        assert_eq!(validate("10", "10").unwrap().outcome, Outcome::Draw);
    }

    #[test]
    fn test_regular_wins() {
        assert_eq!(validate("10", "8").unwrap().outcome, Outcome::Win);
        assert_eq!(validate("0", "10").unwrap().outcome, Outcome::Loss);
    }

    #[test]
    fn test_missing_and_blank_scores_are_zero() {
        let result = validate_scores(
            &PlayerId(1),
            &PlayerId(2),
            RawScore::new("score_a", None),
            RawScore::new("score_b", Some("  ")),
        )
        .unwrap();
        assert_eq!((result.score_a, result.score_b), (0, 0));
        assert_eq!(result.outcome, Outcome::Draw);

        assert_eq!(validate(" 7 ", "7").unwrap().score_a, 7);
    }

    #[test]
    fn test_non_numeric_score_names_field() {
        assert_eq!(
            validate("ten", "8"),
            Err(LadderError::invalid_input("score_a"))
        );
        assert_eq!(
            validate("10", "8.5"),
            Err(LadderError::invalid_input("score_b"))
        );
    }

    #[test]
    fn test_out_of_range() {
        assert_eq!(
            validate("-1", "0"),
            Err(LadderError::ScoreOutOfRange {
                side: Side::One,
                score: -1
            })
        );
        assert_eq!(
            validate("10", "12"),
            Err(LadderError::ScoreOutOfRange {
                side: Side::Two,
                score: 12
            })
        );
        assert!(matches!(
            validate("99999999999999999999", "0"),
            Err(LadderError::ScoreOutOfRange { .. })
        ));
    }

    #[test]
    fn test_rule_order() {
        // Parsing beats everything else
        assert_eq!(
            validate_scores(
                &PlayerId(1),
                &PlayerId(1),
                RawScore::new("score_a", Some("x")),
                RawScore::new("score_b", Some("99")),
            ),
            Err(LadderError::invalid_input("score_a"))
        );

        // Same competitor beats a bad range
        assert_eq!(
            validate_scores(
                &PlayerId(1),
                &PlayerId(1),
                RawScore::new("score_a", Some("12")),
                RawScore::new("score_b", Some("0")),
            ),
            Err(LadderError::DuplicateCompetitor)
        );
    }

    #[test]
    fn test_overlapping_lineups_clash() {
        let ab = TeamKey::new(PlayerId(1), PlayerId(2)).unwrap();
        let ac = TeamKey::new(PlayerId(1), PlayerId(3)).unwrap();
        let cd = TeamKey::new(PlayerId(3), PlayerId(4)).unwrap();
        let scores = |a, b| (RawScore::new("team1_score", a), RawScore::new("team2_score", b));

        let (a, b) = scores(Some("10"), Some("4"));
        assert_eq!(
            validate_scores(&ab, &ac, a, b),
            Err(LadderError::DuplicateCompetitor)
        );
        assert_eq!(
            validate_scores(&ab, &ab, a, b),
            Err(LadderError::DuplicateCompetitor)
        );
        assert_eq!(validate_scores(&ab, &cd, a, b).unwrap().outcome, Outcome::Win);
    }

    proptest! {
        #[test]
        fn prop_accepted_pairs_have_consistent_outcome(a in 0i64..=11, b in 0i64..=11) {
            if let Ok(result) = check_house_rules(a, b) {
                let expected = match a.cmp(&b) {
                    std::cmp::Ordering::Greater => Outcome::Win,
                    std::cmp::Ordering::Less => Outcome::Loss,
                    std::cmp::Ordering::Equal => Outcome::Draw,
                };
                prop_assert_eq!(result.outcome, expected);
                prop_assert_eq!(i64::from(result.score_a), a);
                prop_assert_eq!(i64::from(result.score_b), b);
            }
        }

        #[test]
        fn prop_validation_is_symmetric(a in -3i64..=14, b in -3i64..=14) {
            match (check_house_rules(a, b), check_house_rules(b, a)) {
                (Ok(forward), Ok(backward)) => {
                    prop_assert_eq!(forward.outcome, backward.outcome.reversed());
                }
                (Err(forward), Err(backward)) => {
                    prop_assert_eq!(forward.kind(), backward.kind());
                }
                _ => prop_assert!(false, "acceptance differs for {}-{}", a, b),
            }
        }

        #[test]
        fn prop_decisive_results_reach_ten(a in 0i64..=11, b in 0i64..=11) {
            if let Ok(result) = check_house_rules(a, b) {
                if result.outcome != Outcome::Draw {
                    prop_assert!(a.max(b) >= WINNING_SCORE);
                }
            }
        }
    }
}
