//! Position scores and their normalization to a single centipawn scale

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Magnitude a forced mate normalizes to, regardless of distance.
pub const MATE_SCORE: i32 = 100_000;

/// A position evaluation from White's perspective
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Score {
    /// Centipawn score (positive = white advantage)
    #[serde(rename = "cp")]
    Centipawns(i32),
    /// Forced mate in N plies (positive = white mates, negative = black mates).
    /// `None` means the oracle reported a mate without a distance.
    #[serde(rename = "mate")]
    Mate(Option<i32>),
}

impl Score {
    /// Maps the score onto one signed integer scale.
    ///
    /// Centipawns pass through unchanged and any mate becomes `±MATE_SCORE`.
    /// Returns `None` when there is no usable evaluation: a mate without a
    /// distance, or a mate count of zero, which the oracle contract never
    /// produces and which carries no sign.
    pub fn normalize(&self) -> Option<i32> {
        match *self {
            Score::Centipawns(cp) => Some(cp),
            Score::Mate(Some(n)) if n > 0 => Some(MATE_SCORE),
            Score::Mate(Some(n)) if n < 0 => Some(-MATE_SCORE),
            Score::Mate(Some(_)) => {
                warn!("mate count of zero has no side; treating as no evaluation");
                None
            }
            Score::Mate(None) => None,
        }
    }

    /// Returns the same evaluation seen from the other side.
    pub fn flip(&self) -> Score {
        match *self {
            Score::Centipawns(cp) => Score::Centipawns(cp.saturating_neg()),
            Score::Mate(n) => Score::Mate(n.map(|n| n.saturating_neg())),
        }
    }
}

/// Free-function form of [`Score::normalize`].
pub fn normalize(score: &Score) -> Option<i32> {
    score.normalize()
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Score::Centipawns(cp) => write!(f, "{:+.2}", *cp as f32 / 100.0),
            Score::Mate(Some(n)) if *n < 0 => write!(f, "-M{}", n.unsigned_abs()),
            Score::Mate(Some(n)) => write!(f, "+M{}", n),
            Score::Mate(None) => write!(f, "M?"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centipawns_are_identity() {
        for cp in [i32::MIN, -301, -1, 0, 1, 35, 99_999, i32::MAX] {
            assert_eq!(Score::Centipawns(cp).normalize(), Some(cp));
        }
    }

    #[test]
    fn test_mate_for_white_is_positive_sentinel() {
        for n in [1, 2, 7, 40] {
            assert_eq!(Score::Mate(Some(n)).normalize(), Some(MATE_SCORE));
        }
    }

    #[test]
    fn test_mate_for_black_is_negative_sentinel() {
        for n in [-1, -3, -25] {
            assert_eq!(Score::Mate(Some(n)).normalize(), Some(-MATE_SCORE));
        }
    }

    #[test]
    fn test_unknown_mate_count_is_none() {
        assert_eq!(Score::Mate(None).normalize(), None);
        assert_eq!(normalize(&Score::Mate(None)), None);
    }

    #[test]
    fn test_mate_zero_is_undefined() {
        assert_eq!(Score::Mate(Some(0)).normalize(), None);
    }

    #[test]
    fn test_flip() {
        assert_eq!(Score::Centipawns(40).flip(), Score::Centipawns(-40));
        assert_eq!(Score::Mate(Some(3)).flip(), Score::Mate(Some(-3)));
        assert_eq!(Score::Mate(None).flip(), Score::Mate(None));
    }

    #[test]
    fn test_display() {
        assert_eq!(Score::Centipawns(35).to_string(), "+0.35");
        assert_eq!(Score::Centipawns(-150).to_string(), "-1.50");
        assert_eq!(Score::Mate(Some(3)).to_string(), "+M3");
        assert_eq!(Score::Mate(Some(-2)).to_string(), "-M2");
    }

    #[test]
    fn test_serde_shape() {
        let cp = serde_json::to_value(Score::Centipawns(-12)).unwrap();
        assert_eq!(cp, serde_json::json!({"type": "cp", "value": -12}));

        let mate = serde_json::to_value(Score::Mate(None)).unwrap();
        assert_eq!(mate, serde_json::json!({"type": "mate", "value": null}));

        let back: Score =
            serde_json::from_value(serde_json::json!({"type": "mate", "value": -4})).unwrap();
        assert_eq!(back, Score::Mate(Some(-4)));
    }
}
