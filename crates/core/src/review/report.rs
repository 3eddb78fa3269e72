//! Per-move records and the whole-game report

use serde::{Deserialize, Serialize};

use super::quality::Tier;
use crate::engine::{CandidateLine, Score};

/// The side that played a move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    White,
    Black,
}

impl Side {
    /// Side for a 1-based ply counted from the standard initial position.
    ///
    /// The analyzer takes the mover from the position instead, which also
    /// covers games set up from a `FEN` tag.
    pub fn from_ply(ply: u32) -> Self {
        if ply % 2 == 1 {
            Side::White
        } else {
            Side::Black
        }
    }
}

impl From<shakmaty::Color> for Side {
    fn from(color: shakmaty::Color) -> Self {
        match color {
            shakmaty::Color::White => Side::White,
            shakmaty::Color::Black => Side::Black,
        }
    }
}

/// One analyzed move
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    /// 1-based, sequential across the whole game
    pub ply: u32,
    /// Shared by White's move and Black's reply
    pub move_number: u32,
    pub side: Side,
    pub move_uci: String,
    pub move_san: String,
    /// Rank-1 score before the move
    pub score_before: Score,
    /// Rank-1 score after the move
    pub score_after: Score,
    /// Evaluation drop from the mover's perspective. Not clamped.
    pub centipawn_loss: i32,
    pub tag: Tier,
    #[serde(rename = "multipv_before")]
    pub lines_before: Vec<CandidateLine>,
    #[serde(rename = "multipv_after")]
    pub lines_after: Vec<CandidateLine>,
}

/// Move-by-move quality report for one game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub event: String,
    pub white: String,
    pub black: String,
    pub result: String,
    pub depth: u8,
    pub multipv: u8,
    pub moves: Vec<MoveRecord>,
}

/// Per-side tally of one report
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SideSummary {
    pub moves: u32,
    pub inaccuracies: u32,
    pub mistakes: u32,
    pub blunders: u32,
    /// Mean loss with negative losses counted as zero
    pub average_centipawn_loss: f64,
}

impl AnalysisReport {
    pub fn summary(&self, side: Side) -> SideSummary {
        let mut summary = SideSummary::default();
        let mut total_loss: i64 = 0;

        for record in self.moves.iter().filter(|m| m.side == side) {
            summary.moves += 1;
            total_loss += i64::from(record.centipawn_loss.max(0));
            match record.tag {
                Tier::Good => {}
                Tier::Inaccuracy => summary.inaccuracies += 1,
                Tier::Mistake => summary.mistakes += 1,
                Tier::Blunder => summary.blunders += 1,
            }
        }

        if summary.moves > 0 {
            summary.average_centipawn_loss = total_loss as f64 / f64::from(summary.moves);
        }
        summary
    }
}
