//! Chess engine integration
//!
//! The analysis driver talks to a position-evaluation oracle through the
//! [`Oracle`] trait. [`StockfishEngine`] implements it over UCI.

pub mod score;
pub mod stockfish;

use serde::{Deserialize, Serialize};
use shakmaty::Chess;
use thiserror::Error;

use crate::error::{Error, Result};

pub use score::{normalize, Score, MATE_SCORE};
pub use stockfish::{EngineOptions, StockfishEngine};

pub const MIN_DEPTH: u8 = 6;
pub const MAX_DEPTH: u8 = 40;
pub const DEFAULT_DEPTH: u8 = 18;

pub const MIN_LINES: u8 = 1;
pub const MAX_LINES: u8 = 5;
pub const DEFAULT_LINES: u8 = 3;

/// Error type for oracle queries
#[derive(Error, Debug)]
pub enum OracleError {
    #[error("Failed to start engine: {0}")]
    Spawn(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Engine closed unexpectedly")]
    Closed,

    #[error("Engine did not answer in time")]
    Timeout,
}

/// Search depth and number of ranked lines requested per position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParams {
    pub depth: u8,
    pub lines: u8,
}

impl SearchParams {
    /// Validates both parameters against the supported bounds.
    pub fn new(depth: u8, lines: u8) -> Result<Self> {
        if !(MIN_DEPTH..=MAX_DEPTH).contains(&depth) {
            return Err(Error::InvalidInput(format!(
                "depth must be between {} and {}, got {}",
                MIN_DEPTH, MAX_DEPTH, depth
            )));
        }
        if !(MIN_LINES..=MAX_LINES).contains(&lines) {
            return Err(Error::InvalidInput(format!(
                "multipv must be between {} and {}, got {}",
                MIN_LINES, MAX_LINES, lines
            )));
        }
        Ok(Self { depth, lines })
    }
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            depth: DEFAULT_DEPTH,
            lines: DEFAULT_LINES,
        }
    }
}

/// One ranked principal variation for a position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateLine {
    /// 1 = the oracle's best line
    pub rank: u32,
    /// First move of the line in UCI notation, absent in terminal positions
    pub best_move_uci: Option<String>,
    /// Evaluation from White's perspective
    pub score: Score,
    pub pv: Vec<String>,
}

/// A position-evaluation service.
///
/// Implementations report every score from White's perspective, ranked by
/// strength with rank 1 first. A delivered checkmate is reported as
/// `Centipawns(±MATE_SCORE)` toward the winner, never as a mate count of
/// zero. Taking `&mut self` keeps one query in flight per session.
pub trait Oracle {
    fn evaluate(
        &mut self,
        position: &Chess,
        params: SearchParams,
    ) -> std::result::Result<Vec<CandidateLine>, OracleError>;
}

impl<O: Oracle + ?Sized> Oracle for Box<O> {
    fn evaluate(
        &mut self,
        position: &Chess,
        params: SearchParams,
    ) -> std::result::Result<Vec<CandidateLine>, OracleError> {
        (**self).evaluate(position, params)
    }
}
