//! Game Review Core Library
//!
//! Turns a recorded game into a move-by-move quality report: every move is
//! scored by how much the position's evaluation dropped for the side that
//! played it, then labelled good, inaccuracy, mistake or blunder.

pub mod engine;
pub mod error;
pub mod parser;
pub mod review;

pub use engine::{CandidateLine, Oracle, OracleError, Score, SearchParams, StockfishEngine};
pub use error::{Error, ErrorKind, Result};
pub use parser::{decode_game, DecodedGame};
pub use review::{analyze_game, analyze_pgn, AnalysisReport, MoveRecord, Side, Tier};
