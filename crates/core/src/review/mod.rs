//! Move quality review of whole games

mod analyzer;
mod quality;
mod report;

pub use analyzer::{analyze_game, analyze_game_cancellable, analyze_pgn, analyze_pgn_cancellable};
pub use quality::{classify, Tier, BLUNDER, INACCURACY, MISTAKE};
pub use report::{AnalysisReport, MoveRecord, Side, SideSummary};
