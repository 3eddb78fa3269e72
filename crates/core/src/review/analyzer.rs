//! Move-by-move game analysis
//!
//! Walks the mainline once, asking the oracle for the best lines before and
//! after every move, and attributes the evaluation drop to the mover.

use std::sync::atomic::{AtomicBool, Ordering};

use shakmaty::{san::SanPlus, CastlingMode, Chess, Position};
use tracing::{debug, info};

use super::quality::classify;
use super::report::{AnalysisReport, MoveRecord, Side};
use crate::engine::{CandidateLine, Oracle, OracleError, Score, SearchParams};
use crate::error::{Error, Result};
use crate::parser::{decode_game, DecodedGame};

/// Decodes a PGN record and analyzes its mainline.
///
/// An undecodable record fails with [`Error::InvalidInput`] before the
/// oracle is queried.
pub fn analyze_pgn<O: Oracle + ?Sized>(
    oracle: &mut O,
    pgn: &str,
    params: SearchParams,
) -> Result<AnalysisReport> {
    analyze_pgn_cancellable(oracle, pgn, params, &AtomicBool::new(false))
}

pub fn analyze_pgn_cancellable<O: Oracle + ?Sized>(
    oracle: &mut O,
    pgn: &str,
    params: SearchParams,
    cancel: &AtomicBool,
) -> Result<AnalysisReport> {
    let game = decode_game(pgn)?;
    analyze_game_cancellable(oracle, &game, params, cancel)
}

pub fn analyze_game<O: Oracle + ?Sized>(
    oracle: &mut O,
    game: &DecodedGame,
    params: SearchParams,
) -> Result<AnalysisReport> {
    analyze_game_cancellable(oracle, game, params, &AtomicBool::new(false))
}

/// Analyzes a decoded game, checking `cancel` before every oracle query.
///
/// Any oracle failure aborts the whole analysis; no partial report is
/// returned.
pub fn analyze_game_cancellable<O: Oracle + ?Sized>(
    oracle: &mut O,
    game: &DecodedGame,
    params: SearchParams,
    cancel: &AtomicBool,
) -> Result<AnalysisReport> {
    check_replayable(game)?;

    info!(
        game = %game.summary(),
        plies = game.move_count(),
        depth = params.depth,
        multipv = params.lines,
        "analyzing game"
    );

    let mut position = game.starting_position.clone();
    let mut records = Vec::with_capacity(game.moves.len());

    for (index, mv) in game.moves.iter().enumerate() {
        let ply = index as u32 + 1;
        // From the standard start these equal ply parity and (ply + 1) / 2
        let side = Side::from(position.turn());
        let move_number = position.fullmoves().get();

        let lines_before = query(oracle, &position, params, cancel)?;
        let score_before = best_score(&lines_before)?;

        let move_uci = mv.to_uci(CastlingMode::Standard).to_string();
        let move_san = SanPlus::from_move_and_play_unchecked(&mut position, mv.clone()).to_string();

        let lines_after = query(oracle, &position, params, cancel)?;
        let score_after = best_score(&lines_after)?;

        let signed_before = from_mover(white_centipawns(&score_before), side);
        let signed_after = from_mover(white_centipawns(&score_after), side);
        let centipawn_loss = signed_before.saturating_sub(signed_after);
        let tag = classify(centipawn_loss);

        debug!(ply, san = %move_san, centipawn_loss, %tag, "move classified");

        records.push(MoveRecord {
            ply,
            move_number,
            side,
            move_uci,
            move_san,
            score_before,
            score_after,
            centipawn_loss,
            tag,
            lines_before,
            lines_after,
        });
    }

    info!(moves = records.len(), "analysis complete");

    Ok(AnalysisReport {
        event: game.event.clone().unwrap_or_default(),
        white: game.white.clone().unwrap_or_default(),
        black: game.black.clone().unwrap_or_default(),
        result: game.result.clone().unwrap_or_default(),
        depth: params.depth,
        multipv: params.lines,
        moves: records,
    })
}

/// Every move of a decoded game must be legal where it is played.
fn check_replayable(game: &DecodedGame) -> Result<()> {
    let mut position = game.starting_position.clone();
    for (index, mv) in game.moves.iter().enumerate() {
        position = position.play(mv.clone()).map_err(|_| {
            Error::Internal(format!(
                "decoded game holds an illegal move at ply {}",
                index + 1
            ))
        })?;
    }
    Ok(())
}

fn query<O: Oracle + ?Sized>(
    oracle: &mut O,
    position: &Chess,
    params: SearchParams,
    cancel: &AtomicBool,
) -> Result<Vec<CandidateLine>> {
    if cancel.load(Ordering::Relaxed) {
        return Err(Error::Cancelled);
    }
    Ok(oracle.evaluate(position, params)?)
}

fn best_score(lines: &[CandidateLine]) -> Result<Score> {
    lines
        .iter()
        .find(|line| line.rank == 1)
        .map(|line| line.score)
        .ok_or_else(|| Error::Oracle(OracleError::Protocol("no rank-1 line in batch".into())))
}

/// Normalized score in White's frame, for arithmetic.
///
/// A score without a usable value (mate with no distance) counts as 0,
/// which reads as an even position. The raw score stays on the record.
fn white_centipawns(score: &Score) -> i32 {
    score.normalize().unwrap_or_else(|| {
        debug!(%score, "no usable evaluation, counting as 0");
        0
    })
}

fn from_mover(white_cp: i32, side: Side) -> i32 {
    match side {
        Side::White => white_cp,
        Side::Black => white_cp.saturating_neg(),
    }
}
