//! Stockfish chess engine interface
//!
//! Spawns Stockfish as a subprocess and communicates via UCI protocol.

use std::collections::BTreeMap;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use shakmaty::{fen::Fen, Chess, Color, EnPassantMode, Position};
use tracing::{debug, trace};

use super::score::{Score, MATE_SCORE};
use super::{CandidateLine, Oracle, OracleError, SearchParams};

/// Maximum number of lines to read while waiting for a handshake reply.
pub const MAX_HANDSHAKE_LINES: usize = 1000;

/// Process-level settings applied once after the handshake
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    pub threads: usize,
    pub hash_mb: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            threads: 1,
            hash_mb: 256,
        }
    }
}

/// A scored `info` line, still relative to the side to move
#[derive(Debug, Clone, PartialEq)]
struct InfoLine {
    multipv: u32,
    score: Score,
    pv: Vec<String>,
}

/// Wrapper around Stockfish chess engine
pub struct StockfishEngine {
    process: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    /// MultiPV value last sent, so it is only resent when it changes
    multipv: Option<u8>,
}

impl StockfishEngine {
    /// Creates a new Stockfish engine instance
    ///
    /// # Arguments
    /// * `path` - Path to stockfish binary (or "stockfish" if in PATH)
    ///
    /// # Example
    /// ```ignore
    /// let mut engine = StockfishEngine::new("stockfish")?;
    /// ```
    pub fn new(path: &str) -> Result<Self, OracleError> {
        let mut process = Command::new(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| OracleError::Spawn(format!("{}: {}", path, e)))?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| OracleError::Spawn("Failed to open stdin".into()))?;

        let stdout = process
            .stdout
            .take()
            .ok_or_else(|| OracleError::Spawn("Failed to open stdout".into()))?;

        let mut engine = StockfishEngine {
            process,
            stdin,
            stdout: BufReader::new(stdout),
            multipv: None,
        };

        engine.send("uci")?;
        engine.read_until("uciok")?;
        engine.wait_ready()?;

        debug!(path, "engine ready");
        Ok(engine)
    }

    /// Applies thread and hash settings
    pub fn configure(&mut self, options: &EngineOptions) -> Result<(), OracleError> {
        self.send(&format!("setoption name Threads value {}", options.threads))?;
        self.send(&format!("setoption name Hash value {}", options.hash_mb))?;
        self.wait_ready()
    }

    fn send(&mut self, cmd: &str) -> Result<(), OracleError> {
        trace!(cmd, "engine <");
        writeln!(self.stdin, "{}", cmd)?;
        self.stdin.flush()?;
        Ok(())
    }

    fn read_line(&mut self) -> Result<String, OracleError> {
        let mut line = String::new();
        if self.stdout.read_line(&mut line)? == 0 {
            return Err(OracleError::Closed);
        }
        let line = line.trim().to_string();
        trace!(line = %line, "engine >");
        Ok(line)
    }

    fn read_until(&mut self, expected: &str) -> Result<(), OracleError> {
        for _ in 0..MAX_HANDSHAKE_LINES {
            if self.read_line()?.starts_with(expected) {
                return Ok(());
            }
        }
        Err(OracleError::Protocol(format!("no '{}' from engine", expected)))
    }

    fn wait_ready(&mut self) -> Result<(), OracleError> {
        self.send("isready")?;
        self.read_until("readyok")
    }

    fn set_multipv(&mut self, lines: u8) -> Result<(), OracleError> {
        if self.multipv != Some(lines) {
            self.send(&format!("setoption name MultiPV value {}", lines))?;
            self.wait_ready()?;
            self.multipv = Some(lines);
        }
        Ok(())
    }

    /// Parses a UCI info line, keeping only lines that carry a score.
    ///
    /// Format: "info depth X multipv K score cp Y nodes Z pv move1 move2 ..."
    fn parse_info_line(line: &str) -> Option<InfoLine> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let mut multipv = 1;
        let mut score = None;
        let mut pv = Vec::new();
        let mut i = 1;

        while i < parts.len() {
            match parts[i] {
                "multipv" => {
                    multipv = parts.get(i + 1)?.parse().ok()?;
                    i += 2;
                }
                "score" => {
                    let value = parts.get(i + 2)?.parse::<i32>().ok()?;
                    score = match *parts.get(i + 1)? {
                        "cp" => Some(Score::Centipawns(value)),
                        "mate" => Some(Score::Mate(Some(value))),
                        _ => return None,
                    };
                    i += 3;
                }
                "pv" => {
                    pv = parts[i + 1..].iter().map(|s| s.to_string()).collect();
                    break;
                }
                // "string" swallows the rest of the line
                "string" => break,
                _ => i += 1,
            }
        }

        Some(InfoLine {
            multipv,
            score: score?,
            pv,
        })
    }

    /// Converts a side-to-move score into White's frame.
    ///
    /// "mate 0" means the side to move is already checkmated.
    fn white_relative(score: Score, turn: Color) -> Score {
        match (score, turn) {
            (Score::Mate(Some(0)), Color::White) => Score::Centipawns(-MATE_SCORE),
            (Score::Mate(Some(0)), Color::Black) => Score::Centipawns(MATE_SCORE),
            (score, Color::White) => score,
            (score, Color::Black) => score.flip(),
        }
    }

    /// Quit the engine cleanly
    pub fn quit(&mut self) -> Result<(), OracleError> {
        self.send("quit")?;
        let _ = self.process.wait();
        Ok(())
    }
}

impl Oracle for StockfishEngine {
    fn evaluate(
        &mut self,
        position: &Chess,
        params: SearchParams,
    ) -> Result<Vec<CandidateLine>, OracleError> {
        self.set_multipv(params.lines)?;

        let fen = Fen::from_position(position, EnPassantMode::Legal);
        self.send(&format!("position fen {}", fen))?;
        self.send(&format!("go depth {}", params.depth))?;

        let mut latest: BTreeMap<u32, InfoLine> = BTreeMap::new();
        loop {
            let line = self.read_line()?;
            if line.starts_with("bestmove") {
                break;
            }
            if line.starts_with("info") {
                if let Some(info) = Self::parse_info_line(&line) {
                    latest.insert(info.multipv, info);
                }
            }
        }

        if latest.is_empty() {
            return Err(OracleError::Protocol(format!(
                "no scored line for position {}",
                fen
            )));
        }

        let turn = position.turn();
        let lines: Vec<CandidateLine> = latest
            .into_values()
            .take(params.lines as usize)
            .enumerate()
            .map(|(index, info)| CandidateLine {
                rank: index as u32 + 1,
                best_move_uci: info.pv.first().cloned(),
                score: Self::white_relative(info.score, turn),
                pv: info.pv,
            })
            .collect();

        debug!(depth = params.depth, lines = lines.len(), %fen, "position evaluated");
        Ok(lines)
    }
}

impl Drop for StockfishEngine {
    fn drop(&mut self) {
        if self.quit().is_err() {
            let _ = self.process.kill();
        }
    }
}
