//! PGN decoding into an ordered move list

use pgn_reader::{RawTag, SanPlus, Skip, Visitor};
use shakmaty::{fen::Fen, CastlingMode, Chess, Move, Position};
use std::io::Cursor;
use std::ops::ControlFlow;
use thiserror::Error;

/// The mainline of a game, ready to be replayed from its starting position
#[derive(Debug, Clone)]
pub struct DecodedGame {
    pub event: Option<String>,
    pub white: Option<String>,
    pub black: Option<String>,
    pub result: Option<String>,
    pub starting_position: Chess,
    pub moves: Vec<Move>,
}

impl DecodedGame {
    pub fn move_count(&self) -> usize {
        self.moves.len()
    }

    pub fn summary(&self) -> String {
        let white = self.white.as_deref().unwrap_or("Unknown");
        let black = self.black.as_deref().unwrap_or("Unknown");
        let result = self.result.as_deref().unwrap_or("*");
        format!("{} vs {} - {}", white, black, result)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PgnError {
    #[error("No game found in PGN")]
    NoGame,

    #[error("Invalid FEN tag '{fen}': {reason}")]
    InvalidFen { fen: String, reason: String },

    #[error("Illegal move '{san}' at ply {ply}")]
    IllegalMove { ply: usize, san: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

#[derive(Default)]
struct GameTags {
    event: Option<String>,
    white: Option<String>,
    black: Option<String>,
    result: Option<String>,
    fen: Option<String>,
}

struct GameMoves {
    tags: GameTags,
    starting_position: Chess,
    current_position: Chess,
    moves: Vec<Move>,
}

struct GameDecoder;

impl Visitor for GameDecoder {
    type Tags = GameTags;
    type Movetext = GameMoves;
    type Output = Result<DecodedGame, PgnError>;

    fn begin_tags(&mut self) -> ControlFlow<Self::Output, Self::Tags> {
        ControlFlow::Continue(GameTags::default())
    }

    fn tag(
        &mut self,
        tags: &mut Self::Tags,
        name: &[u8],
        value: RawTag<'_>,
    ) -> ControlFlow<Self::Output> {
        let value_str = value.decode_utf8_lossy().to_string();

        match name {
            b"Event" => tags.event = Some(value_str),
            b"White" => tags.white = Some(value_str),
            b"Black" => tags.black = Some(value_str),
            b"Result" => tags.result = Some(value_str),
            b"FEN" => tags.fen = Some(value_str),
            _ => {}
        }

        ControlFlow::Continue(())
    }

    fn begin_movetext(&mut self, tags: Self::Tags) -> ControlFlow<Self::Output, Self::Movetext> {
        let starting_position = match tags.fen.as_deref() {
            Some(fen) => match setup_position(fen) {
                Ok(position) => position,
                Err(e) => return ControlFlow::Break(Err(e)),
            },
            None => Chess::default(),
        };

        ControlFlow::Continue(GameMoves {
            tags,
            current_position: starting_position.clone(),
            starting_position,
            moves: Vec::new(),
        })
    }

    fn san(&mut self, movetext: &mut Self::Movetext, san: SanPlus) -> ControlFlow<Self::Output> {
        let played = san
            .san
            .to_move(&movetext.current_position)
            .ok()
            .and_then(|m| {
                let next = movetext.current_position.clone().play(m.clone()).ok()?;
                Some((m, next))
            });

        match played {
            Some((m, next)) => {
                movetext.current_position = next;
                movetext.moves.push(m);
                ControlFlow::Continue(())
            }
            None => ControlFlow::Break(Err(PgnError::IllegalMove {
                ply: movetext.moves.len() + 1,
                san: san.to_string(),
            })),
        }
    }

    fn begin_variation(
        &mut self,
        _movetext: &mut Self::Movetext,
    ) -> ControlFlow<Self::Output, Skip> {
        ControlFlow::Continue(Skip(true))
    }

    fn end_game(&mut self, movetext: Self::Movetext) -> Self::Output {
        let GameMoves {
            tags,
            starting_position,
            moves,
            ..
        } = movetext;

        Ok(DecodedGame {
            event: tags.event,
            white: tags.white,
            black: tags.black,
            result: tags.result,
            starting_position,
            moves,
        })
    }
}

fn setup_position(fen: &str) -> Result<Chess, PgnError> {
    let invalid = |reason: String| PgnError::InvalidFen {
        fen: fen.to_string(),
        reason,
    };
    let parsed: Fen = fen.parse().map_err(|e| invalid(format!("{}", e)))?;
    parsed
        .into_position(CastlingMode::Standard)
        .map_err(|e| invalid(format!("{}", e)))
}

/// Decodes the first game of a PGN record.
///
/// Fails when the record holds no game, carries an unusable `FEN` tag, or
/// contains a mainline move that is illegal in its position. A game with
/// tags but no moves decodes to an empty move list.
pub fn decode_game(pgn: &str) -> Result<DecodedGame, PgnError> {
    let mut reader = pgn_reader::Reader::new(Cursor::new(pgn.as_bytes()));

    match reader.read_game(&mut GameDecoder) {
        Ok(Some(game)) => game,
        Ok(None) => Err(PgnError::NoGame),
        Err(e) => Err(PgnError::Parse(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shakmaty::Color;

    const SAMPLE_PGN: &str = r#"[Event "Test"]
[White "Alice"]
[Black "Bob"]
[Result "1-0"]

1. e4 e5 2. Nf3 Nc6 3. Bb5 1-0
"#;

    #[test]
    fn test_decode_game() {
        let game = decode_game(SAMPLE_PGN).unwrap();
        assert_eq!(game.event.as_deref(), Some("Test"));
        assert_eq!(game.white.as_deref(), Some("Alice"));
        assert_eq!(game.black.as_deref(), Some("Bob"));
        assert_eq!(game.result.as_deref(), Some("1-0"));
        assert_eq!(game.move_count(), 5);
        assert_eq!(game.starting_position.turn(), Color::White);
    }

    #[test]
    fn test_game_summary() {
        let game = decode_game(SAMPLE_PGN).unwrap();
        assert_eq!(game.summary(), "Alice vs Bob - 1-0");
    }

    #[test]
    fn test_variations_are_skipped() {
        let pgn = "1. e4 (1. d4 d5) e5 2. Nf3 *";
        let game = decode_game(pgn).unwrap();
        assert_eq!(game.move_count(), 3);
    }

    #[test]
    fn test_empty_record() {
        assert_eq!(decode_game("").unwrap_err(), PgnError::NoGame);
    }

    #[test]
    fn test_tags_without_moves() {
        let pgn = "[Event \"Empty\"]\n[White \"A\"]\n[Black \"B\"]\n[Result \"*\"]\n\n*\n";
        let game = decode_game(pgn).unwrap();
        assert_eq!(game.event.as_deref(), Some("Empty"));
        assert_eq!(game.move_count(), 0);
    }

    #[test]
    fn test_illegal_move() {
        let err = decode_game("1. e4 e5 2. Ke3 *").unwrap_err();
        assert_eq!(
            err,
            PgnError::IllegalMove {
                ply: 3,
                san: "Ke3".to_string()
            }
        );
    }

    #[test]
    fn test_fen_setup() {
        let pgn = r#"[FEN "4k3/8/8/8/8/8/4P3/4K3 b - - 0 40"]
[SetUp "1"]

40... Kd7 41. e4 *
"#;
        let game = decode_game(pgn).unwrap();
        assert_eq!(game.starting_position.turn(), Color::Black);
        assert_eq!(game.move_count(), 2);
    }

    #[test]
    fn test_invalid_fen() {
        let pgn = "[FEN \"not a fen\"]\n\n1. e4 *\n";
        assert!(matches!(
            decode_game(pgn).unwrap_err(),
            PgnError::InvalidFen { .. }
        ));
    }
}
