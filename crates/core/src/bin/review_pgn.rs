//! Analyze one PGN game with a local Stockfish and print the report as JSON

use std::{env, fs, process};

use game_review_core::engine::{EngineOptions, DEFAULT_DEPTH, DEFAULT_LINES};
use game_review_core::{analyze_pgn, SearchParams, Side, StockfishEngine};
use tracing_subscriber::EnvFilter;

struct Args {
    pgn_file: String,
    depth: u8,
    multipv: u8,
    engine: String,
}

fn print_usage(program: &str) {
    eprintln!("Usage: {} <pgn_file> [--depth N] [--multipv N] [--engine PATH]", program);
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --depth N      Search depth per position (default {})", DEFAULT_DEPTH);
    eprintln!("  --multipv N    Candidate lines per position (default {})", DEFAULT_LINES);
    eprintln!("  --engine PATH  Stockfish binary (default \"stockfish\")");
}

fn parse_args(args: &[String]) -> Option<Args> {
    let mut pgn_file = None;
    let mut depth = DEFAULT_DEPTH;
    let mut multipv = DEFAULT_LINES;
    let mut engine = "stockfish".to_string();

    let mut rest = args.iter().skip(1);
    while let Some(arg) = rest.next() {
        match arg.as_str() {
            "--depth" => depth = rest.next()?.parse().ok()?,
            "--multipv" => multipv = rest.next()?.parse().ok()?,
            "--engine" => engine = rest.next()?.clone(),
            flag if flag.starts_with("--") => return None,
            path => pgn_file = Some(path.to_string()),
        }
    }

    Some(Args {
        pgn_file: pgn_file?,
        depth,
        multipv,
        engine,
    })
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let argv: Vec<String> = env::args().collect();
    let Some(args) = parse_args(&argv) else {
        print_usage(argv.first().map(String::as_str).unwrap_or("review-pgn"));
        process::exit(2);
    };

    let params = match SearchParams::new(args.depth, args.multipv) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("[ERROR] {}", e);
            process::exit(2);
        }
    };

    let pgn = match fs::read_to_string(&args.pgn_file) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("[ERROR] {}: {}", args.pgn_file, e);
            process::exit(1);
        }
    };

    let mut engine = match StockfishEngine::new(&args.engine) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("[ERROR] Failed to start Stockfish: {}", e);
            eprintln!("Make sure Stockfish is installed:");
            eprintln!("  sudo apt install stockfish");
            process::exit(1);
        }
    };
    if let Err(e) = engine.configure(&EngineOptions::default()) {
        eprintln!("[ERROR] {}", e);
        process::exit(1);
    }

    let report = match analyze_pgn(&mut engine, &pgn, params) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("[ERROR] {}", e);
            process::exit(1);
        }
    };

    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("[ERROR] {}", e);
            process::exit(1);
        }
    }

    for side in [Side::White, Side::Black] {
        let s = report.summary(side);
        eprintln!(
            "{:?}: {} moves, {} inaccuracies, {} mistakes, {} blunders, avg loss {:.1} cp",
            side, s.moves, s.inaccuracies, s.mistakes, s.blunders, s.average_centipawn_loss
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_defaults() {
        let parsed = parse_args(&args(&["review-pgn", "game.pgn"])).unwrap();
        assert_eq!(parsed.pgn_file, "game.pgn");
        assert_eq!(parsed.depth, DEFAULT_DEPTH);
        assert_eq!(parsed.multipv, DEFAULT_LINES);
        assert_eq!(parsed.engine, "stockfish");
    }

    #[test]
    fn test_parse_options() {
        let parsed = parse_args(&args(&[
            "review-pgn", "--depth", "10", "game.pgn", "--multipv", "1", "--engine", "/opt/sf",
        ]))
        .unwrap();
        assert_eq!(parsed.depth, 10);
        assert_eq!(parsed.multipv, 1);
        assert_eq!(parsed.engine, "/opt/sf");
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(parse_args(&args(&["review-pgn"])).is_none());
        assert!(parse_args(&args(&["review-pgn", "g.pgn", "--depth"])).is_none());
        assert!(parse_args(&args(&["review-pgn", "g.pgn", "--depth", "x"])).is_none());
        assert!(parse_args(&args(&["review-pgn", "g.pgn", "--verbose"])).is_none());
    }
}
