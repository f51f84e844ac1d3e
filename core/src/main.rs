mod args;
mod engine;
mod printer;

use std::error::Error;
use std::fs::File;
use std::sync::mpsc;

use args::Args;
use clap::Parser;
use cozy_chess::{util::parse_uci_move, Board};
use log::{debug, info, warn, LevelFilter};
use printer::ReportPrinter;
use search::time_control::{Clock, ClockMode};
use search::{EngineConfig, SearchRequest};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode, WriteLogger};
use utils::move_to_uci;

fn main() -> Result<(), Box<dyn Error>> {
    let args = init()?;

    let config = configure(&args);
    if args.list_options {
        for line in config.describe() {
            println!("{}", line);
        }
        return Ok(());
    }

    let (board, history) = setup_position(&args)?;
    let mut engine = engine::create_engine(&config, args.threads);
    info!("{}", engine.name());

    let mut clock = match (args.movetime, args.base) {
        (Some(ms), _) => Clock::exact(ms),
        (None, Some(base)) => Clock::new(args.movestogo, base, args.inc),
        (None, None) => Clock::none(),
    };

    let mut request = SearchRequest::new(board.clone())
        .history(history)
        .depth(args.depth);
    if clock.mode() != ClockMode::None {
        request = request.timer(clock.start());
    }

    let (tx, rx) = mpsc::channel();
    let printer = ReportPrinter::spawn(rx);
    let outcome = engine.start(request, Some(tx));
    let used = clock.stop();
    debug!("Clock charged {} ms, {} ms left", used, clock.remaining_ms());

    if let Some(statistics) = printer.join() {
        for line in statistics.lines() {
            println!("info string {}", line);
        }
    }

    match outcome.best_move {
        Some(mv) => println!("bestmove {}", move_to_uci(&board, mv)),
        None => println!("bestmove 0000"),
    }

    Ok(())
}

fn init() -> Result<Args, Box<dyn Error>> {
    let args = Args::parse();

    match &args.log_file {
        Some(log_file) => WriteLogger::init(
            LevelFilter::Debug,
            Config::default(),
            File::create(log_file)?,
        )?,
        None => TermLogger::init(
            LevelFilter::Info,
            Config::default(),
            TerminalMode::Stderr,
            ColorChoice::Auto,
        )?,
    }

    Ok(args)
}

/// Defaults, then `--hash`, then every `--set` in order. Bad options are
/// reported and skipped.
fn configure(args: &Args) -> EngineConfig {
    let mut config = EngineConfig::default();

    if let Some(hash) = args.hash {
        if let Err(e) = config.update("Hash", &hash.to_string()) {
            warn!("Hash size not set: {}", e);
        }
    }

    for option in &args.options {
        let Some((name, value)) = option.split_once('=') else {
            warn!("Expected NAME=VALUE, got '{}'", option);
            continue;
        };
        match config.update(name.trim(), value.trim()) {
            Ok(()) => debug!("Set option '{}' to '{}'", name.trim(), value.trim()),
            Err(e) => warn!("Option '{}' not set: {}", name.trim(), e),
        }
    }

    config
}

/// The position to search and the hashes of the positions before it.
fn setup_position(args: &Args) -> Result<(Board, Vec<u64>), Box<dyn Error>> {
    let mut board = match &args.fen {
        Some(fen) => fen
            .parse::<Board>()
            .map_err(|e| format!("Invalid FEN '{}': {:?}", fen, e))?,
        None => Board::default(),
    };

    let mut history = Vec::with_capacity(args.play.len());
    for uci in &args.play {
        let mv = parse_uci_move(&board, uci)
            .map_err(|e| format!("Invalid move '{}': {:?}", uci, e))?;
        if !board.is_legal(mv) {
            return Err(format!("Illegal move '{}'", uci).into());
        }
        history.push(board.hash());
        board.play_unchecked(mv);
    }

    Ok((board, history))
}
