use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "Grove")]
#[command(about = "Search a chess position with a parallel alpha-beta engine")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Args {
    /// Position to search, the start position if omitted.
    #[arg(short, long)]
    pub fen: Option<String>,

    /// Moves played from the position before searching, in UCI notation.
    #[arg(long, num_args = 1..)]
    pub play: Vec<String>,

    /// Maximum iterative deepening depth.
    #[arg(short, long, default_value_t = search::MAX_DEPTH)]
    pub depth: i32,

    /// Fixed time per move in milliseconds.
    #[arg(long, conflicts_with = "base")]
    pub movetime: Option<u64>,

    /// Remaining clock time in milliseconds.
    #[arg(long)]
    pub base: Option<u64>,

    /// Increment per move in milliseconds.
    #[arg(long, default_value_t = 0, requires = "base")]
    pub inc: u64,

    /// Moves until the next time control, 0 for none.
    #[arg(long, default_value_t = 0, requires = "base")]
    pub movestogo: u32,

    /// Search threads including the master. 0 uses every core.
    #[arg(short, long, default_value_t = 1)]
    pub threads: usize,

    /// Transposition table size in MB, overrides the Hash option.
    #[arg(long)]
    pub hash: Option<usize>,

    /// Set an engine option, as Name=value. May be repeated.
    #[arg(long = "set", value_name = "NAME=VALUE")]
    pub options: Vec<String>,

    /// Print the engine options and exit.
    #[arg(long)]
    pub list_options: bool,

    /// Write debug logs to a file instead of info logs to stderr.
    #[arg(short, long)]
    pub log_file: Option<PathBuf>,
}
