mod arena;
mod config;
pub mod engine;
mod history;
mod interface;
mod parallel;
mod statistics;
mod telemetry;
pub mod time_control;
mod transposition;

/// Deepest ply a node can be created at. Quiescence stops one ply short.
pub const MAX_PLY: usize = 128;

/// Maximum iterative deepening depth.
pub const MAX_DEPTH: i32 = 64;

pub use config::{ConfigParam, EngineConfig, OptionKind};
pub use engine::{Engine, SearchMode};
pub use interface::{SearchEngine, SearchOutcome, SearchRequest, StopHandle};
pub use parallel::ParallelSearch;
pub use statistics::SearchStats;
pub use telemetry::{
    IterationKind, IterationReport, Score, SearchReport, StatisticsReport, ThinkingReport,
};
pub use transposition::{Bound, HashEntry, TableStats, TranspositionTable};
