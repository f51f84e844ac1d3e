use std::sync::{
    atomic::{AtomicBool, Ordering},
    mpsc::Sender,
    Arc,
};

use ahash::AHashMap;
use cozy_chess::Move;
use evaluation::{Evaluator, MaterialEvaluator, PieceValues};

use crate::{
    arena::{NodeArena, NodeId, Played, PvLine},
    history::HistoryTable,
    statistics::SearchStats,
    telemetry::SearchReport,
    time_control::Timer,
    transposition::TranspositionTable,
    EngineConfig, MAX_PLY,
};

mod draw;
mod hash;
mod iterate;
mod quiescence;
mod search;
mod task;
mod time;

pub(crate) use hash::apply_hints;
pub(crate) use task::{SlaveTask, TaskResult};
use time::TimeCheck;

/// Returned by a search that was interrupted. Callers discard it. Negating it
/// cannot overflow.
pub const ABORTED: i32 = -i32::MAX;

/// What the search is for. Only move searches manage their time budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    /// Choose a move within the clock's budget
    Move,
    /// Search until the depth limit or an explicit stop
    Analyze,
}

/// Result of the shared part at the top of an interior node.
pub(crate) enum Visit {
    /// The node is resolved without looking at its moves
    Done(i32),
    Expand,
}

/// How an interior node hands its children to the recursion. The sequential
/// engine recurses in place, the slave pool may send subtrees to other threads.
pub(crate) trait NodeSearch {
    fn search(
        &mut self,
        engine: &mut Engine,
        node: NodeId,
        ply: usize,
        depth: i32,
        alpha: i32,
        beta: i32,
    ) -> i32;
}

/// Plain recursive alpha-beta.
pub(crate) struct Sequential;

impl NodeSearch for Sequential {
    #[inline(always)]
    fn search(
        &mut self,
        engine: &mut Engine,
        node: NodeId,
        ply: usize,
        depth: i32,
        alpha: i32,
        beta: i32,
    ) -> i32 {
        engine.full_width(self, node, ply, depth, alpha, beta)
    }
}

pub struct Engine {
    /// Configuration for the engine
    pub(crate) config: EngineConfig,

    /// Signal to terminate search (time control or explicit stop)
    pub(crate) stop: Arc<AtomicBool>,

    pub(crate) evaluator: Box<dyn Evaluator>,
    pub(crate) values: PieceValues,

    /// Shared with slaves when the table is configured as shared
    pub(crate) table: Option<Arc<TranspositionTable>>,
    pub(crate) history: HistoryTable,

    /// One node per ply of the line being searched
    pub(crate) arena: NodeArena,
    /// Position hashes played before the searched position, oldest first
    pub(crate) prehistory: Vec<u64>,

    pub(crate) stats: SearchStats,
    pub(crate) timer: Arc<Timer>,
    timecheck: TimeCheck,
    mode: SearchMode,

    /// Slaves neither report nor manage time
    slave: bool,
    root: Option<NodeId>,
    root_depth: i32,
    /// Best line below each root move from the last time it was searched
    ply1_lines: AHashMap<Move, PvLine>,
    /// Set when the time was extended; the current iteration is the last
    stop_iteration: bool,
    iteration_start_ms: u64,

    sink: Option<Sender<SearchReport>>,
}

impl Engine {
    pub fn new(config: &EngineConfig, evaluator: Box<dyn Evaluator>) -> Self {
        let values = PieceValues::default();
        let mut instance = Self {
            config: config.clone(),
            stop: Arc::new(AtomicBool::new(false)),

            evaluator,
            values,

            table: None,
            history: HistoryTable::new(),

            arena: NodeArena::new(MAX_PLY + 1, values),
            prehistory: Vec::new(),

            stats: SearchStats::default(),
            timer: Arc::new(Timer::unlimited()),
            timecheck: TimeCheck::default(),
            mode: SearchMode::Analyze,

            slave: false,
            root: None,
            root_depth: 0,
            ply1_lines: AHashMap::new(),
            stop_iteration: false,
            iteration_start_ms: 0,

            sink: None,
        };

        instance.configure(config, true);

        instance
    }

    /// A worker engine. Its table and eval cache are sized by the slave pool.
    pub(crate) fn new_slave(config: &EngineConfig, evaluator: Box<dyn Evaluator>) -> Self {
        let mut unsized_config = config.clone();
        unsized_config.hash_size_mb.value = 0;
        unsized_config.eval_cache_mb.value = 0;

        let mut instance = Self::new(&unsized_config, evaluator);
        instance.slave = true;
        instance.config = config.clone();
        instance
    }

    pub fn configure(&mut self, config: &EngineConfig, init: bool) {
        let old_config = std::mem::replace(&mut self.config, config.clone());

        if self.slave {
            return;
        }

        if init
            || old_config.hash_size_mb.value != config.hash_size_mb.value
            || old_config.hash_pvtable.value != config.hash_pvtable.value
        {
            self.configure_table(config.hash_bytes());
        }

        if init || old_config.eval_cache_mb.value != config.eval_cache_mb.value {
            self.evaluator.set_cache_size(config.eval_cache_bytes());
        }
    }

    pub fn name(&self) -> String {
        format!("Alpha-beta ({})", self.evaluator.name())
    }

    /// Replace the transposition table. Zero bytes disables it.
    pub fn configure_table(&mut self, bytes: usize) {
        self.table = if bytes == 0 {
            None
        } else {
            Some(Arc::new(TranspositionTable::with_bytes(
                bytes,
                self.config.hash_pvtable.value,
            )))
        };
    }

    pub fn clear_tables(&mut self) {
        if let Some(table) = &self.table {
            table.clear();
        }
        self.history.reset();
        self.evaluator.clear_cache();
    }

    pub fn table(&self) -> Option<&Arc<TranspositionTable>> {
        self.table.as_ref()
    }

    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    pub fn interrupt(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    #[inline(always)]
    pub(crate) fn stopped(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    #[inline(always)]
    pub(crate) fn failsoft(&self) -> bool {
        self.config.failsoft.value
    }

    /// Clamp into the window unless failing soft.
    #[inline(always)]
    pub(crate) fn bound_score(&self, score: i32, alpha: i32, beta: i32) -> i32 {
        if self.failsoft() {
            score
        } else {
            score.max(alpha).min(beta)
        }
    }

    /// Allocate the child of `parent`. Running out of nodes means the ply
    /// ceiling was broken, which is a bug in the search.
    pub(crate) fn make_child(&mut self, parent: NodeId, played: Played, ply: usize) -> NodeId {
        match self.arena.make_move(parent, played) {
            Ok(id) => id,
            Err(e) => panic!("Cannot create node at ply {}: {}", ply, e),
        }
    }

    /// best_line(node) = mv + best_line(child)
    pub(crate) fn adopt_best(&mut self, node: NodeId, mv: Move, child: NodeId) {
        let line = self.arena[child].best_line.clone();
        self.arena[node].set_best(mv, &line);
    }

    /// Fail-hard scores must stay inside the window they were searched with.
    #[inline(always)]
    pub(crate) fn check_window(&self, score: i32, alpha: i32, beta: i32, ply: usize) {
        if !self.failsoft() && !self.stopped() && (score < alpha || score > beta) {
            log::warn!(
                "Score {} outside window [{}, {}] at ply {}",
                score,
                alpha,
                beta,
                ply
            );
        }
    }

    pub(crate) fn report(&self, report: SearchReport) {
        if self.slave {
            return;
        }
        report.log();
        if let Some(sink) = &self.sink {
            // a closed receiver only means nobody listens any more
            let _ = sink.send(report);
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(
            &EngineConfig::default(),
            Box::new(MaterialEvaluator::default()),
        )
    }
}
