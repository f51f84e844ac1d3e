use std::sync::{
    atomic::{AtomicBool, Ordering},
    mpsc::Sender,
    Arc,
};
use std::time::Duration;

use cozy_chess::{Board, Move};

use crate::{
    engine::{Engine, SearchMode, Sequential},
    statistics::SearchStats,
    telemetry::SearchReport,
    time_control::Timer,
    transposition::TableStats,
    EngineConfig, MAX_DEPTH,
};

/// Everything needed to start a search.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub board: Board,
    /// Hashes of the positions played before `board`, oldest first
    pub history: Vec<u64>,
    pub max_depth: i32,
    /// `None` searches without a time limit
    pub timer: Option<Arc<Timer>>,
    pub mode: SearchMode,
}

impl SearchRequest {
    pub fn new(board: Board) -> Self {
        Self {
            board,
            history: Vec::new(),
            max_depth: MAX_DEPTH,
            timer: None,
            mode: SearchMode::Analyze,
        }
    }

    pub fn history(mut self, history: Vec<u64>) -> Self {
        self.history = history;
        self
    }

    pub fn depth(mut self, depth: i32) -> Self {
        self.max_depth = depth;
        self
    }

    /// Search under a time budget. Implies move mode.
    pub fn timer(mut self, timer: Arc<Timer>) -> Self {
        self.timer = Some(timer);
        self.mode = SearchMode::Move;
        self
    }

    pub fn mode(mut self, mode: SearchMode) -> Self {
        self.mode = mode;
        self
    }
}

/// Result of a finished search.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// `None` when the side to move has no legal move
    pub best_move: Option<Move>,
    pub score: i32,
    /// Last completed iteration, 0 if none completed
    pub depth: i32,
    pub best_line: Vec<Move>,
    pub stats: SearchStats,
    pub table: Option<TableStats>,
    pub elapsed: Duration,
}

/// Interrupts a running search from another thread.
#[derive(Debug, Clone)]
pub struct StopHandle {
    flags: Vec<Arc<AtomicBool>>,
}

impl StopHandle {
    pub(crate) fn new(flags: Vec<Arc<AtomicBool>>) -> Self {
        Self { flags }
    }

    pub fn stop(&self) {
        for flag in &self.flags {
            flag.store(true, Ordering::Relaxed);
        }
    }
}

/// A game-tree searcher: single threaded or with a pool of helpers.
pub trait SearchEngine {
    fn name(&self) -> String;

    /// Search until the depth limit, the timer or an interrupt ends it.
    /// Telemetry goes to `sink` when given.
    fn start(&mut self, request: SearchRequest, sink: Option<Sender<SearchReport>>) -> SearchOutcome;

    fn interrupt(&self);
    fn stop_handle(&self) -> StopHandle;

    fn configure(&mut self, config: &EngineConfig);
    /// Resize the transposition tables. Zero disables them.
    fn configure_table(&mut self, bytes: usize);
    /// Forget everything learned from earlier searches.
    fn clear_tables(&mut self);

    /// One fixed-window alpha-beta search of `board` to `depth`.
    fn search(&mut self, board: &Board, history: &[u64], depth: i32, alpha: i32, beta: i32) -> i32;
}

impl SearchEngine for Engine {
    fn name(&self) -> String {
        Engine::name(self)
    }

    fn start(&mut self, request: SearchRequest, sink: Option<Sender<SearchReport>>) -> SearchOutcome {
        self.run(&mut Sequential, request, sink)
    }

    fn interrupt(&self) {
        Engine::interrupt(self);
    }

    fn stop_handle(&self) -> StopHandle {
        StopHandle::new(vec![self.stop_flag()])
    }

    fn configure(&mut self, config: &EngineConfig) {
        Engine::configure(self, config, false);
    }

    fn configure_table(&mut self, bytes: usize) {
        Engine::configure_table(self, bytes);
    }

    fn clear_tables(&mut self) {
        Engine::clear_tables(self);
    }

    fn search(&mut self, board: &Board, history: &[u64], depth: i32, alpha: i32, beta: i32) -> i32 {
        self.search_position(&mut Sequential, board.clone(), history.to_vec(), depth, alpha, beta)
    }
}

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_request_builder() {
        let timer = Arc::new(Timer::exact(Duration::from_millis(100)));
        let request = SearchRequest::new(Board::default())
            .history(vec![1, 2])
            .depth(7)
            .timer(timer);

        assert_eq!(request.max_depth, 7);
        assert_eq!(request.history, vec![1, 2]);
        assert_eq!(request.mode, SearchMode::Move);
        assert!(request.timer.is_some());

        let analyze = SearchRequest::new(Board::default());
        assert_eq!(analyze.mode, SearchMode::Analyze);
        assert_eq!(analyze.max_depth, MAX_DEPTH);
    }

    #[test]
    fn test_stop_handle_ends_search() {
        let mut engine = Engine::default();
        let handle = engine.stop_handle();

        let stopper = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            handle.stop();
        });

        // without the stop this would run for a very long time
        let outcome = engine.start(SearchRequest::new(Board::default()).depth(40), None);
        stopper.join().unwrap();

        assert!(outcome.best_move.is_some());
        assert!(outcome.depth < 40);
    }
}
