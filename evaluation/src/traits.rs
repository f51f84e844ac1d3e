// Evaluator interface used by the search.
//
// The search only depends on this trait, so evaluators can be swapped
// without touching the recursion. Each search thread owns its own
// evaluator instance (see `Evaluator::fork`).

use cozy_chess::Board;

/// Counters reported by an evaluator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvalStats {
    /// Calls to `evaluate`
    pub evaluations: u64,
    /// Calls answered by material alone
    pub lazy: u64,
    pub cache_probes: u64,
    pub cache_hits: u64,
}

impl EvalStats {
    pub fn merge(&mut self, other: &EvalStats) {
        self.evaluations += other.evaluations;
        self.lazy += other.lazy;
        self.cache_probes += other.cache_probes;
        self.cache_hits += other.cache_hits;
    }
}

pub trait Evaluator: Send {
    fn name(&self) -> String;

    /// Evaluate position from the side to move's perspective. Positive = side to move is better.
    /// May return early with a material-only score when that is far outside (alpha, beta).
    fn evaluate(&mut self, board: &Board, alpha: i32, beta: i32) -> i32;

    /// Resize the evaluation cache. Zero disables it.
    fn set_cache_size(&mut self, bytes: usize);
    fn clear_cache(&mut self);

    fn statistics(&self) -> EvalStats;
    fn reset_statistics(&mut self);

    /// A fresh evaluator with the same parameters and an empty cache, for another search thread.
    fn fork(&self) -> Box<dyn Evaluator>;
}
