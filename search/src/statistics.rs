use evaluation::EvalStats;

/// Per-engine search counters. Slaves hand theirs to the master by value,
/// which folds them in with `merge`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub nodes_fullwidth: u64,
    pub nodes_quiesce: u64,

    pub beta_cuts: u64,
    pub null_cuts: u64,
    pub fut_cuts: u64,
    pub ext_fut_cuts: u64,
    pub razor_cuts: u64,

    /// Moves tried summed over finished full-width nodes, and the number of such nodes
    pub moves_sum: u64,
    pub moves_cnt: u64,
    pub moves_sum_quiesce: u64,
    pub moves_cnt_quiesce: u64,

    /// Deepest ply reached in the main search and in quiescence
    pub max_ply: usize,
    pub max_ply_quiesce: usize,

    pub eval: EvalStats,
}

impl SearchStats {
    pub fn nodes(&self) -> u64 {
        self.nodes_fullwidth + self.nodes_quiesce
    }

    pub fn merge(&mut self, other: &SearchStats) {
        self.nodes_fullwidth += other.nodes_fullwidth;
        self.nodes_quiesce += other.nodes_quiesce;

        self.beta_cuts += other.beta_cuts;
        self.null_cuts += other.null_cuts;
        self.fut_cuts += other.fut_cuts;
        self.ext_fut_cuts += other.ext_fut_cuts;
        self.razor_cuts += other.razor_cuts;

        self.moves_sum += other.moves_sum;
        self.moves_cnt += other.moves_cnt;
        self.moves_sum_quiesce += other.moves_sum_quiesce;
        self.moves_cnt_quiesce += other.moves_cnt_quiesce;

        self.max_ply = self.max_ply.max(other.max_ply);
        self.max_ply_quiesce = self.max_ply_quiesce.max(other.max_ply_quiesce);

        self.eval.merge(&other.eval);
    }

    #[inline(always)]
    pub fn record_moves(&mut self, moves: usize) {
        self.moves_sum += moves as u64;
        self.moves_cnt += 1;
    }

    #[inline(always)]
    pub fn record_moves_quiesce(&mut self, moves: usize) {
        self.moves_sum_quiesce += moves as u64;
        self.moves_cnt_quiesce += 1;
    }

    /// Average moves searched per full-width node.
    pub fn branching_factor(&self) -> f64 {
        if self.moves_cnt == 0 {
            return 0.0;
        }
        self.moves_sum as f64 / self.moves_cnt as f64
    }

    pub fn branching_factor_quiesce(&self) -> f64 {
        if self.moves_cnt_quiesce == 0 {
            return 0.0;
        }
        self.moves_sum_quiesce as f64 / self.moves_cnt_quiesce as f64
    }

    /// Reset the per-iteration ply maxima.
    pub fn reset_max_ply(&mut self) {
        self.max_ply = 0;
        self.max_ply_quiesce = 0;
    }
}
