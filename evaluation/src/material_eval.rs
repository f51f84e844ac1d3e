use cozy_chess::{Board, Color, Piece};
use utils::phase_weight;

use crate::eval_cache::EvalCache;
use crate::pst::square_bonus;
use crate::traits::{EvalStats, Evaluator};
use crate::PieceValues;

/// Material balance further than this outside the window skips the positional terms.
///
/// <https://www.chessprogramming.org/Lazy_Evaluation>
pub const LAZY_MARGIN: i32 = 150;
const BISHOP_PAIR_BONUS: i32 = 30;

/// Material plus piece-square evaluation with a lazy cutoff and an evaluation cache.
pub struct MaterialEvaluator {
    values: PieceValues,
    lazy_margin: Option<i32>,
    cache: EvalCache,
    stats: EvalStats,
}

impl Default for MaterialEvaluator {
    fn default() -> Self {
        Self::new(PieceValues::default())
    }
}

impl MaterialEvaluator {
    pub fn new(values: PieceValues) -> Self {
        Self {
            values,
            lazy_margin: Some(LAZY_MARGIN),
            cache: EvalCache::new(0),
            stats: EvalStats::default(),
        }
    }

    /// `None` always computes the full evaluation, which keeps scores independent of the window.
    pub fn with_lazy_margin(mut self, margin: Option<i32>) -> Self {
        self.lazy_margin = margin;
        self
    }

    fn side_score(&self, board: &Board, color: Color, phase: u32) -> i32 {
        let mut score = 0;
        for piece in Piece::ALL {
            let pieces = board.colored_pieces(color, piece);
            score += self.values.get(piece) * pieces.len() as i32;
            for sq in pieces {
                score += square_bonus(piece, color, sq, phase);
            }
        }
        if board.colored_pieces(color, Piece::Bishop).len() >= 2 {
            score += BISHOP_PAIR_BONUS;
        }
        score
    }

    fn full_evaluation(&self, board: &Board) -> i32 {
        let phase = phase_weight(board);
        let us = board.side_to_move();
        self.side_score(board, us, phase) - self.side_score(board, !us, phase)
    }
}

impl Evaluator for MaterialEvaluator {
    fn name(&self) -> String {
        "Material".to_string()
    }

    fn evaluate(&mut self, board: &Board, alpha: i32, beta: i32) -> i32 {
        self.stats.evaluations += 1;

        if let Some(margin) = self.lazy_margin {
            let material = self.values.material_balance(board);
            if material < alpha - margin || material > beta + margin {
                self.stats.lazy += 1;
                return material;
            }
        }

        let key = board.hash();
        if self.cache.is_enabled() {
            self.stats.cache_probes += 1;
            if let Some(score) = self.cache.get(key) {
                self.stats.cache_hits += 1;
                return score;
            }
        }

        let score = self.full_evaluation(board);
        self.cache.set(key, score);
        score
    }

    fn set_cache_size(&mut self, bytes: usize) {
        self.cache = EvalCache::new(bytes);
    }

    fn clear_cache(&mut self) {
        self.cache.clear();
    }

    fn statistics(&self) -> EvalStats {
        self.stats
    }

    fn reset_statistics(&mut self) {
        self.stats = EvalStats::default();
    }

    fn fork(&self) -> Box<dyn Evaluator> {
        Box::new(Self::new(self.values).with_lazy_margin(self.lazy_margin))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scores::INFTY;

    fn full_window(eval: &mut MaterialEvaluator, fen: &str) -> i32 {
        let board: Board = fen.parse().unwrap();
        eval.evaluate(&board, -INFTY, INFTY)
    }

    #[test]
    fn test_start_position_is_even() {
        let mut eval = MaterialEvaluator::default();
        assert_eq!(eval.evaluate(&Board::default(), -INFTY, INFTY), 0);
    }

    #[test]
    fn test_color_symmetry() {
        let mut eval = MaterialEvaluator::default();
        let white = full_window(&mut eval, "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3");
        let black = full_window(&mut eval, "rnbqkb1r/pppp1ppp/5n2/4p3/4P3/2N5/PPPP1PPP/R1BQKBNR b KQkq - 2 3");
        assert_eq!(white, black);
    }

    #[test]
    fn test_lazy_cutoff_returns_material() {
        let mut eval = MaterialEvaluator::default();
        let board: Board = "k7/8/8/8/8/8/8/KQ6 w - - 0 1".parse().unwrap();

        // window far below the material balance
        assert_eq!(eval.evaluate(&board, -100, -50), 900);
        assert_eq!(eval.statistics().lazy, 1);

        let mut exact = MaterialEvaluator::default().with_lazy_margin(None);
        assert_ne!(exact.evaluate(&board, -100, -50), 900);
        assert_eq!(exact.statistics().lazy, 0);
    }

    #[test]
    fn test_cache_hits() {
        let mut eval = MaterialEvaluator::default();
        eval.set_cache_size(1024);

        let board = Board::default();
        let first = eval.evaluate(&board, -INFTY, INFTY);
        let second = eval.evaluate(&board, -INFTY, INFTY);
        assert_eq!(first, second);

        let stats = eval.statistics();
        assert_eq!(stats.cache_probes, 2);
        assert_eq!(stats.cache_hits, 1);

        eval.clear_cache();
        eval.evaluate(&board, -INFTY, INFTY);
        assert_eq!(eval.statistics().cache_hits, 1);
    }

    #[test]
    fn test_fork_has_fresh_statistics() {
        let mut eval = MaterialEvaluator::default();
        eval.evaluate(&Board::default(), -INFTY, INFTY);
        let fork = eval.fork();
        assert_eq!(fork.statistics(), EvalStats::default());
    }
}
