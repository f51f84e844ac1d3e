use evaluation::scores::{mated_in, INFTY};

use crate::arena::{NodeId, NodeKind, Played};
use crate::MAX_PLY;

use super::{Engine, ABORTED};

impl Engine {
    /// Capture search below the horizon, bounded by a stand-pat evaluation.
    ///
    /// <https://www.chessprogramming.org/Quiescence_Search>
    pub(crate) fn quiescence(&mut self, node: NodeId, ply: usize, mut alpha: i32, beta: i32) -> i32 {
        if self.stopped() {
            return ABORTED;
        }

        self.arena[node].best_line.clear();
        self.stats.nodes_quiesce += 1;
        self.stats.max_ply_quiesce = self.stats.max_ply_quiesce.max(ply);

        if let Some(score) = self.probe(node, 0, alpha, beta) {
            return score;
        }

        let save_alpha = alpha;

        // Stand pat, except in check where every evasion is searched
        let in_check = self.arena[node].in_check;
        let eval = if in_check {
            -INFTY
        } else {
            self.evaluator.evaluate(&self.arena[node].board, alpha, beta)
        };
        if eval >= beta {
            return if self.failsoft() { eval } else { beta };
        }
        if eval > alpha {
            alpha = eval;
        }
        let mut best_score = eval;

        if ply >= MAX_PLY - 1 {
            log::warn!("Quiescence reached the ply ceiling ({})", ply);
            return if self.failsoft() { eval } else { alpha };
        }

        self.arena[node].kind = NodeKind::Quiesce;

        let mut moves = 0;
        let mut next = self.arena[node].first(&self.history, &self.values);
        while let Some(mv) = next {
            moves += 1;
            let child = self.make_child(node, Played::Move(mv), ply + 1);
            let score = -self.quiescence(child, ply + 1, -beta, -alpha);

            self.check_time(false, false);
            if self.stopped() {
                self.arena.free(child);
                return ABORTED;
            }
            self.check_window(score, alpha, beta, ply);

            if score > best_score {
                best_score = score;
                self.adopt_best(node, mv, child);
            }
            self.arena.free(child);

            if best_score > alpha {
                alpha = best_score;
            }
            if alpha >= beta {
                self.stats.beta_cuts += 1;
                break;
            }

            next = self.arena[node].next();
        }

        // Evasions are complete, so no moves in check is mate.
        if moves == 0 && in_check {
            best_score = mated_in(ply);
            alpha = self.bound_score(best_score, save_alpha, beta);
        }

        let result = if self.failsoft() { best_score } else { alpha };
        self.store(node, result, save_alpha, beta, 0);
        self.stats.record_moves_quiesce(moves);

        result
    }
}
