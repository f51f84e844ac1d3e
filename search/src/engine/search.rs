use evaluation::scores::{mated_in, DRAW, INFTY};
use utils::{game_phase, is_tactical, GamePhase};

use crate::arena::{NodeId, NodeKind, Played};

use super::draw::stalemate_score;
use super::{Engine, NodeSearch, Visit, ABORTED};

impl Engine {
    /// Interior node: draw check, table, pruning, then the move loop.
    pub(crate) fn full_width<S: NodeSearch>(
        &mut self,
        strategy: &mut S,
        node: NodeId,
        ply: usize,
        depth: i32,
        mut alpha: i32,
        beta: i32,
    ) -> i32 {
        if self.stopped() {
            return ABORTED;
        }
        if depth <= 0 {
            return self.quiescence(node, ply, alpha, beta);
        }

        if let Visit::Done(score) = self.prologue(strategy, node, ply, depth, alpha, beta) {
            return score;
        }

        let save_alpha = alpha;
        let mut depth = depth;
        let material = self.arena[node].material;

        // Razoring
        // <https://www.chessprogramming.org/Razoring>
        if self.config.razoring.value
            && depth == self.config.razor_depth.value
            && material + self.config.razor_margin.value <= alpha
        {
            self.stats.razor_cuts += 1;
            depth -= 1;
        }

        // Futility pruning at frontier nodes, extended futility one ply above
        // <https://www.chessprogramming.org/Futility_Pruning>
        let mut fprune = false;
        if self.config.futility.value {
            if depth == 1 && material + self.config.futility_margin.value <= alpha {
                fprune = true;
            } else if depth == 2 && material + self.config.ext_futility_margin.value <= alpha {
                self.stats.ext_fut_cuts += 1;
                fprune = true;
                depth -= 1;
            }
        }

        let mut best_score = -INFTY;
        let mut moves = 0;
        let mut first = true;

        let mut next = self.arena[node].first(&self.history, &self.values);
        while let Some(mv) = next {
            moves += 1;
            let child = self.make_child(node, Played::Move(mv), ply + 1);

            if fprune
                && !self.arena[node].in_check
                && !self.arena[child].in_check
                && !is_tactical(&self.arena[node].board, mv)
            {
                self.stats.fut_cuts += 1;
                self.arena.free(child);
                next = self.arena[node].next();
                continue;
            }

            let score =
                self.search_child(strategy, child, ply, depth, alpha, beta, save_alpha, first);
            first = false;

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

        self.finish_node(node, ply, depth, moves, best_score, alpha, save_alpha, beta)
    }

    /// Work shared by every interior node before its moves are searched:
    /// draw detection, table probe, null move and internal iterative deepening.
    pub(crate) fn prologue<S: NodeSearch>(
        &mut self,
        strategy: &mut S,
        node: NodeId,
        ply: usize,
        depth: i32,
        alpha: i32,
        beta: i32,
    ) -> Visit {
        self.arena[node].best_line.clear();

        if self.is_draw(node) {
            return Visit::Done(self.bound_score(DRAW, alpha, beta));
        }

        self.stats.nodes_fullwidth += 1;
        self.stats.max_ply = self.stats.max_ply.max(ply);

        if let Some(score) = self.probe(node, depth, alpha, beta) {
            return Visit::Done(score);
        }

        // Null move pruning
        // <https://www.chessprogramming.org/Null_Move_Pruning>
        if self.null_move_allowed(node) {
            let reduction = self.config.null_move_reduction.value;
            let child = self.make_child(node, Played::Null, ply + 1);
            let score = -strategy.search(self, child, ply + 1, depth - reduction - 1, -beta, -beta + 1);
            self.arena.free(child);

            if self.stopped() {
                return Visit::Done(ABORTED);
            }
            if score >= beta {
                self.stats.null_cuts += 1;
                return Visit::Done(if self.failsoft() { score } else { beta });
            }
        }

        // Internal iterative deepening
        // <https://www.chessprogramming.org/Internal_Iterative_Deepening>
        // A reduced depth below one would only visit the node in quiescence.
        let n = &self.arena[node];
        let iid_depth = depth - self.config.iid_reduction.value;
        if self.config.iid.value
            && n.pv_move().is_none()
            && n.hash_move.is_none()
            && depth >= self.config.iid_min_depth.value
            && iid_depth >= 1
        {
            strategy.search(self, node, ply, iid_depth, alpha, beta);
            if self.stopped() {
                return Visit::Done(ABORTED);
            }
            let n = &mut self.arena[node];
            n.hash_move = n.best_move();
        }

        self.arena[node].kind = NodeKind::FullWidth;
        Visit::Expand
    }

    /// Null moves are never tried in check, right after the opponent passed,
    /// or in endgames where zugzwang is common.
    fn null_move_allowed(&self, node: NodeId) -> bool {
        let n = &self.arena[node];
        self.config.null_move.value
            && !n.in_check
            && n.played != Played::Null
            && game_phase(&n.board) != GamePhase::Endgame
    }

    /// Search one child with principal variation search: a null window when
    /// `pvs_mode` asks for it, then a full window re-search if the null
    /// window result lands strictly inside (alpha, beta).
    ///
    /// <https://www.chessprogramming.org/Principal_Variation_Search>
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn search_child<S: NodeSearch>(
        &mut self,
        strategy: &mut S,
        child: NodeId,
        ply: usize,
        depth: i32,
        alpha: i32,
        beta: i32,
        save_alpha: i32,
        first: bool,
    ) -> i32 {
        let nullwin = match self.config.pvs_mode.value {
            1 => !first,
            2 => alpha > save_alpha,
            _ => false,
        };

        if nullwin {
            let score = -strategy.search(self, child, ply + 1, depth - 1, -alpha - 1, -alpha);
            if self.stopped() || score <= alpha || score >= beta {
                return score;
            }
        }

        -strategy.search(self, child, ply + 1, depth - 1, -beta, -alpha)
    }

    /// Work shared by every interior node after its moves were searched:
    /// mate and stalemate, table store, history and killers.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn finish_node(
        &mut self,
        node: NodeId,
        ply: usize,
        depth: i32,
        moves: usize,
        mut best_score: i32,
        mut alpha: i32,
        save_alpha: i32,
        beta: i32,
    ) -> i32 {
        if moves == 0 {
            best_score = if self.arena[node].in_check {
                mated_in(ply)
            } else {
                stalemate_score()
            };
            alpha = self.bound_score(best_score, save_alpha, beta);
        } else if best_score == -INFTY {
            // every move was pruned
            best_score = alpha;
        }

        let result = if self.failsoft() { best_score } else { alpha };

        self.store(node, result, save_alpha, beta, depth);
        self.add_history(node);
        self.add_killer(node);
        self.stats.record_moves(moves);

        result
    }

    pub(crate) fn add_history(&mut self, node: NodeId) {
        let n = &self.arena[node];
        if let Some(mv) = n.best_move() {
            self.history.add(n.board.side_to_move(), mv);
        }
    }

    /// Quiet best moves other than the hash move become killers.
    fn add_killer(&mut self, node: NodeId) {
        let n = &mut self.arena[node];
        let Some(best) = n.best_move() else {
            return;
        };
        if Some(best) != n.hash_move && !is_tactical(&n.board, best) {
            n.add_killer(best);
        }
    }
}

#[cfg(test)]
mod tests {
    use cozy_chess::Board;
    use evaluation::scores::INFTY;
    use evaluation::MaterialEvaluator;

    use crate::engine::{Engine, Sequential};
    use crate::interface::SearchEngine;
    use crate::EngineConfig;

    const MIDDLEGAME: &str = "r1bqk2r/pppp1ppp/2n2n2/2b1p3/2B1P3/3P1N2/PPP2PPP/RNBQK2R w KQkq - 1 5";
    const QUEEN_UP: &str = "r1b1k2r/pppp1ppp/2n2n2/2b1p3/2B1P3/3P1N2/PPP2PPP/RNBQK2R w KQkq - 1 5";

    fn plain_engine(pvs_mode: u8) -> Engine {
        let mut config = EngineConfig::default();
        config.hash_size_mb.value = 0;
        config.null_move.value = false;
        config.iid.value = false;
        config.razoring.value = false;
        config.futility.value = false;
        config.pvs_mode.value = pvs_mode;
        Engine::new(
            &config,
            Box::new(MaterialEvaluator::default().with_lazy_margin(None)),
        )
    }

    #[test]
    fn test_mate_in_one() {
        let mut engine = Engine::default();
        let board: Board = "6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1".parse().unwrap();
        let root = engine.arena.push_root(board).unwrap();

        let score = engine.full_width(&mut Sequential, root, 0, 2, -INFTY, INFTY);
        assert_eq!(score, INFTY - 1);
        assert_eq!(
            engine.arena[root].best_move().map(|m| m.to_string()),
            Some("a1a8".to_string())
        );
    }

    #[test]
    fn test_pvs_matches_full_window() {
        let board: Board = MIDDLEGAME.parse().unwrap();
        let expected = plain_engine(0).search(&board, &[], 4, -INFTY, INFTY);
        assert_eq!(plain_engine(1).search(&board, &[], 4, -INFTY, INFTY), expected);
        assert_eq!(plain_engine(2).search(&board, &[], 4, -INFTY, INFTY), expected);
    }

    #[test]
    fn test_same_window_same_score() {
        let mut config = EngineConfig::default();
        config.hash_size_mb.value = 0;
        let mut engine = Engine::new(&config, Box::new(MaterialEvaluator::default()));
        let board: Board = MIDDLEGAME.parse().unwrap();

        engine.clear_tables();
        let first = engine.search(&board, &[], 4, -30, 30);
        engine.clear_tables();
        let second = engine.search(&board, &[], 4, -30, 30);

        assert_eq!(first, second);
        // fail-hard stays inside the window
        assert!((-30..=30).contains(&first));
    }

    #[test]
    fn test_iid_keeps_the_score() {
        let board: Board = "6k1/5ppp/8/8/8/8/p7/R5K1 w - - 0 1".parse().unwrap();

        for (min_depth, reduction, depth) in [(2, 2, 2), (2, 1, 2), (2, 2, 3), (2, 10, 4)] {
            let mut engine = plain_engine(0);
            let mut config = engine.config.clone();
            config.iid.value = true;
            config.iid_min_depth.value = min_depth;
            config.iid_reduction.value = reduction;
            engine.configure(&config, false);

            let plain = plain_engine(0).search(&board, &[], depth, -INFTY, INFTY);
            let score = engine.search(&board, &[], depth, -INFTY, INFTY);
            assert_eq!(score, plain, "IidMinDepth={} IidReduction={}", min_depth, reduction);
        }
    }

    #[test]
    fn test_failsoft_full_window_matches_failhard() {
        for fen in [MIDDLEGAME, "6k1/5ppp/8/8/8/8/p7/R5K1 w - - 0 1"] {
            let board: Board = fen.parse().unwrap();
            let hard = plain_engine(1).search(&board, &[], 4, -INFTY, INFTY);

            let mut soft = plain_engine(1);
            let mut config = soft.config.clone();
            config.failsoft.value = true;
            soft.configure(&config, false);

            assert_eq!(soft.search(&board, &[], 4, -INFTY, INFTY), hard, "{}", fen);
        }
    }

    #[test]
    fn test_failsoft_returns_scores_outside_the_window() {
        // black is a queen down
        let board: Board = QUEEN_UP.parse().unwrap();

        let mut hard = Engine::default();
        assert_eq!(hard.search(&board, &[], 3, -10, 10), 10);
        hard.clear_tables();
        assert_eq!(hard.search(&board, &[], 3, 2000, 2010), 2000);

        let mut config = EngineConfig::default();
        config.failsoft.value = true;
        let mut soft = Engine::new(&config, Box::new(MaterialEvaluator::default()));
        assert!(soft.search(&board, &[], 3, -10, 10) > 100);
        soft.clear_tables();
        assert!(soft.search(&board, &[], 3, 2000, 2010) < 2000);
    }

    #[test]
    fn test_pruning_is_counted() {
        let mut engine = Engine::default();
        engine.search(&Board::default(), &[], 5, -INFTY, INFTY);
        let stats = engine.stats;
        assert!(stats.beta_cuts > 0);
        assert!(stats.null_cuts > 0);
        assert!(stats.nodes_quiesce > 0);
        assert!(stats.moves_cnt > 0);
    }

    #[test]
    fn test_stopped_search_returns_sentinel() {
        let mut engine = Engine::default();
        let root = engine.arena.push_root(Board::default()).unwrap();
        engine.interrupt();
        let score = engine.full_width(&mut Sequential, root, 0, 3, -INFTY, INFTY);
        assert_eq!(score, crate::engine::ABORTED);
    }
}
