use std::sync::{atomic::Ordering, mpsc::Sender, Arc};

use cozy_chess::Board;
use evaluation::scores::{is_mate_score, mated_in, INFTY, MATE};
use utils::line_to_uci;

use crate::{
    arena::{NodeId, Played, PvLine},
    interface::{SearchOutcome, SearchRequest},
    statistics::SearchStats,
    telemetry::{IterationKind, IterationReport, SearchReport, StatisticsReport},
    time_control::Timer,
    MAX_DEPTH,
};

use super::{draw::stalemate_score, Engine, NodeSearch, SearchMode, ABORTED};

impl Engine {
    /// Search `request.board` and pick a move, sending telemetry to `sink`.
    pub(crate) fn run<S: NodeSearch>(
        &mut self,
        strategy: &mut S,
        request: SearchRequest,
        sink: Option<Sender<SearchReport>>,
    ) -> SearchOutcome {
        self.stop.store(false, Ordering::Relaxed);
        self.stats = SearchStats::default();
        self.evaluator.reset_statistics();
        if let Some(table) = &self.table {
            table.reset_statistics();
        }
        self.arena.clear();
        self.prehistory = request.history;
        self.timer = request
            .timer
            .unwrap_or_else(|| Arc::new(Timer::unlimited()));
        self.mode = request.mode;
        self.sink = sink;
        self.reset_timecheck();
        self.root_depth = 0;

        let root = match self.arena.push_root(request.board) {
            Ok(id) => id,
            Err(e) => panic!("Cannot create root node: {}", e),
        };
        self.arena[root].init_root();
        self.root = Some(root);

        let (best_line, score, depth) = match self.arena[root].move_count() {
            0 => {
                let score = if self.arena[root].in_check {
                    mated_in(0)
                } else {
                    stalemate_score()
                };
                (PvLine::new(), score, 0)
            }
            1 => {
                // Only move: no search needed
                let score = self
                    .evaluator
                    .evaluate(&self.arena[root].board, -INFTY, INFTY);
                (self.arena[root].best_line.clone(), score, 0)
            }
            _ => self.iterate(strategy, root, request.max_depth),
        };

        let elapsed = self.timer.elapsed();
        let mut eval = self.evaluator.statistics();
        eval.merge(&self.stats.eval);
        self.stats.eval = eval;
        let table = self.table.as_ref().map(|t| t.stats());

        self.report(SearchReport::Statistics(StatisticsReport {
            depth,
            elapsed_ms: elapsed.as_millis() as u64,
            stats: self.stats,
            table,
        }));

        self.arena.free(root);
        self.root = None;
        self.sink = None;

        SearchOutcome {
            best_move: best_line.first().copied(),
            score,
            depth,
            best_line: best_line.to_vec(),
            stats: self.stats,
            table,
            elapsed,
        }
    }

    /// Iterative deepening with aspiration windows. Returns the result of the
    /// last completed iteration.
    fn iterate<S: NodeSearch>(
        &mut self,
        strategy: &mut S,
        root: NodeId,
        max_depth: i32,
    ) -> (PvLine, i32, i32) {
        self.stop_iteration = false;
        self.ply1_lines.clear();

        let mut best_line = self.arena[root].best_line.clone();
        let mut best_score = 0;
        let mut completed_depth = 0;

        let mut alpha = -INFTY;
        let mut beta = INFTY;

        'deepening: for depth in 1..=max_depth.clamp(1, MAX_DEPTH) {
            self.root_depth = depth;

            loop {
                self.stats.reset_max_ply();
                self.iteration_start_ms = self.timer.elapsed_ms();

                let score = self.search_root(strategy, root, depth, alpha, beta);

                self.check_window(score, alpha, beta, 0);
                self.check_time(true, true);
                if self.stopped() {
                    let node = &self.arena[root];
                    log::info!(
                        "Iteration aborted after {}/{} moves",
                        node.moves_done(),
                        node.move_count()
                    );
                    break 'deepening;
                }

                if score <= alpha && score > -MATE {
                    self.report_iteration(IterationKind::FailLow, score, root);
                    if self.stop_iteration {
                        break 'deepening;
                    }
                    alpha = -INFTY;
                    continue;
                }
                if score >= beta && score < MATE {
                    self.report_iteration(IterationKind::FailHigh, score, root);
                    if self.stop_iteration {
                        break 'deepening;
                    }
                    beta = INFTY;
                    continue;
                }

                best_line = self.arena[root].best_line.clone();
                best_score = score;
                completed_depth = depth;
                self.report_iteration(IterationKind::Depth, score, root);

                if self.stop_iteration || is_mate_score(score) {
                    break 'deepening;
                }

                let window = self.config.aspiration_window.value;
                alpha = score - window;
                beta = score + window;
                break;
            }

            if self.mode == SearchMode::Move
                && !self.timer.is_exact()
                && self.config.new_iteration_check.value
                && !self.time_for_new_iteration()
            {
                log::debug!("No time for depth {}", depth + 1);
                break;
            }
        }

        (best_line, best_score, completed_depth)
    }

    /// One pass over the root moves. Moves keep their score from the
    /// previous pass for ordering, with the best move always first.
    fn search_root<S: NodeSearch>(
        &mut self,
        strategy: &mut S,
        root: NodeId,
        depth: i32,
        mut alpha: i32,
        beta: i32,
    ) -> i32 {
        let save_alpha = alpha;
        let mut best_score = -INFTY;
        let mut moves = 0;
        let mut first = true;

        self.stats.nodes_fullwidth += 1;

        if let Some(best) = self.arena[root].best_move() {
            self.arena[root].promote(best);
        }

        let mut next = self.arena[root].first(&self.history, &self.values);
        while let Some(mv) = next {
            if !self.arena[root].board.is_legal(mv) {
                panic!("Illegal root move {}", mv);
            }
            moves += 1;

            let child = self.make_child(root, Played::Move(mv), 1);
            if let Some(line) = self.ply1_lines.get(&mv) {
                self.arena[child].set_pv(line);
            }

            self.check_time(true, true);
            let score = self.search_child(strategy, child, 0, depth, alpha, beta, save_alpha, first);
            first = false;

            if self.stopped() {
                self.arena.free(child);
                return ABORTED;
            }
            self.check_window(score, alpha, beta, 0);
            self.ply1_lines
                .insert(mv, self.arena[child].best_line.clone());

            self.arena[root].set_current_score(score);
            if score > best_score {
                best_score = score;
                self.adopt_best(root, mv, child);
                if score > alpha {
                    self.report_iteration(IterationKind::Intermediate, score, root);
                }
            }
            self.arena.free(child);

            if best_score > alpha {
                alpha = best_score;
            }
            if alpha >= beta {
                self.stats.beta_cuts += 1;
                break;
            }

            next = self.arena[root].next();
        }

        self.add_history(root);
        self.stats.record_moves(moves);

        if self.failsoft() {
            best_score
        } else {
            alpha
        }
    }

    /// A single fixed-window search of `board`, without iterative deepening.
    pub(crate) fn search_position<S: NodeSearch>(
        &mut self,
        strategy: &mut S,
        board: Board,
        history: Vec<u64>,
        depth: i32,
        alpha: i32,
        beta: i32,
    ) -> i32 {
        self.stop.store(false, Ordering::Relaxed);
        self.stats = SearchStats::default();
        self.arena.clear();
        self.prehistory = history;
        self.timer = Arc::new(Timer::unlimited());
        self.mode = SearchMode::Analyze;
        self.root = None;
        self.reset_timecheck();

        let node = match self.arena.push_root(board) {
            Ok(id) => id,
            Err(e) => panic!("Cannot create root node: {}", e),
        };
        let score = strategy.search(self, node, 0, depth, alpha, beta);
        self.arena.free(node);

        score
    }

    fn report_iteration(&self, kind: IterationKind, score: i32, root: NodeId) {
        if self.slave {
            return;
        }
        let node = &self.arena[root];
        self.report(SearchReport::Iteration(IterationReport {
            kind,
            depth: self.root_depth,
            score,
            elapsed_ms: self.timer.elapsed_ms(),
            nodes: self.stats.nodes(),
            max_ply: self.stats.max_ply,
            max_ply_quiesce: self.stats.max_ply_quiesce,
            best_line: line_to_uci(&node.board, &node.best_line),
        }));
    }
}
