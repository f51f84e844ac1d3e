use std::sync::{
    atomic::Ordering,
    mpsc::{self, Receiver},
    Arc,
};

use cozy_chess::Move;
use evaluation::{
    scores::{DRAW, INFTY},
    Evaluator, PieceValues,
};

use crate::{
    arena::{NodeId, Played},
    engine::{apply_hints, Engine, NodeSearch, Sequential, SlaveTask, Visit, ABORTED},
    EngineConfig,
};

use super::slave::{Dispatch, SlaveCommand, SlaveHandle, SlaveReport};

/// Worker threads and the channel they report on. As a `NodeSearch`
/// strategy it decides at every interior node whether to split.
///
/// <https://www.chessprogramming.org/Young_Brothers_Wait_Concept>
pub(crate) struct SlavePool {
    slaves: Vec<SlaveHandle>,
    ready: Receiver<SlaveReport>,
}

impl SlavePool {
    pub fn new(count: usize, config: &EngineConfig, evaluator: &dyn Evaluator, values: PieceValues) -> Self {
        let (ready_tx, ready) = mpsc::channel();
        let slaves = (0..count)
            .map(|id| SlaveHandle::spawn(id, config, evaluator.fork(), values, ready_tx.clone()))
            .collect();
        Self { slaves, ready }
    }

    pub fn len(&self) -> usize {
        self.slaves.len()
    }

    pub fn handles(&self) -> &[SlaveHandle] {
        &self.slaves
    }

    /// Send a command to every slave.
    pub fn broadcast(&self, mut command: impl FnMut() -> SlaveCommand) {
        for slave in &self.slaves {
            slave.send(command());
        }
    }

    fn free_slave(&self) -> Option<usize> {
        self.slaves.iter().position(|s| !s.busy)
    }

    fn any_busy(&self) -> bool {
        self.slaves.iter().any(|s| s.busy)
    }

    /// Hand the whole node to one slave and wait for it.
    fn nonparallel_search(
        &mut self,
        engine: &mut Engine,
        node: NodeId,
        ply: usize,
        depth: i32,
        alpha: i32,
        beta: i32,
    ) -> i32 {
        if engine.stopped() {
            return ABORTED;
        }

        if depth > 0 {
            if engine.is_draw(node) {
                engine.arena[node].best_line.clear();
                return engine.bound_score(DRAW, alpha, beta);
            }
            if let Some(score) = engine.probe(node, depth, alpha, beta) {
                return score;
            }
        }

        let Some(id) = self.free_slave() else {
            return engine.full_width(&mut Sequential, node, ply, depth, alpha, beta);
        };

        let task = SlaveTask {
            node: Box::new(engine.arena[node].clone()),
            history: engine.history_before(node),
            ply,
            depth,
            alpha,
            beta,
            timer: Arc::clone(&engine.timer),
        };
        if !self.send_task(id, task) {
            return engine.full_width(&mut Sequential, node, ply, depth, alpha, beta);
        }

        let report = match self.ready.recv() {
            Ok(report) => report,
            Err(_) => {
                log::error!("All slaves are gone");
                engine.interrupt();
                return ABORTED;
            }
        };
        debug_assert_eq!(report.id, id, "report from an unexpected slave");
        engine.stats.merge(&report.result.stats);
        self.slaves[report.id].release();

        engine.check_time(true, false);
        if engine.stopped() || report.result.aborted {
            engine.interrupt();
            return ABORTED;
        }

        let score = report.result.score;
        engine.check_window(score, alpha, beta, ply);
        engine.arena[node].set_best_line(&report.result.best_line);
        engine.store(node, score, alpha, beta, depth);

        score
    }

    /// Young brothers wait: the first move on the master, the others spread
    /// over idle slaves.
    fn parallel_search(
        &mut self,
        engine: &mut Engine,
        node: NodeId,
        ply: usize,
        depth: i32,
        mut alpha: i32,
        beta: i32,
    ) -> i32 {
        if engine.stopped() {
            return ABORTED;
        }
        if let Visit::Done(score) = engine.prologue(self, node, ply, depth, alpha, beta) {
            return score;
        }

        let save_alpha = alpha;
        let mut best_score = -INFTY;
        let mut moves = 0;

        let mut next = engine.arena[node].first(&engine.history, &engine.values);

        // Eldest brother
        if let Some(mv) = next {
            if !engine.arena[node].board.is_legal(mv) {
                panic!("Illegal move {} at ply {}", mv, ply);
            }
            moves += 1;

            let child = engine.make_child(node, Played::Move(mv), ply + 1);
            let score = -self.search(engine, child, ply + 1, depth - 1, -beta, -alpha);

            engine.check_time(true, false);
            if engine.stopped() {
                engine.arena.free(child);
                return ABORTED;
            }
            engine.check_window(score, alpha, beta, ply);

            best_score = score;
            engine.adopt_best(node, mv, child);
            engine.arena.free(child);

            if best_score > alpha {
                alpha = best_score;
            }
            if alpha >= beta {
                engine.stats.beta_cuts += 1;
            }
            next = engine.arena[node].next();
        }

        // Young brothers
        while alpha < beta {
            engine.check_time(true, false);
            if engine.stopped() {
                self.abort_all(engine);
                return ABORTED;
            }

            while let Some(mv) = next {
                let Some(id) = self.free_slave() else {
                    break;
                };
                moves += 1;
                self.dispatch_move(engine, id, node, mv, ply, depth, alpha, beta, save_alpha);
                next = engine.arena[node].next();
            }

            if !self.any_busy() {
                break;
            }

            let report = match self.ready.recv() {
                Ok(report) => report,
                Err(_) => {
                    log::error!("All slaves are gone");
                    engine.interrupt();
                    self.slaves.iter_mut().for_each(SlaveHandle::release);
                    return ABORTED;
                }
            };
            engine.stats.merge(&report.result.stats);

            let id = report.id;
            let Some(dispatch) = self.slaves[id].dispatch else {
                log::error!("Slave {} reported without a task", id);
                self.slaves[id].release();
                continue;
            };

            if report.result.aborted {
                self.slaves[id].release();
                if !engine.stopped() {
                    engine.interrupt();
                }
                continue;
            }

            let score = -report.result.score;
            if dispatch.nullwin && dispatch.alpha < score && score < beta {
                self.redispatch(engine, id, node, ply, depth, alpha, beta);
                continue;
            }

            if score > best_score {
                best_score = score;
                engine.arena[node].set_best(dispatch.mv, &report.result.best_line);
            }

            let key = self.slaves[id].arena[dispatch.child].key;
            let (child_alpha, child_beta) = dispatch.window;
            engine.store_line(
                key,
                report.result.score,
                child_alpha,
                child_beta,
                depth - 1,
                &report.result.best_line,
            );
            self.slaves[id].release();

            if best_score > alpha {
                alpha = best_score;
            }
            if alpha >= beta {
                engine.stats.beta_cuts += 1;
                self.abort_all(engine);
            }
        }

        engine.finish_node(node, ply, depth, moves, best_score, alpha, save_alpha, beta)
    }

    /// Build the child for `mv` in the slave's dispatch arena and send it off.
    #[allow(clippy::too_many_arguments)]
    fn dispatch_move(
        &mut self,
        engine: &Engine,
        id: usize,
        node: NodeId,
        mv: Move,
        ply: usize,
        depth: i32,
        alpha: i32,
        beta: i32,
        save_alpha: i32,
    ) {
        if !engine.arena[node].board.is_legal(mv) {
            panic!("Illegal move {} at ply {}", mv, ply);
        }

        let nullwin = match engine.config.parallel_pvs_mode.value {
            1 => true,
            2 => alpha > save_alpha,
            _ => false,
        };
        let window = if nullwin {
            (-alpha - 1, -alpha)
        } else {
            (-beta, -alpha)
        };

        let slave = &mut self.slaves[id];
        let child = match engine
            .arena
            .make_move_into(node, Played::Move(mv), &mut slave.arena)
        {
            Ok(child) => child,
            Err(e) => panic!("Cannot dispatch move {} at ply {}: {}", mv, ply, e),
        };
        if let Some(table) = &engine.table {
            if let Some((entry, fragment)) = table.probe(&slave.arena[child].board) {
                apply_hints(&mut slave.arena[child], &entry, &fragment);
            }
        }
        slave.dispatch = Some(Dispatch {
            mv,
            child,
            alpha,
            nullwin,
            window,
        });

        self.send_dispatched(engine, id, node, ply, depth);
    }

    /// Search the slave's dispatched child again with the full window.
    #[allow(clippy::too_many_arguments)]
    fn redispatch(
        &mut self,
        engine: &Engine,
        id: usize,
        node: NodeId,
        ply: usize,
        depth: i32,
        alpha: i32,
        beta: i32,
    ) {
        if let Some(dispatch) = self.slaves[id].dispatch.as_mut() {
            dispatch.nullwin = false;
            dispatch.alpha = alpha;
            dispatch.window = (-beta, -alpha);
        }
        self.send_dispatched(engine, id, node, ply, depth);
    }

    fn send_dispatched(&mut self, engine: &Engine, id: usize, node: NodeId, ply: usize, depth: i32) {
        let slave = &self.slaves[id];
        let Some(dispatch) = slave.dispatch else {
            return;
        };
        let (alpha, beta) = dispatch.window;
        let task = SlaveTask {
            node: Box::new(slave.arena[dispatch.child].clone()),
            history: engine.history_through(node),
            ply: ply + 1,
            depth: depth - 1,
            alpha,
            beta,
            timer: Arc::clone(&engine.timer),
        };
        if !self.send_task(id, task) {
            // the report never comes; stop instead of waiting for it
            self.slaves[id].release();
            engine.interrupt();
        }
    }

    fn send_task(&mut self, id: usize, task: SlaveTask) -> bool {
        let slave = &mut self.slaves[id];
        slave.stop.store(false, Ordering::Relaxed);
        slave.busy = slave.send(SlaveCommand::Search(Box::new(task)));
        slave.busy
    }

    /// Interrupt every busy slave and collect its report.
    fn abort_all(&mut self, engine: &mut Engine) {
        let busy = self.slaves.iter().filter(|s| s.busy).count();
        for slave in self.slaves.iter().filter(|s| s.busy) {
            slave.interrupt();
        }

        for _ in 0..busy {
            match self.ready.recv() {
                Ok(report) => {
                    engine.stats.merge(&report.result.stats);
                    self.slaves[report.id].release();
                }
                Err(_) => break,
            }
        }
        self.slaves.iter_mut().for_each(SlaveHandle::release);
    }
}

impl NodeSearch for SlavePool {
    fn search(
        &mut self,
        engine: &mut Engine,
        node: NodeId,
        ply: usize,
        depth: i32,
        alpha: i32,
        beta: i32,
    ) -> i32 {
        if depth < engine.config.parallel_min_depth.value {
            return self.nonparallel_search(engine, node, ply, depth, alpha, beta);
        }

        engine.arena[node].ensure_moves();
        let needed = engine.config.parallel_min_move_ratio.value * self.slaves.len();
        if engine.arena[node].move_count() < needed {
            return engine.full_width(self, node, ply, depth, alpha, beta);
        }

        self.parallel_search(engine, node, ply, depth, alpha, beta)
    }
}

impl Drop for SlavePool {
    fn drop(&mut self) {
        for slave in &self.slaves {
            slave.interrupt();
        }
        for slave in &mut self.slaves {
            slave.shutdown();
        }
    }
}
