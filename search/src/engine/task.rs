use std::sync::Arc;

use crate::{arena::Node, arena::PvLine, statistics::SearchStats, time_control::Timer};

use super::{Engine, Sequential};

/// A subtree handed from the master to a slave.
pub(crate) struct SlaveTask {
    /// Copy of the node to search, already seeded with table hints
    pub node: Box<Node>,
    /// Position hashes leading to the node, oldest first
    pub history: Vec<u64>,
    pub ply: usize,
    pub depth: i32,
    pub alpha: i32,
    pub beta: i32,
    pub timer: Arc<Timer>,
}

/// What a slave sends back after a task.
#[derive(Debug, Clone)]
pub(crate) struct TaskResult {
    pub score: i32,
    pub best_line: PvLine,
    pub stats: SearchStats,
    /// The score must be discarded
    pub aborted: bool,
}

impl Engine {
    /// Search a node copied from another engine's tree. Repetitions are
    /// detected through `task.history`.
    pub(crate) fn search_task(&mut self, task: SlaveTask) -> TaskResult {
        self.arena.clear();
        self.stats = SearchStats::default();
        self.evaluator.reset_statistics();
        self.prehistory = task.history;
        self.timer = task.timer;
        self.reset_timecheck();

        let node = match self.arena.push_copy(&task.node) {
            Ok(id) => id,
            Err(e) => panic!("Cannot start slave task: {}", e),
        };

        let score = self.full_width(
            &mut Sequential,
            node,
            task.ply,
            task.depth,
            task.alpha,
            task.beta,
        );
        let aborted = self.stopped();

        let best_line = std::mem::take(&mut self.arena[node].best_line);
        self.arena.free(node);
        self.stats.eval = self.evaluator.statistics();

        TaskResult {
            score,
            best_line,
            stats: self.stats,
            aborted,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use cozy_chess::Board;
    use evaluation::scores::INFTY;

    use super::*;
    use crate::arena::NodeArena;
    use evaluation::PieceValues;

    fn task_for(fen: &str, depth: i32) -> SlaveTask {
        let mut arena = NodeArena::new(1, PieceValues::default());
        let board: Board = fen.parse().unwrap();
        let root = arena.push_root(board).unwrap();
        SlaveTask {
            node: Box::new(arena[root].clone()),
            history: Vec::new(),
            ply: 1,
            depth,
            alpha: -INFTY,
            beta: INFTY,
            timer: Arc::new(Timer::unlimited()),
        }
    }

    #[test]
    fn test_task_matches_direct_search() {
        let fen = "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3";

        let mut slave = Engine::default();
        slave.configure_table(0);
        let result = slave.search_task(task_for(fen, 3));
        assert!(!result.aborted);
        assert!(!result.best_line.is_empty());
        assert!(result.stats.nodes() > 0);
        assert_eq!(slave.arena.len(), 0);

        let mut direct = Engine::default();
        direct.configure_table(0);
        let root = direct.arena.push_root(fen.parse().unwrap()).unwrap();
        let score = direct.full_width(&mut Sequential, root, 1, 3, -INFTY, INFTY);
        assert_eq!(result.score, score);
    }

    #[test]
    fn test_stopped_task_is_aborted() {
        let mut slave = Engine::default();
        slave.interrupt();
        let result = slave.search_task(task_for(
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            4,
        ));
        assert!(result.aborted);
    }
}
