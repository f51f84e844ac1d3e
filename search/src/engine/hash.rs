use crate::{
    arena::{Node, NodeId},
    transposition::{HashEntry, PvFragment},
};

use super::Engine;

/// Use a table hit as move ordering hints: the stored move becomes the hash
/// move, and a longer stored line replaces the node's PV.
pub(crate) fn apply_hints(node: &mut Node, entry: &HashEntry, fragment: &PvFragment) {
    node.hash_move = entry.best_move;
    if fragment.len() > node.pv.len() {
        node.set_pv(fragment);
    }
}

impl Engine {
    /// Probe the table for `node`. Returns the score if the entry can replace
    /// a search of `depth` with this window; any hit still seeds ordering.
    pub(crate) fn probe(&mut self, node: NodeId, depth: i32, alpha: i32, beta: i32) -> Option<i32> {
        let table = self.table.as_ref()?;
        let (entry, fragment) = table.probe(&self.arena[node].board)?;

        let n = &mut self.arena[node];
        apply_hints(n, &entry, &fragment);

        if !entry.usable(depth, alpha, beta) {
            return None;
        }

        if !fragment.is_empty() {
            n.set_best_line(&fragment);
        } else if let Some(mv) = entry.best_move {
            n.set_best(mv, &[]);
        }

        Some(self.bound_score(entry.score, alpha, beta))
    }

    /// Store the result of searching `node` with the window (alpha, beta).
    pub(crate) fn store(&self, node: NodeId, score: i32, alpha: i32, beta: i32, depth: i32) {
        let n = &self.arena[node];
        self.store_line(n.key, score, alpha, beta, depth, &n.best_line);
    }

    pub(crate) fn store_line(
        &self,
        key: u64,
        score: i32,
        alpha: i32,
        beta: i32,
        depth: i32,
        line: &[cozy_chess::Move],
    ) {
        let Some(table) = &self.table else {
            return;
        };
        let entry = HashEntry::from_search(key, score, alpha, beta, depth, line.first().copied());
        table.store(&entry, Some(line));
    }
}
