//! Fixed-capacity node storage with stack discipline.
//!
//! Nodes are handed out and returned in strict LIFO order, so the live
//! nodes of an arena always form the path from the root to the current ply.
//! Parents are referenced by index, which stays valid for as long as the
//! child is alive.

mod node;

use std::fmt;
use std::ops::{Index, IndexMut};

use cozy_chess::Board;
use evaluation::PieceValues;

pub use node::{Node, NodeKind, Played, PvLine, ScoredMove, MAX_MOVES};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArenaError {
    /// Every slot is live
    Exhausted { capacity: usize },
    /// A null move was requested while the side to move is in check
    NullMoveInCheck,
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArenaError::Exhausted { capacity } => {
                write!(f, "node arena exhausted ({} nodes)", capacity)
            }
            ArenaError::NullMoveInCheck => write!(f, "null move while in check"),
        }
    }
}

impl std::error::Error for ArenaError {}

pub struct NodeArena {
    slots: Vec<Node>,
    /// Number of live nodes; slot `top - 1` is the only one that may be freed
    top: usize,
    capacity: usize,
    values: PieceValues,
}

impl NodeArena {
    pub fn new(capacity: usize, values: PieceValues) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            top: 0,
            capacity,
            values,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.top
    }

    pub fn is_empty(&self) -> bool {
        self.top == 0
    }

    pub fn values(&self) -> &PieceValues {
        &self.values
    }

    /// Reserve the next slot. The slot keeps whatever it held before; callers
    /// initialize it through `push_root`, `push_copy` or `make_move`.
    fn alloc(&mut self, board: &Board) -> Result<NodeId, ArenaError> {
        if self.top == self.capacity {
            return Err(ArenaError::Exhausted {
                capacity: self.capacity,
            });
        }

        let id = NodeId(self.top);
        if self.slots.len() == self.top {
            self.slots.push(Node::new(board.clone(), &self.values, id));
        }
        self.top += 1;
        Ok(id)
    }

    /// Return the most recently allocated node.
    pub fn free(&mut self, id: NodeId) {
        debug_assert_eq!(
            id.0 + 1,
            self.top,
            "node {} freed out of order (top is {})",
            id.0,
            self.top
        );
        self.top -= 1;
    }

    /// Drop every live node.
    pub fn clear(&mut self) {
        self.top = 0;
    }

    /// Place a position at the bottom of an empty arena.
    pub fn push_root(&mut self, board: Board) -> Result<NodeId, ArenaError> {
        debug_assert!(self.is_empty(), "root pushed onto a live arena");
        let id = self.alloc(&board)?;
        self.slots[id.0] = Node::new(board, &self.values, id);
        Ok(id)
    }

    /// Copy a node from another arena. The copy has no parent here.
    pub fn push_copy(&mut self, node: &Node) -> Result<NodeId, ArenaError> {
        let id = self.alloc(&node.board)?;
        let slot = &mut self.slots[id.0];
        slot.clone_from(node);
        slot.parent = None;
        slot.root = id;
        Ok(id)
    }

    fn child_board(parent: &Node, played: Played) -> Result<Board, ArenaError> {
        match played {
            Played::Move(mv) => {
                let mut board = parent.board.clone();
                board.play_unchecked(mv);
                Ok(board)
            }
            Played::Null => parent.board.null_move().ok_or(ArenaError::NullMoveInCheck),
            Played::Root => Ok(parent.board.clone()),
        }
    }

    /// Create the child of `parent` reached by `played` in this arena.
    pub fn make_move(&mut self, parent: NodeId, played: Played) -> Result<NodeId, ArenaError> {
        let board = Self::child_board(&self.slots[parent.0], played)?;
        let id = self.alloc(&board)?;

        let (below, above) = self.slots.split_at_mut(id.0);
        above[0].become_child(&below[parent.0], Some(parent), id, played, board, &self.values);
        Ok(id)
    }

    /// Create the child of `parent` in another arena. The child has no
    /// parent link there, since indices only make sense within one arena.
    pub fn make_move_into(
        &self,
        parent: NodeId,
        played: Played,
        target: &mut NodeArena,
    ) -> Result<NodeId, ArenaError> {
        let parent = &self.slots[parent.0];
        let board = Self::child_board(parent, played)?;
        let id = target.alloc(&board)?;
        target.slots[id.0].become_child(parent, None, id, played, board, &target.values);
        Ok(id)
    }

    /// Position hashes on the path above `id`, oldest first.
    pub fn line_keys(&self, id: NodeId) -> Vec<u64> {
        let mut keys = Vec::new();
        let mut current = self[id].parent;
        while let Some(p) = current {
            keys.push(self[p].key);
            current = self[p].parent;
        }
        keys.reverse();
        keys
    }
}

impl Index<NodeId> for NodeArena {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        debug_assert!(id.0 < self.top, "access to freed node {}", id.0);
        &self.slots[id.0]
    }
}

impl IndexMut<NodeId> for NodeArena {
    fn index_mut(&mut self, id: NodeId) -> &mut Node {
        debug_assert!(id.0 < self.top, "access to freed node {}", id.0);
        &mut self.slots[id.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MAX_PLY;
    use cozy_chess::Move;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use utils::collect_legal_moves;

    fn arena(capacity: usize) -> NodeArena {
        NodeArena::new(capacity, PieceValues::default())
    }

    fn uci(board: &Board, s: &str) -> Move {
        cozy_chess::util::parse_uci_move(board, s).unwrap()
    }

    #[test]
    fn test_make_move_links_parent() {
        let mut arena = arena(4);
        let root = arena.push_root(Board::default()).unwrap();
        let e4 = uci(&arena[root].board, "e2e4");
        let child = arena.make_move(root, Played::Move(e4)).unwrap();

        assert_eq!(arena[child].parent, Some(root));
        assert_eq!(arena[child].root, root);
        assert_eq!(arena[child].played, Played::Move(e4));
        assert_ne!(arena[child].key, arena[root].key);
        assert_eq!(arena.len(), 2);

        arena.free(child);
        arena.free(root);
        assert!(arena.is_empty());
    }

    #[test]
    fn test_child_inherits_pv_tail() {
        let mut arena = arena(4);
        let root = arena.push_root(Board::default()).unwrap();
        let board = arena[root].board.clone();
        let e4 = uci(&board, "e2e4");
        let d4 = uci(&board, "d2d4");
        let e5 = uci(&utils::make_move(&board, e4), "e7e5");
        arena[root].set_pv(&[e4, e5]);

        let child = arena.make_move(root, Played::Move(e4)).unwrap();
        assert_eq!(arena[child].pv.as_slice(), &[e5]);
        arena.free(child);

        let child = arena.make_move(root, Played::Move(d4)).unwrap();
        assert!(arena[child].pv.is_empty());
    }

    #[test]
    fn test_null_move_in_check_is_rejected() {
        let mut arena = arena(4);
        let board: Board = "k7/8/8/8/8/8/8/r3K3 w - - 0 1".parse().unwrap();
        let root = arena.push_root(board).unwrap();
        assert_eq!(
            arena.make_move(root, Played::Null),
            Err(ArenaError::NullMoveInCheck)
        );
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn test_exhaustion() {
        let mut arena = arena(2);
        let root = arena.push_root(Board::default()).unwrap();
        let e4 = uci(&arena[root].board, "e2e4");
        let child = arena.make_move(root, Played::Move(e4)).unwrap();
        let e5 = uci(&arena[child].board, "e7e5");
        assert_eq!(
            arena.make_move(child, Played::Move(e5)),
            Err(ArenaError::Exhausted { capacity: 2 })
        );
    }

    #[test]
    fn test_make_move_into_other_arena() {
        let mut master = arena(4);
        let mut dispatch = arena(1);
        let root = master.push_root(Board::default()).unwrap();
        let e4 = uci(&master[root].board, "e2e4");

        let child = master
            .make_move_into(root, Played::Move(e4), &mut dispatch)
            .unwrap();
        assert_eq!(dispatch[child].parent, None);
        assert_eq!(dispatch[child].root, child);
        assert_eq!(master.len(), 1);
        assert!(master.make_move_into(root, Played::Move(e4), &mut dispatch).is_err());
    }

    #[test]
    fn test_line_keys() {
        let mut arena = arena(4);
        let root = arena.push_root(Board::default()).unwrap();
        let e4 = uci(&arena[root].board, "e2e4");
        let a = arena.make_move(root, Played::Move(e4)).unwrap();
        let e5 = uci(&arena[a].board, "e7e5");
        let b = arena.make_move(a, Played::Move(e5)).unwrap();
        assert_eq!(arena.line_keys(b), vec![arena[root].key, arena[a].key]);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "freed out of order")]
    fn test_out_of_order_free_panics() {
        let mut arena = arena(4);
        let root = arena.push_root(Board::default()).unwrap();
        let e4 = uci(&arena[root].board, "e2e4");
        let _child = arena.make_move(root, Played::Move(e4)).unwrap();
        arena.free(root);
    }

    #[test]
    fn test_random_walks_stay_within_capacity() {
        let mut rng = StdRng::seed_from_u64(0x5EED);
        let mut arena = arena(MAX_PLY);

        for _ in 0..50 {
            let root = arena.push_root(Board::default()).unwrap();
            let mut path = vec![root];

            for _ in 0..2000 {
                let top = *path.last().unwrap();
                let descend = path.len() < MAX_PLY && rng.gen_bool(0.55);
                let moves = collect_legal_moves(&arena[top].board);

                if descend && !moves.is_empty() {
                    let mv = moves[rng.gen_range(0..moves.len())];
                    let child = arena.make_move(top, Played::Move(mv)).unwrap();
                    path.push(child);
                } else if path.len() > 1 {
                    arena.free(top);
                    path.pop();
                }
                assert_eq!(arena.len(), path.len());
            }

            while let Some(id) = path.pop() {
                arena.free(id);
            }
            assert!(arena.is_empty());
        }
    }
}
