use arrayvec::ArrayVec;
use cozy_chess::{Board, Move};
use evaluation::PieceValues;
use utils::{captured_piece, has_check, is_tactical, visit_moves};

use crate::history::HistoryTable;
use crate::MAX_PLY;

use super::NodeId;

/// Upper bound on legal moves in any chess position (218), rounded up.
pub const MAX_MOVES: usize = 256;

pub type PvLine = ArrayVec<Move, MAX_PLY>;

// Ordering scores. Anything searched before quiet moves sits far above the
// history range, which is capped at HISTORY_CAP.
const PV_MOVE_SCORE: i32 = 1_000_000;
const HASH_MOVE_SCORE: i32 = 900_000;
const WINNING_CAPTURE_SCORE: i32 = 800_000;
const KILLER_SCORE: i32 = 700_000;
const EQUAL_CAPTURE_SCORE: i32 = 500_000;
const LOSING_CAPTURE_SCORE: i32 = 10_000;
const HISTORY_CAP: i32 = 100_000;

/// How the node was reached from its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Played {
    Root,
    Null,
    Move(Move),
}

/// Which move generation a node runs when `first` is called.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Unknown,
    Root,
    FullWidth,
    Quiesce,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoredMove {
    pub mv: Move,
    pub score: i32,
}

/// One ply of the search tree.
#[derive(Debug, Clone)]
pub struct Node {
    /// Back reference into the same arena, `None` for a root or a copied node
    pub parent: Option<NodeId>,
    pub root: NodeId,

    pub board: Board,
    pub key: u64,
    pub in_check: bool,
    /// Material balance from the side to move's perspective
    pub material: i32,

    moves: ArrayVec<ScoredMove, MAX_MOVES>,
    /// Index of the move most recently returned by `first`/`next`
    cursor: usize,
    /// The move list holds every legal move, not just the tactical ones
    all_moves: bool,
    pub kind: NodeKind,

    /// Expected line from here, seeded from the previous iteration or the table
    pub pv: PvLine,
    pub hash_move: Option<Move>,
    pub killers: [Option<Move>; 2],
    /// Best line found by the current search of this node
    pub best_line: PvLine,
    pub played: Played,
}

impl Node {
    pub(super) fn new(board: Board, values: &PieceValues, id: NodeId) -> Self {
        Self {
            parent: None,
            root: id,
            key: board.hash(),
            in_check: has_check(&board),
            material: values.material_balance(&board),
            board,
            moves: ArrayVec::new(),
            cursor: 0,
            all_moves: false,
            kind: NodeKind::Unknown,
            pv: PvLine::new(),
            hash_move: None,
            killers: [None; 2],
            best_line: PvLine::new(),
            played: Played::Root,
        }
    }

    /// Turn this slot into the child reached from `parent` by `played`.
    pub(super) fn become_child(
        &mut self,
        parent: &Node,
        parent_id: Option<NodeId>,
        self_id: NodeId,
        played: Played,
        board: Board,
        values: &PieceValues,
    ) {
        self.parent = parent_id;
        self.root = if parent_id.is_some() {
            parent.root
        } else {
            self_id
        };

        self.key = board.hash();
        self.in_check = has_check(&board);
        self.material = values.material_balance(&board);
        self.board = board;

        self.moves.clear();
        self.cursor = 0;
        self.all_moves = false;
        self.kind = NodeKind::Unknown;

        self.pv.clear();
        if parent.pv.len() > 1 && played == Played::Move(parent.pv[0]) {
            self.pv.extend(parent.pv[1..].iter().copied());
        }

        self.hash_move = None;
        self.killers = [None; 2];
        self.best_line.clear();
        self.played = played;
    }

    /// Generate the legal root moves and pick a fallback best move.
    pub fn init_root(&mut self) {
        self.kind = NodeKind::Root;
        self.generate(false);
        self.hash_move = None;
        self.killers = [None; 2];
        self.pv.clear();
        self.played = Played::Root;

        // Returned if the search ends before any move was chosen.
        self.best_line.clear();
        if let Some(first) = self.moves.first() {
            self.best_line.push(first.mv);
        }
    }

    fn generate(&mut self, tactical_only: bool) {
        self.moves.clear();
        self.cursor = 0;
        // evasions are the full legal set
        self.all_moves = !tactical_only || self.in_check;
        let moves = &mut self.moves;
        visit_moves(&self.board, tactical_only, |mv| {
            moves.push(ScoredMove { mv, score: 0 });
        });
    }

    /// Make sure full-width moves exist. They may already be there from
    /// internal iterative deepening or from the parallel split decision,
    /// but a quiescence visit of the same node leaves only tactical moves.
    pub fn ensure_moves(&mut self) {
        if !self.all_moves {
            self.generate(false);
        }
    }

    pub fn move_count(&self) -> usize {
        self.moves.len()
    }

    /// Moves fully handled before the current one.
    pub fn moves_done(&self) -> usize {
        self.cursor
    }

    pub fn current_move(&self) -> Option<Move> {
        self.moves.get(self.cursor).map(|m| m.mv)
    }

    pub fn pv_move(&self) -> Option<Move> {
        self.pv.first().copied()
    }

    pub fn best_move(&self) -> Option<Move> {
        self.best_line.first().copied()
    }

    /// Start iterating moves, highest ordering score first.
    pub fn first(&mut self, history: &HistoryTable, values: &PieceValues) -> Option<Move> {
        match self.kind {
            NodeKind::Root => {}
            NodeKind::FullWidth | NodeKind::Unknown => self.ensure_moves(),
            NodeKind::Quiesce => self.generate(true),
        }

        if self.kind != NodeKind::Root {
            self.score_moves(history, values);
        }

        self.cursor = 0;
        self.pick()
    }

    pub fn next(&mut self) -> Option<Move> {
        if self.cursor < self.moves.len() {
            self.cursor += 1;
        }
        self.pick()
    }

    /// Selection step: swap the best remaining move to the cursor.
    fn pick(&mut self) -> Option<Move> {
        let remaining = self.moves.get(self.cursor..)?;
        let (offset, _) = remaining
            .iter()
            .enumerate()
            .max_by_key(|(i, m)| (m.score, std::cmp::Reverse(*i)))?;
        self.moves.swap(self.cursor, self.cursor + offset);
        Some(self.moves[self.cursor].mv)
    }

    /// Root ordering score for the current move, used by the next iteration.
    pub fn set_current_score(&mut self, score: i32) {
        if let Some(current) = self.moves.get_mut(self.cursor) {
            current.score = score;
        }
    }

    /// Make `mv` the first root move picked by the next `first`.
    pub fn promote(&mut self, mv: Move) {
        if let Some(m) = self.moves.iter_mut().find(|m| m.mv == mv) {
            m.score = i32::MAX;
        }
    }

    fn score_moves(&mut self, history: &HistoryTable, values: &PieceValues) {
        let pv_move = self.pv_move();
        let side = self.board.side_to_move();

        for i in 0..self.moves.len() {
            let mv = self.moves[i].mv;
            let score = if pv_move == Some(mv) {
                PV_MOVE_SCORE
            } else if self.hash_move == Some(mv) {
                HASH_MOVE_SCORE
            } else if is_tactical(&self.board, mv) {
                let attacker = self
                    .board
                    .piece_on(mv.from)
                    .map_or(0, |piece| values.get(piece));
                let mut victim = captured_piece(&self.board, mv).map_or(0, |piece| values.get(piece));
                if let Some(promotion) = mv.promotion {
                    victim += values.get(promotion);
                }

                if victim > attacker {
                    WINNING_CAPTURE_SCORE + victim - attacker
                } else if victim < attacker {
                    LOSING_CAPTURE_SCORE + victim - attacker
                } else {
                    EQUAL_CAPTURE_SCORE
                }
            } else {
                let killer = if self.killers.contains(&Some(mv)) {
                    KILLER_SCORE
                } else {
                    0
                };
                killer + history.get(side, mv).min(HISTORY_CAP)
            };
            self.moves[i].score = score;
        }
    }

    /// best_line = [mv] followed by the child's best line.
    pub fn set_best(&mut self, mv: Move, child_line: &[Move]) {
        self.best_line.clear();
        self.best_line.push(mv);
        let room = self.best_line.capacity() - 1;
        self.best_line
            .extend(child_line.iter().take(room).copied());
    }

    pub fn set_best_line(&mut self, line: &[Move]) {
        self.best_line.clear();
        self.best_line
            .extend(line.iter().take(MAX_PLY).copied());
    }

    pub fn set_pv(&mut self, line: &[Move]) {
        self.pv.clear();
        self.pv.extend(line.iter().take(MAX_PLY).copied());
    }

    /// Remember a quiet move that caused a cutoff. The first slot is filled
    /// once; later killers go to the second slot.
    pub fn add_killer(&mut self, mv: Move) {
        if self.killers[0].is_none() {
            self.killers[0] = Some(mv);
        } else if self.killers[0] != Some(mv) {
            self.killers[1] = Some(mv);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cozy_chess::Square;

    fn node(fen: &str) -> Node {
        let board: Board = fen.parse().unwrap();
        Node::new(board, &PieceValues::default(), NodeId(0))
    }

    fn mv(from: Square, to: Square) -> Move {
        Move {
            from,
            to,
            promotion: None,
        }
    }

    fn drain(node: &mut Node) -> Vec<Move> {
        let history = HistoryTable::new();
        let values = PieceValues::default();
        let mut order = Vec::new();
        let mut next = node.first(&history, &values);
        while let Some(m) = next {
            order.push(m);
            next = node.next();
        }
        order
    }

    #[test]
    fn test_init_root_sets_fallback() {
        let mut root = node("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1");
        root.init_root();
        assert_eq!(root.kind, NodeKind::Root);
        assert_eq!(root.move_count(), 20);
        assert_eq!(root.best_line.len(), 1);
    }

    #[test]
    fn test_ordering_priorities() {
        // Rxd5 wins a queen, Qxa5 trades queen for pawn
        let mut n = node("k7/8/8/p2q4/8/8/8/QK1R4 w - - 0 1");
        n.kind = NodeKind::FullWidth;
        let pv = mv(Square::B1, Square::C1);
        let hash = mv(Square::B1, Square::B2);
        n.pv.push(pv);
        n.hash_move = Some(hash);
        let killer = mv(Square::D1, Square::E1);
        n.add_killer(killer);

        let order = drain(&mut n);
        assert_eq!(order[0], pv);
        assert_eq!(order[1], hash);
        assert_eq!(order[2], mv(Square::D1, Square::D5));
        assert_eq!(order[3], killer);
        // losing captures still go ahead of plain quiet moves
        assert_eq!(order[4], mv(Square::A1, Square::A5));
        assert_eq!(order.len(), 23);
    }

    #[test]
    fn test_quiesce_generates_tactical_moves() {
        let mut n = node("k7/8/8/3p4/4P3/8/8/K7 w - - 0 1");
        n.kind = NodeKind::Quiesce;
        assert_eq!(drain(&mut n), vec![mv(Square::E4, Square::D5)]);
    }

    #[test]
    fn test_full_width_after_quiesce_regenerates() {
        let mut n = node("k7/8/8/3p4/4P3/8/8/K7 w - - 0 1");
        let history = HistoryTable::new();
        let values = PieceValues::default();

        n.kind = NodeKind::Quiesce;
        n.first(&history, &values);
        assert_eq!(n.move_count(), 1);

        n.kind = NodeKind::FullWidth;
        n.first(&history, &values);
        assert_eq!(n.move_count(), 5);
    }

    #[test]
    fn test_root_order_follows_current_scores() {
        let mut root = node("k7/8/8/8/8/8/8/K6R w - - 0 1");
        root.init_root();
        let history = HistoryTable::new();
        let values = PieceValues::default();

        let mut first = root.first(&history, &values);
        let mut scores = Vec::new();
        let mut i = 0;
        while let Some(m) = first {
            root.set_current_score(i);
            scores.push(m);
            i += 1;
            first = root.next();
        }

        // last scored highest, searched first next time
        let next_first = root.first(&history, &values);
        assert_eq!(next_first, scores.last().copied());
    }

    #[test]
    fn test_set_best_prepends_move() {
        let mut n = node("k7/8/8/8/8/8/8/K6R w - - 0 1");
        let line = [mv(Square::A8, Square::B8), mv(Square::H1, Square::H8)];
        n.set_best(mv(Square::H1, Square::H7), &line);
        assert_eq!(n.best_line.as_slice(), &[mv(Square::H1, Square::H7), line[0], line[1]]);
    }

    #[test]
    fn test_add_killer_slots() {
        let mut n = node("k7/8/8/8/8/8/8/K6R w - - 0 1");
        let a = mv(Square::H1, Square::H2);
        let b = mv(Square::H1, Square::H3);
        let c = mv(Square::H1, Square::H4);
        n.add_killer(a);
        n.add_killer(a);
        assert_eq!(n.killers, [Some(a), None]);
        n.add_killer(b);
        n.add_killer(c);
        assert_eq!(n.killers, [Some(a), Some(c)]);
    }
}
