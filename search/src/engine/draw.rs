use evaluation::scores::DRAW;
use utils::has_insufficient_material;

use crate::arena::NodeId;

use super::Engine;

/// Halfmove clock value at which the fifty-move rule applies.
const FIFTY_MOVE_PLIES: u8 = 100;

/// Score of a side that has no legal move and is not in check.
#[inline(always)]
pub(crate) fn stalemate_score() -> i32 {
    DRAW
}

impl Engine {
    /// Fifty-move rule, dead material or a repeated position.
    pub(crate) fn is_draw(&self, node: NodeId) -> bool {
        let board = &self.arena[node].board;
        board.halfmove_clock() >= FIFTY_MOVE_PLIES
            || has_insufficient_material(board)
            || self.is_repetition(node)
    }

    /// Look for the node's position among the earlier positions that are
    /// still reachable, first along the searched line, then in the game.
    fn is_repetition(&self, node: NodeId) -> bool {
        let current = &self.arena[node];
        let key = current.key;
        let mut reversible = current.board.halfmove_clock() as usize;

        let mut parent = current.parent;
        while reversible > 0 {
            let Some(id) = parent else {
                break;
            };
            if self.arena[id].key == key {
                return true;
            }
            parent = self.arena[id].parent;
            reversible -= 1;
        }

        self.prehistory
            .iter()
            .rev()
            .take(reversible)
            .any(|&k| k == key)
    }

    /// Positions before `node`, oldest first: the game history followed by
    /// the searched line.
    pub(crate) fn history_before(&self, node: NodeId) -> Vec<u64> {
        let mut keys = self.prehistory.clone();
        keys.extend(self.arena.line_keys(node));
        keys
    }

    /// Positions before a child of `node`.
    pub(crate) fn history_through(&self, node: NodeId) -> Vec<u64> {
        let mut keys = self.history_before(node);
        keys.push(self.arena[node].key);
        keys
    }
}

#[cfg(test)]
mod tests {
    use cozy_chess::{util::parse_uci_move, Board};

    use crate::arena::Played;
    use crate::engine::Engine;

    fn play(engine: &mut Engine, parent: crate::arena::NodeId, uci: &str) -> crate::arena::NodeId {
        let mv = parse_uci_move(&engine.arena[parent].board, uci).unwrap();
        engine.make_child(parent, Played::Move(mv), 1)
    }

    #[test]
    fn test_fifty_move_rule() {
        let mut engine = Engine::default();
        let board: Board = "k7/8/8/8/8/8/8/KR6 w - - 100 80".parse().unwrap();
        let root = engine.arena.push_root(board).unwrap();
        assert!(engine.is_draw(root));
    }

    #[test]
    fn test_insufficient_material() {
        let mut engine = Engine::default();
        let board: Board = "k7/8/8/8/8/8/8/KN6 w - - 0 1".parse().unwrap();
        let root = engine.arena.push_root(board).unwrap();
        assert!(engine.is_draw(root));
    }

    #[test]
    fn test_repetition_along_the_line() {
        let mut engine = Engine::default();
        let root = engine.arena.push_root(Board::default()).unwrap();
        let a = play(&mut engine, root, "g1f3");
        let b = play(&mut engine, a, "g8f6");
        let c = play(&mut engine, b, "f3g1");
        assert!(!engine.is_draw(c));
        let d = play(&mut engine, c, "f6g8");
        assert!(engine.is_draw(d));
    }

    #[test]
    fn test_repetition_from_game_history() {
        let mut engine = Engine::default();
        let start = Board::default();
        let board: Board = "rnbqkb1r/pppppppp/5n2/8/8/5N2/PPPPPPPP/RNBQKB1R w KQkq - 2 2"
            .parse()
            .unwrap();
        engine.prehistory = vec![start.hash()];

        let root = engine.arena.push_root(board).unwrap();
        let a = play(&mut engine, root, "f3g1");
        let b = play(&mut engine, a, "f6g8");
        assert!(engine.is_draw(b));
        assert_eq!(engine.history_before(b).len(), 3);
    }

    #[test]
    fn test_capture_resets_repetition_window() {
        let mut engine = Engine::default();
        let board: Board = "k7/8/8/8/8/8/8/KR6 w - - 0 1".parse().unwrap();
        // the same position seen before an irreversible move does not count
        engine.prehistory = vec![board.hash()];
        let root = engine.arena.push_root(board).unwrap();
        assert!(!engine.is_draw(root));
    }
}
