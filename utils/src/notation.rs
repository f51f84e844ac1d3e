// cozy-chess writes castling as "king captures rook" (e1h1) while the usual
// coordinate notation is e1g1. Lines are converted through the board they
// are played on so castling comes out right.

use cozy_chess::{util::display_uci_move, Board, Move};

#[inline]
pub fn move_to_uci(board: &Board, mv: Move) -> String {
    display_uci_move(board, mv).to_string()
}

/// Coordinate notation for a line starting at `board`. Stops at the first
/// move that is not legal in the position reached so far.
pub fn line_to_uci(starting_board: &Board, line: &[Move]) -> Vec<String> {
    let mut result = Vec::with_capacity(line.len());
    let mut board = starting_board.clone();

    for &mv in line {
        if !board.is_legal(mv) {
            break;
        }
        result.push(move_to_uci(&board, mv));
        board.play_unchecked(mv);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use cozy_chess::util::parse_uci_move;

    #[test]
    fn test_castling_uses_king_destination() {
        let board: Board = "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1".parse().unwrap();
        let castle = parse_uci_move(&board, "e1g1").unwrap();
        assert_eq!(move_to_uci(&board, castle), "e1g1");
    }

    #[test]
    fn test_line_stops_at_illegal_move() {
        let board = Board::default();
        let e4 = parse_uci_move(&board, "e2e4").unwrap();
        // e2e4 again is not legal for black
        assert_eq!(line_to_uci(&board, &[e4, e4]), vec!["e2e4".to_string()]);
    }
}
