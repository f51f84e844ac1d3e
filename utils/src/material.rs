use cozy_chess::{BitBoard, Board, Color, Piece};

const LIGHT_SQUARES: BitBoard = BitBoard(0x55AA55AA55AA55AA);

/// Coarse stage of the game, derived from the remaining non-pawn material.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    Opening,
    Midgame,
    Endgame,
}

/// Phase weight of the remaining pieces: N=1, B=1, R=2, Q=4 (24 at the start).
pub fn phase_weight(board: &Board) -> u32 {
    let weight = board.pieces(Piece::Knight).len()
        + board.pieces(Piece::Bishop).len()
        + 2 * board.pieces(Piece::Rook).len()
        + 4 * board.pieces(Piece::Queen).len();
    weight.min(24)
}

/// Endgame at a weight of 8 or less (e.g. a rook and two minors each side
/// is still midgame), opening while at least 22 of 24 remain.
pub fn game_phase(board: &Board) -> GamePhase {
    match phase_weight(board) {
        0..=8 => GamePhase::Endgame,
        22.. => GamePhase::Opening,
        _ => GamePhase::Midgame,
    }
}

/// Check if the position is a dead draw by material:
/// K vs K, K+minor vs K, and K+B vs K+B with bishops on the same square color.
pub fn has_insufficient_material(board: &Board) -> bool {
    let heavy = board.pieces(Piece::Pawn) | board.pieces(Piece::Rook) | board.pieces(Piece::Queen);
    if !heavy.is_empty() {
        return false;
    }

    let knights = board.pieces(Piece::Knight);
    let bishops = board.pieces(Piece::Bishop);
    let minors_of = |color: Color| (board.colors(color) & (knights | bishops)).len();

    match (minors_of(Color::White), minors_of(Color::Black)) {
        (0, 0) | (1, 0) | (0, 1) => true,
        (1, 1) => {
            let white_bishop = board.colors(Color::White) & bishops;
            let black_bishop = board.colors(Color::Black) & bishops;
            if white_bishop.is_empty() || black_bishop.is_empty() {
                return false;
            }
            (white_bishop & LIGHT_SQUARES).is_empty() == (black_bishop & LIGHT_SQUARES).is_empty()
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_material_bare_kings() {
        let board: Board = "k7/8/8/8/8/8/8/K7 w - - 0 1".parse().unwrap();
        assert!(has_insufficient_material(&board));
    }

    #[test]
    fn test_insufficient_material_single_minor() {
        let board: Board = "k7/8/8/8/8/8/8/KN6 w - - 0 1".parse().unwrap();
        assert!(has_insufficient_material(&board));

        let board: Board = "kb6/8/8/8/8/8/8/K7 w - - 0 1".parse().unwrap();
        assert!(has_insufficient_material(&board));
    }

    #[test]
    fn test_same_colored_bishops_are_drawn() {
        // c1 and f8 are both dark squares
        let board: Board = "k4b2/8/8/8/8/8/8/K1B5 w - - 0 1".parse().unwrap();
        assert!(has_insufficient_material(&board));

        // c1 dark, c8 light
        let board: Board = "k1b5/8/8/8/8/8/8/K1B5 w - - 0 1".parse().unwrap();
        assert!(!has_insufficient_material(&board));
    }

    #[test]
    fn test_sufficient_material() {
        let board: Board = "k7/8/8/8/8/8/8/KNN5 w - - 0 1".parse().unwrap();
        assert!(!has_insufficient_material(&board));

        let board: Board = "k7/p7/8/8/8/8/8/K7 w - - 0 1".parse().unwrap();
        assert!(!has_insufficient_material(&board));
    }

    #[test]
    fn test_game_phase() {
        assert_eq!(game_phase(&Board::default()), GamePhase::Opening);

        let board: Board = "k7/8/8/8/8/8/8/KR6 w - - 0 1".parse().unwrap();
        assert_eq!(game_phase(&board), GamePhase::Endgame);

        let board: Board = "r2qk2r/ppp2ppp/8/8/8/8/PPP2PPP/R2QK2R w KQkq - 0 1"
            .parse()
            .unwrap();
        assert_eq!(game_phase(&board), GamePhase::Midgame);
    }
}
