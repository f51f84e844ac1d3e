use cozy_chess::{Board, Color, Piece};

/// Fixed centipawn values used by the material term and by move ordering.
#[derive(Debug, Clone, Copy)]
pub struct PieceValues {
    pub pawn: i32,
    pub knight: i32,
    pub bishop: i32,
    pub rook: i32,
    pub queen: i32,
}

impl Default for PieceValues {
    fn default() -> Self {
        Self {
            pawn: 100,
            knight: 300,
            bishop: 310,
            rook: 500,
            queen: 900,
        }
    }
}

impl PieceValues {
    /// The king never changes hands, so it is worth nothing here.
    #[inline(always)]
    pub fn get(&self, piece: Piece) -> i32 {
        match piece {
            Piece::Pawn => self.pawn,
            Piece::Knight => self.knight,
            Piece::Bishop => self.bishop,
            Piece::Rook => self.rook,
            Piece::Queen => self.queen,
            Piece::King => 0,
        }
    }

    /// Sums the values of all pieces of one color.
    pub fn material(&self, board: &Board, color: Color) -> i32 {
        Piece::ALL
            .iter()
            .map(|&piece| self.get(piece) * board.colored_pieces(color, piece).len() as i32)
            .sum()
    }

    /// Material difference from the side to move's point of view.
    pub fn material_balance(&self, board: &Board) -> i32 {
        let us = board.side_to_move();
        self.material(board, us) - self.material(board, !us)
    }
}
