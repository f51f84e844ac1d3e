use cozy_chess::{Color, Piece, Square};

// Tables are laid out as seen from White with rank 8 on the first row.
//
// <https://www.chessprogramming.org/Piece-Square_Tables>

#[rustfmt::skip]
const PAWN: [i32; 64] = [
     0,   0,   0,   0,   0,   0,   0,   0,
    50,  50,  50,  50,  50,  50,  50,  50,
    10,  10,  20,  30,  30,  20,  10,  10,
     5,   5,  10,  25,  25,  10,   5,   5,
     0,   0,   0,  20,  20,   0,   0,   0,
     5,  -5, -10,   0,   0, -10,  -5,   5,
     5,  10,  10, -20, -20,  10,  10,   5,
     0,   0,   0,   0,   0,   0,   0,   0,
];

#[rustfmt::skip]
const KNIGHT: [i32; 64] = [
   -50, -40, -30, -30, -30, -30, -40, -50,
   -40, -20,   0,   0,   0,   0, -20, -40,
   -30,   0,  10,  15,  15,  10,   0, -30,
   -30,   5,  15,  20,  20,  15,   5, -30,
   -30,   0,  15,  20,  20,  15,   0, -30,
   -30,   5,  10,  15,  15,  10,   5, -30,
   -40, -20,   0,   5,   5,   0, -20, -40,
   -50, -40, -30, -30, -30, -30, -40, -50,
];

#[rustfmt::skip]
const BISHOP: [i32; 64] = [
   -20, -10, -10, -10, -10, -10, -10, -20,
   -10,   0,   0,   0,   0,   0,   0, -10,
   -10,   0,   5,  10,  10,   5,   0, -10,
   -10,   5,   5,  10,  10,   5,   5, -10,
   -10,   0,  10,  10,  10,  10,   0, -10,
   -10,  10,  10,  10,  10,  10,  10, -10,
   -10,   5,   0,   0,   0,   0,   5, -10,
   -20, -10, -10, -10, -10, -10, -10, -20,
];

#[rustfmt::skip]
const ROOK: [i32; 64] = [
     0,   0,   0,   0,   0,   0,   0,   0,
     5,  10,  10,  10,  10,  10,  10,   5,
    -5,   0,   0,   0,   0,   0,   0,  -5,
    -5,   0,   0,   0,   0,   0,   0,  -5,
    -5,   0,   0,   0,   0,   0,   0,  -5,
    -5,   0,   0,   0,   0,   0,   0,  -5,
    -5,   0,   0,   0,   0,   0,   0,  -5,
     0,   0,   0,   5,   5,   0,   0,   0,
];

#[rustfmt::skip]
const QUEEN: [i32; 64] = [
   -20, -10, -10,  -5,  -5, -10, -10, -20,
   -10,   0,   0,   0,   0,   0,   0, -10,
   -10,   0,   5,   5,   5,   5,   0, -10,
    -5,   0,   5,   5,   5,   5,   0,  -5,
     0,   0,   5,   5,   5,   5,   0,  -5,
   -10,   5,   5,   5,   5,   5,   0, -10,
   -10,   0,   5,   0,   0,   0,   0, -10,
   -20, -10, -10,  -5,  -5, -10, -10, -20,
];

#[rustfmt::skip]
const KING_MIDGAME: [i32; 64] = [
   -30, -40, -40, -50, -50, -40, -40, -30,
   -30, -40, -40, -50, -50, -40, -40, -30,
   -30, -40, -40, -50, -50, -40, -40, -30,
   -30, -40, -40, -50, -50, -40, -40, -30,
   -20, -30, -30, -40, -40, -30, -30, -20,
   -10, -20, -20, -20, -20, -20, -20, -10,
    20,  20,   0,   0,   0,   0,  20,  20,
    20,  30,  10,   0,   0,  10,  30,  20,
];

#[rustfmt::skip]
const KING_ENDGAME: [i32; 64] = [
   -50, -40, -30, -20, -20, -30, -40, -50,
   -30, -20, -10,   0,   0, -10, -20, -30,
   -30, -10,  20,  30,  30,  20, -10, -30,
   -30, -10,  30,  40,  40,  30, -10, -30,
   -30, -10,  30,  40,  40,  30, -10, -30,
   -30, -10,  20,  30,  30,  20, -10, -30,
   -30, -30,   0,   0,   0,   0, -30, -30,
   -50, -30, -30, -30, -30, -30, -30, -50,
];

#[inline(always)]
fn index(color: Color, sq: Square) -> usize {
    match color {
        Color::White => sq.flip_rank() as usize,
        Color::Black => sq as usize,
    }
}

/// Square bonus for a piece. The king is tapered between its middlegame and
/// endgame tables by `phase` (24 = full material, 0 = bare).
#[inline(always)]
pub fn square_bonus(piece: Piece, color: Color, sq: Square, phase: u32) -> i32 {
    let i = index(color, sq);
    match piece {
        Piece::Pawn => PAWN[i],
        Piece::Knight => KNIGHT[i],
        Piece::Bishop => BISHOP[i],
        Piece::Rook => ROOK[i],
        Piece::Queen => QUEEN[i],
        Piece::King => {
            let phase = phase.min(24) as i32;
            (KING_MIDGAME[i] * phase + KING_ENDGAME[i] * (24 - phase)) / 24
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_are_mirrored_between_colors() {
        for piece in Piece::ALL {
            for sq in Square::ALL {
                assert_eq!(
                    square_bonus(piece, Color::White, sq, 12),
                    square_bonus(piece, Color::Black, sq.flip_rank(), 12)
                );
            }
        }
    }

    #[test]
    fn test_king_prefers_center_in_endgame() {
        let center = square_bonus(Piece::King, Color::White, Square::E4, 0);
        let corner = square_bonus(Piece::King, Color::White, Square::H1, 0);
        assert!(center > corner);

        let castled = square_bonus(Piece::King, Color::White, Square::G1, 24);
        let exposed = square_bonus(Piece::King, Color::White, Square::E4, 24);
        assert!(castled > exposed);
    }
}
