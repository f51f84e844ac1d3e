use cozy_chess::{Board, Move, Piece};

/// Check if a move is a real capture (enemy piece on destination).
/// Correctly handles castling, which cozy-chess represents as "king captures rook".
#[inline(always)]
pub fn is_capture(board: &Board, mv: Move) -> bool {
    board.colors(!board.side_to_move()).has(mv.to)
}

/// Check if a move is an en passant capture (pawn changes file onto an empty square).
#[inline(always)]
pub fn is_en_passant(board: &Board, mv: Move) -> bool {
    board.piece_on(mv.from) == Some(Piece::Pawn)
        && mv.from.file() != mv.to.file()
        && board.piece_on(mv.to).is_none()
}

#[inline(always)]
pub fn is_promotion(mv: Move) -> bool {
    mv.promotion.is_some()
}

/// Captures, en passant captures and promotions. These are the moves
/// searched in quiescence and never pruned by futility.
#[inline(always)]
pub fn is_tactical(board: &Board, mv: Move) -> bool {
    is_capture(board, mv) || is_promotion(mv) || is_en_passant(board, mv)
}

/// The piece taken by a move, if any. En passant captures take a pawn.
#[inline(always)]
pub fn captured_piece(board: &Board, mv: Move) -> Option<Piece> {
    if is_capture(board, mv) {
        board.piece_on(mv.to)
    } else if is_en_passant(board, mv) {
        Some(Piece::Pawn)
    } else {
        None
    }
}

/// Make a move and return a new board.
#[inline(always)]
pub fn make_move(board: &Board, mv: Move) -> Board {
    let mut new_board = board.clone();
    new_board.play_unchecked(mv);
    new_board
}

/// Check if the side to move is in check.
#[inline(always)]
pub fn has_check(board: &Board) -> bool {
    !board.checkers().is_empty()
}

/// Visit every legal move. With `tactical_only` set, quiet moves are skipped
/// unless the side to move is in check, in which case all evasions are kept.
pub fn visit_moves(board: &Board, tactical_only: bool, mut visit: impl FnMut(Move)) {
    let filter = tactical_only && !has_check(board);
    board.generate_moves(|batch| {
        for mv in batch {
            if !filter || is_tactical(board, mv) {
                visit(mv);
            }
        }
        false
    });
}

/// Collect all legal moves into a Vec.
pub fn collect_legal_moves(board: &Board) -> Vec<Move> {
    let mut moves = Vec::new();
    visit_moves(board, false, |mv| moves.push(mv));
    moves
}

/// Collect captures, en passant and promotions (or all evasions when in check).
pub fn collect_captures(board: &Board) -> Vec<Move> {
    let mut moves = Vec::new();
    visit_moves(board, true, |mv| moves.push(mv));
    moves
}
