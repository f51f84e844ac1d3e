mod board;
mod material;
mod notation;

pub use board::{
    captured_piece, collect_captures, collect_legal_moves, has_check, is_capture, is_en_passant,
    is_promotion, is_tactical, make_move, visit_moves,
};
pub use material::{game_phase, has_insufficient_material, phase_weight, GamePhase};
pub use notation::{line_to_uci, move_to_uci};
