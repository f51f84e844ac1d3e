mod eval_cache;
mod material_eval;
mod piece_values;
mod pst;
pub mod scores;
mod traits;

pub use material_eval::{MaterialEvaluator, LAZY_MARGIN};
pub use piece_values::PieceValues;
pub use traits::{EvalStats, Evaluator};
