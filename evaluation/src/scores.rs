// Score bounds and special values for alpha-beta search.
pub const INFTY: i32 = 100_000;
/// Any score at or beyond this magnitude is a mate score.
/// Actual mate scores are INFTY - ply to distinguish faster mates.
pub const MATE: i32 = 90_000;
pub const DRAW: i32 = 0;

/// Score of the side to move when it is checkmated at `ply`.
#[inline(always)]
pub fn mated_in(ply: usize) -> i32 {
    -INFTY + ply as i32
}

#[inline(always)]
pub fn is_mate_score(score: i32) -> bool {
    score.abs() >= MATE
}

/// Plies from the searched position to the mate encoded in `score`.
#[inline(always)]
pub fn mate_distance(score: i32) -> i32 {
    INFTY - score.abs()
}
