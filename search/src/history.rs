use cozy_chess::{Color, Move, Square};

const NUM_COLORS: usize = 2;
const NUM_SQUARES: usize = Square::NUM;
// [color][from][to]
const HISTORY_SIZE: usize = NUM_COLORS * NUM_SQUARES * NUM_SQUARES;

/// Counts how often a quiet move was the best move of a node.
///
/// <https://www.chessprogramming.org/History_Heuristic>
#[derive(Clone)]
pub struct HistoryTable {
    history: Vec<i32>,
}

impl Default for HistoryTable {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryTable {
    pub fn new() -> Self {
        Self {
            history: vec![0; HISTORY_SIZE],
        }
    }

    #[inline(always)]
    pub fn reset(&mut self) {
        self.history.fill(0);
    }

    #[inline(always)]
    pub fn get(&self, color: Color, mv: Move) -> i32 {
        self.history[Self::index(color, mv.from, mv.to)]
    }

    #[inline(always)]
    pub fn add(&mut self, color: Color, mv: Move) {
        let entry = &mut self.history[Self::index(color, mv.from, mv.to)];
        *entry = entry.saturating_add(1);
    }

    #[inline(always)]
    fn index(color: Color, from: Square, to: Square) -> usize {
        color as usize * NUM_SQUARES * NUM_SQUARES + from as usize * NUM_SQUARES + to as usize
    }
}
