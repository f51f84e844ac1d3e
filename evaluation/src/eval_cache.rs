use std::mem::size_of;

#[derive(Debug, Clone, Copy, Default)]
struct CacheEntry {
    /// Full position hash, zero when empty
    key: u64,
    /// Score from the side to move's perspective
    score: i32,
}

// Caches full evaluations by position hash.
// Positions recur often across iterations and transpositions, and the full
// evaluation is far more expensive than a lookup. Direct-mapped, always-replace.
pub struct EvalCache {
    entries: Vec<CacheEntry>,
}

impl EvalCache {
    pub fn new(bytes: usize) -> Self {
        let len = bytes / size_of::<CacheEntry>();
        Self {
            entries: vec![CacheEntry::default(); len],
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.entries.is_empty()
    }

    #[inline(always)]
    fn slot(&self, key: u64) -> usize {
        (key % self.entries.len() as u64) as usize
    }

    pub fn get(&self, key: u64) -> Option<i32> {
        if !self.is_enabled() {
            return None;
        }
        let entry = &self.entries[self.slot(key)];
        (entry.key == key && key != 0).then_some(entry.score)
    }

    pub fn set(&mut self, key: u64, score: i32) {
        if !self.is_enabled() {
            return;
        }
        let slot = self.slot(key);
        self.entries[slot] = CacheEntry { key, score };
    }

    pub fn clear(&mut self) {
        self.entries.fill(CacheEntry::default());
    }
}
