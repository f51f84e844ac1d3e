use std::mem::size_of;
use std::sync::atomic::{AtomicU64, Ordering};

use cozy_chess::{Board, Move};
use parking_lot::Mutex;

use super::entry::{pack_move, unpack_move, Bound, HashEntry, PvFragment, PV_FRAGMENT_LEN};

/// Number of lock domains. Slot `i` is guarded by domain `i % LOCK_DOMAINS`.
const LOCK_DOMAINS: usize = 64;

/// Packed table slot (16 bytes).
#[derive(Clone, Copy, Default)]
#[repr(C)]
struct Slot {
    key: u64,
    score: i32,
    depth: i16,
    bound: Bound,
    /// Packed as: [15:12]=promo, [11:6]=to, [5:0]=from
    best_move: u16,
}

#[derive(Clone, Copy, Default)]
struct PvSlot {
    moves: [u16; PV_FRAGMENT_LEN],
    len: u8,
}

#[derive(Default)]
struct Shard {
    slots: Vec<Slot>,
    /// Only allocated for tables created with PV fragments
    pv: Option<Vec<PvSlot>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableStats {
    pub size: usize,
    pub probes: u64,
    pub hits: u64,
    pub collisions: u64,
    pub stores: u64,
}

/// Direct-mapped, always-replace hash table shared between search threads.
///
/// Each slot holds exactly one entry. Depth is only consulted when an entry
/// is read, see [`HashEntry::usable`].
///
/// <https://www.chessprogramming.org/Transposition_Table>
pub struct TranspositionTable {
    shards: Vec<Mutex<Shard>>,
    size: usize,
    with_pv: bool,

    probes: AtomicU64,
    hits: AtomicU64,
    collisions: AtomicU64,
    stores: AtomicU64,
}

impl TranspositionTable {
    /// Bytes taken by one entry, including its PV fragment if enabled.
    pub fn entry_size(with_pv: bool) -> usize {
        size_of::<Slot>() + if with_pv { size_of::<PvSlot>() } else { 0 }
    }

    /// Number of entries that fit in `bytes`, at least one.
    pub fn size_for_bytes(bytes: usize, with_pv: bool) -> usize {
        (bytes / Self::entry_size(with_pv)).max(1)
    }

    pub fn with_bytes(bytes: usize, with_pv: bool) -> Self {
        Self::new(Self::size_for_bytes(bytes, with_pv), with_pv)
    }

    pub fn new(size: usize, with_pv: bool) -> Self {
        let size = size.max(1);
        let shards = (0..LOCK_DOMAINS)
            .map(|domain| {
                let len = (size + LOCK_DOMAINS - 1 - domain) / LOCK_DOMAINS;
                Mutex::new(Shard {
                    slots: vec![Slot::default(); len],
                    pv: with_pv.then(|| vec![PvSlot::default(); len]),
                })
            })
            .collect();

        Self {
            shards,
            size,
            with_pv,
            probes: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            collisions: AtomicU64::new(0),
            stores: AtomicU64::new(0),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn has_pv(&self) -> bool {
        self.with_pv
    }

    #[inline(always)]
    fn locate(&self, key: u64) -> (usize, usize) {
        let index = (key % self.size as u64) as usize;
        (index % LOCK_DOMAINS, index / LOCK_DOMAINS)
    }

    /// Look up `board`. Empty slots, foreign keys and stored moves that are
    /// not legal on `board` are misses; the latter two count as collisions.
    pub fn probe(&self, board: &Board) -> Option<(HashEntry, PvFragment)> {
        let key = board.hash();
        let (domain, local) = self.locate(key);
        self.probes.fetch_add(1, Ordering::Relaxed);

        let (slot, pv) = {
            let shard = self.shards[domain].lock();
            let slot = shard.slots[local];
            let pv = shard.pv.as_ref().map(|pv| pv[local]);
            (slot, pv)
        };

        if slot.bound == Bound::None {
            return None;
        }
        if slot.key != key {
            self.collisions.fetch_add(1, Ordering::Relaxed);
            return None;
        }

        let best_move = unpack_move(slot.best_move);
        if let Some(mv) = best_move {
            if !board.is_legal(mv) {
                self.collisions.fetch_add(1, Ordering::Relaxed);
                return None;
            }
        }

        let mut fragment = PvFragment::new();
        if let Some(pv) = pv {
            fragment.extend(
                pv.moves[..pv.len as usize]
                    .iter()
                    .filter_map(|&code| unpack_move(code)),
            );
        }

        self.hits.fetch_add(1, Ordering::Relaxed);
        Some((
            HashEntry {
                key,
                bound: slot.bound,
                depth: slot.depth as i32,
                score: slot.score,
                best_move,
            },
            fragment,
        ))
    }

    /// Overwrite the slot for `entry.key`.
    pub fn store(&self, entry: &HashEntry, pv: Option<&[Move]>) {
        let (domain, local) = self.locate(entry.key);
        let slot = Slot {
            key: entry.key,
            score: entry.score,
            depth: entry.depth.clamp(i16::MIN as i32, i16::MAX as i32) as i16,
            bound: entry.bound,
            best_move: pack_move(entry.best_move),
        };

        let mut shard = self.shards[domain].lock();
        shard.slots[local] = slot;
        if let Some(fragments) = shard.pv.as_mut() {
            let fragment = &mut fragments[local];
            *fragment = PvSlot::default();
            for (i, &mv) in pv.unwrap_or(&[]).iter().take(PV_FRAGMENT_LEN).enumerate() {
                fragment.moves[i] = pack_move(Some(mv));
                fragment.len += 1;
            }
        }
        drop(shard);

        self.stores.fetch_add(1, Ordering::Relaxed);
    }

    /// Empty every slot and reset the counters.
    pub fn clear(&self) {
        for shard in &self.shards {
            let mut shard = shard.lock();
            shard.slots.fill(Slot::default());
            if let Some(pv) = shard.pv.as_mut() {
                pv.fill(PvSlot::default());
            }
        }
        self.reset_statistics();
    }

    pub fn reset_statistics(&self) {
        self.probes.store(0, Ordering::Relaxed);
        self.hits.store(0, Ordering::Relaxed);
        self.collisions.store(0, Ordering::Relaxed);
        self.stores.store(0, Ordering::Relaxed);
    }

    pub fn stats(&self) -> TableStats {
        TableStats {
            size: self.size,
            probes: self.probes.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
            collisions: self.collisions.load(Ordering::Relaxed),
            stores: self.stores.load(Ordering::Relaxed),
        }
    }
}
