mod entry;
mod table;

pub use entry::{Bound, HashEntry, PvFragment, PV_FRAGMENT_LEN};
pub use table::{TableStats, TranspositionTable};
