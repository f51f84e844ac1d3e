use arrayvec::ArrayVec;
use cozy_chess::{Move, Piece, Square};
use evaluation::scores::MATE;

/// Moves kept next to a table entry when the PV table is enabled.
pub const PV_FRAGMENT_LEN: usize = 8;

pub type PvFragment = ArrayVec<Move, PV_FRAGMENT_LEN>;

/// Indicates whether the stored value is exact or a bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Bound {
    /// Empty slot
    #[default]
    None,
    /// True minimax value (alpha < value < beta)
    Exact,
    /// Value >= beta (beta cutoff)
    Lower,
    /// Value <= alpha (all moves failed)
    Upper,
}

/// A search result as seen by callers of the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashEntry {
    pub key: u64,
    pub bound: Bound,
    pub depth: i32,
    pub score: i32,
    pub best_move: Option<Move>,
}

impl HashEntry {
    /// Classify a search result against the window it was searched with.
    ///
    /// Mate scores lose their distance and become one-sided bounds, so an
    /// entry stays valid no matter at which ply the position is reached again.
    pub fn from_search(
        key: u64,
        score: i32,
        alpha: i32,
        beta: i32,
        depth: i32,
        best_move: Option<Move>,
    ) -> Self {
        let (bound, score) = if score >= MATE {
            (Bound::Lower, MATE)
        } else if score <= -MATE {
            (Bound::Upper, -MATE)
        } else if score >= beta {
            (Bound::Lower, score)
        } else if score <= alpha {
            (Bound::Upper, score)
        } else {
            (Bound::Exact, score)
        };

        Self {
            key,
            bound,
            depth,
            score,
            best_move,
        }
    }

    /// Whether the entry can stand in for a search of `depth` with this window.
    pub fn usable(&self, depth: i32, alpha: i32, beta: i32) -> bool {
        if self.depth < depth {
            return false;
        }
        match self.bound {
            Bound::Exact => true,
            Bound::Upper => self.score <= alpha,
            Bound::Lower => self.score >= beta,
            Bound::None => false,
        }
    }
}

/// Packs a move into 16 bits: [15:12]=promo, [11:6]=to, [5:0]=from
pub(super) fn pack_move(mv: Option<Move>) -> u16 {
    if let Some(m) = mv {
        let from = m.from as u16;
        let to = m.to as u16;
        let promo = match m.promotion {
            Some(Piece::Knight) => 1u16,
            Some(Piece::Bishop) => 2u16,
            Some(Piece::Rook) => 3u16,
            Some(Piece::Queen) => 4u16,
            _ => 0u16,
        };
        (from & 0x3F) | ((to & 0x3F) << 6) | ((promo & 0x0F) << 12)
    } else {
        0
    }
}

/// Unpacks a 16-bit encoded move.
pub(super) fn unpack_move(code: u16) -> Option<Move> {
    // a1a1 is never a move, so zero doubles as "none"
    if code == 0 {
        return None;
    }
    let from = Square::index((code & 0x3F) as usize);
    let to = Square::index(((code >> 6) & 0x3F) as usize);
    let promotion = match (code >> 12) & 0x0F {
        1 => Some(Piece::Knight),
        2 => Some(Piece::Bishop),
        3 => Some(Piece::Rook),
        4 => Some(Piece::Queen),
        _ => None,
    };
    Some(Move {
        from,
        to,
        promotion,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use evaluation::scores::INFTY;

    #[test]
    fn test_pack_unpack_moves() {
        let test_moves: &[(&str, &str, Option<Piece>)] = &[
            ("e2", "e4", None),
            ("a1", "h8", None),
            ("e7", "e8", Some(Piece::Queen)),
            ("a7", "a8", Some(Piece::Knight)),
            ("b2", "b1", Some(Piece::Rook)),
            ("h7", "h8", Some(Piece::Bishop)),
        ];

        for &(from, to, promo) in test_moves {
            let mv = Move {
                from: from.parse().unwrap(),
                to: to.parse().unwrap(),
                promotion: promo,
            };
            assert_eq!(unpack_move(pack_move(Some(mv))), Some(mv), "{}{}", from, to);
        }
        assert_eq!(pack_move(None), 0);
        assert_eq!(unpack_move(0), None);
    }

    #[test]
    fn test_classification() {
        let e = |score| HashEntry::from_search(1, score, -50, 50, 3, None);

        assert_eq!(e(0).bound, Bound::Exact);
        assert_eq!(e(50).bound, Bound::Lower);
        assert_eq!(e(-50).bound, Bound::Upper);

        let win = e(INFTY - 3);
        assert_eq!((win.bound, win.score), (Bound::Lower, MATE));
        let loss = e(-INFTY + 4);
        assert_eq!((loss.bound, loss.score), (Bound::Upper, -MATE));
    }

    #[test]
    fn test_usable() {
        let exact = HashEntry::from_search(1, 10, -50, 50, 4, None);
        assert!(exact.usable(4, -50, 50));
        assert!(exact.usable(2, 20, 30));
        assert!(!exact.usable(5, -50, 50));

        let lower = HashEntry::from_search(1, 80, -50, 50, 4, None);
        assert!(lower.usable(4, 0, 70));
        assert!(!lower.usable(4, 0, 90));

        let upper = HashEntry::from_search(1, -80, -50, 50, 4, None);
        assert!(upper.usable(4, -70, 0));
        assert!(!upper.usable(4, -90, 0));

        // clamped mates only cut windows that end at or below MATE
        let mate = HashEntry::from_search(1, INFTY - 1, -50, 50, 1, None);
        assert!(mate.usable(1, -INFTY, MATE));
        assert!(!mate.usable(1, -INFTY, INFTY));
    }
}
