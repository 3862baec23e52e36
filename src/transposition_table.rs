use crate::evaluation::Eval;
use crate::position::{Move, ZobristHash};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranspositionTableScore {
    Exact(Eval),
    UpperBound(Eval),
    LowerBound(Eval),
}

impl TranspositionTableScore {
    pub fn eval(self) -> Eval {
        match self {
            Self::Exact(eval) | Self::UpperBound(eval) | Self::LowerBound(eval) => eval,
        }
    }

    fn map(self, f: impl FnOnce(Eval) -> Eval) -> Self {
        match self {
            Self::Exact(eval) => Self::Exact(f(eval)),
            Self::UpperBound(eval) => Self::UpperBound(f(eval)),
            Self::LowerBound(eval) => Self::LowerBound(f(eval)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranspositionTableEntry {
    hash: ZobristHash,
    pub score: TranspositionTableScore,
    pub best_move: Option<Move>,
    pub depth: u8,
    age: u8,
}

/// Direct-mapped cache of search results keyed by Zobrist hash.
///
/// An entry written during an earlier search is always replaced. Within one search an entry is
/// replaced by a result for the same position or one searched at least as deep.
#[derive(Debug, Clone)]
pub struct TranspositionTable {
    entries: Vec<Option<TranspositionTableEntry>>,
    age: u8,
}

impl TranspositionTable {
    /// Table using at most `size_mb` megabytes.
    pub fn new(size_mb: usize) -> Self {
        let entry_size = std::mem::size_of::<Option<TranspositionTableEntry>>();
        Self::with_entries(size_mb * 1024 * 1024 / entry_size)
    }

    /// Table with `num_entries` rounded down to a power of two. Zero entries disables caching.
    pub fn with_entries(num_entries: usize) -> Self {
        let num_entries = if num_entries == 0 {
            0
        } else {
            1 << num_entries.ilog2()
        };
        Self {
            entries: vec![None; num_entries],
            age: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    pub fn is_enabled(&self) -> bool {
        !self.entries.is_empty()
    }

    /// Entry for `hash` with mate scores made relative to a node `ply` plies from the root.
    pub fn get(&self, hash: ZobristHash, ply: usize) -> Option<TranspositionTableEntry> {
        let idx = self.index(hash)?;
        match self.entries[idx] {
            Some(entry) if entry.hash == hash => Some(TranspositionTableEntry {
                score: entry.score.map(|eval| eval.from_tt(ply)),
                ..entry
            }),
            _ => None,
        }
    }

    pub fn store(
        &mut self,
        hash: ZobristHash,
        score: TranspositionTableScore,
        best_move: Option<Move>,
        depth: u8,
        ply: usize,
    ) {
        let Some(idx) = self.index(hash) else {
            return;
        };

        if let Some(existing) = &self.entries[idx] {
            let keep_existing =
                existing.age == self.age && existing.hash != hash && existing.depth > depth;
            if keep_existing {
                return;
            }
        }

        self.entries[idx] = Some(TranspositionTableEntry {
            hash,
            score: score.map(|eval| eval.to_tt(ply)),
            best_move,
            depth,
            age: self.age,
        });
    }

    /// Marks every stored entry as belonging to a previous search.
    pub fn new_search(&mut self) {
        self.age = self.age.wrapping_add(1);
    }

    pub fn clear(&mut self) {
        self.entries.iter_mut().for_each(|entry| *entry = None);
        self.age = 0;
    }

    /// Permille of sampled slots holding an entry from the current search.
    pub fn hashfull(&self) -> usize {
        let sample = self.entries.len().min(1000);
        if sample == 0 {
            return 0;
        }
        let used = self.entries[..sample]
            .iter()
            .filter(|entry| matches!(entry, Some(entry) if entry.age == self.age))
            .count();
        used * 1000 / sample
    }

    fn index(&self, hash: ZobristHash) -> Option<usize> {
        if self.entries.is_empty() {
            None
        } else {
            Some((hash.value() as usize) & (self.entries.len() - 1))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::{MoveFlag, Position};
    use crate::square::Square::*;
    use test_case::test_case;
    use testresult::TestResult;

    fn hash_of(fen: &str) -> Result<ZobristHash, crate::position::FenParseError> {
        Ok(Position::from_fen(fen)?.zobrist_hash())
    }

    #[test_case(0, 0 ; "disabled")]
    #[test_case(1, 1 ; "one")]
    #[test_case(1000, 512 ; "rounded down")]
    #[test_case(1024, 1024 ; "power of two")]
    fn test_with_entries(num_entries: usize, want: usize) {
        assert_eq!(TranspositionTable::with_entries(num_entries).capacity(), want);
    }

    #[test]
    fn test_new_fits_in_size() {
        let table = TranspositionTable::new(1);
        let entry_size = std::mem::size_of::<Option<TranspositionTableEntry>>();
        assert!(table.capacity() * entry_size <= 1024 * 1024);
        assert!(table.capacity() * entry_size * 2 > 1024 * 1024);
    }

    #[test]
    fn test_store_and_get() {
        let mut table = TranspositionTable::with_entries(1024);
        let position = Position::start();
        let best_move = Move::with_flag(E2, E4, MoveFlag::DoublePawnPush);

        table.store(
            position.zobrist_hash(),
            TranspositionTableScore::Exact(Eval(25)),
            Some(best_move),
            4,
            0,
        );

        let entry = table.get(position.zobrist_hash(), 0);
        assert_eq!(entry.map(|e| e.best_move), Some(Some(best_move)));
        assert_eq!(entry.map(|e| e.score), Some(TranspositionTableScore::Exact(Eval(25))));
        assert_eq!(entry.map(|e| e.depth), Some(4));
    }

    #[test]
    fn test_disabled_table_stores_nothing() {
        let mut table = TranspositionTable::with_entries(0);
        let hash = Position::start().zobrist_hash();
        table.store(hash, TranspositionTableScore::Exact(Eval(1)), None, 1, 0);
        assert_eq!(table.get(hash, 0), None);
        assert_eq!(table.hashfull(), 0);
    }

    #[test]
    fn test_mate_scores_are_ply_relative() {
        let mut table = TranspositionTable::with_entries(16);
        let hash = Position::start().zobrist_hash();

        // Mate 7 plies from the root, stored at ply 3.
        table.store(hash, TranspositionTableScore::LowerBound(Eval::mate_in(7)), None, 2, 3);

        // Reached again at ply 5 the same mate is 9 plies from the root.
        let entry = table.get(hash, 5);
        assert_eq!(
            entry.map(|e| e.score),
            Some(TranspositionTableScore::LowerBound(Eval::mate_in(9)))
        );
    }

    #[test]
    fn test_replacement_policy() -> TestResult {
        // A single slot, so every position collides.
        let mut table = TranspositionTable::with_entries(1);
        let deep = hash_of("4k3/8/8/8/8/8/8/4K2R w K - 0 1")?;
        let shallow = hash_of("4k3/8/8/8/8/8/8/4K2R b K - 0 1")?;

        table.store(deep, TranspositionTableScore::Exact(Eval(10)), None, 6, 0);
        table.store(shallow, TranspositionTableScore::Exact(Eval(20)), None, 2, 0);
        assert!(table.get(deep, 0).is_some(), "shallower entry replaced a deeper one");
        assert!(table.get(shallow, 0).is_none());

        // The same position is always refreshed.
        table.store(deep, TranspositionTableScore::UpperBound(Eval(5)), None, 1, 0);
        assert_eq!(
            table.get(deep, 0).map(|e| e.score),
            Some(TranspositionTableScore::UpperBound(Eval(5)))
        );

        // Entries from an older search are always replaced.
        table.store(deep, TranspositionTableScore::Exact(Eval(10)), None, 6, 0);
        table.new_search();
        table.store(shallow, TranspositionTableScore::Exact(Eval(20)), None, 1, 0);
        assert!(table.get(shallow, 0).is_some());
        Ok(())
    }

    #[test]
    fn test_hashfull_and_clear() {
        let mut table = TranspositionTable::with_entries(4);
        let hash = Position::start().zobrist_hash();
        table.store(hash, TranspositionTableScore::Exact(Eval(0)), None, 1, 0);
        assert_eq!(table.hashfull(), 250);

        table.new_search();
        assert_eq!(table.hashfull(), 0);

        table.clear();
        assert_eq!(table.get(hash, 0), None);
    }
}
