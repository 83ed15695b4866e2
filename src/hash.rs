//! Zero-sized hash builder for the scheduler's internal collections.
//!
//! Keys are render ids produced by this crate, never by callers. The seed is
//! fixed so pending-set iteration order is the same across runs.

use foldhash::fast::{FixedState, FoldHasher};
use std::hash::BuildHasher;

/// A zero-sized `BuildHasher` using foldhash with a fixed seed.
#[derive(Clone, Copy, Debug, Default)]
pub struct FastHashBuilder;

impl BuildHasher for FastHashBuilder {
    type Hasher = FoldHasher<'static>;

    #[inline]
    fn build_hasher(&self) -> Self::Hasher {
        FixedState::with_seed(0x2f6e_a1c3_9b57_d4e1).build_hasher()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexSet;

    #[test]
    fn fast_hash_builder_is_zero_sized() {
        assert_eq!(std::mem::size_of::<FastHashBuilder>(), 0);
    }

    #[test]
    fn index_set_keeps_insertion_order_with_fast_hasher() {
        let mut set: IndexSet<u32, FastHashBuilder> = IndexSet::default();
        set.insert(7);
        set.insert(3);
        set.insert(7);
        set.insert(11);

        assert_eq!(set.iter().copied().collect::<Vec<_>>(), vec![7, 3, 11]);
    }
}
