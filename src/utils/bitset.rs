//! A bit vector over byte offsets.
//!
//! The structural verifier marks the start offset of every row of a table in a [`BitSet`] sized
//! to the table length, so that a cross-table reference can be checked in constant time without
//! hashing. One bit per table byte keeps the overhead at 1/8 of the catalog size in the worst
//! case, and it is dropped as soon as verification finishes.
//!
//! # Example
//!
//! ```rust,ignore
//! use apicatalog::utils::BitSet;
//!
//! let mut rows = BitSet::new(100);
//! rows.insert(4);
//! rows.insert(40);
//!
//! assert!(rows.contains(40));
//! assert!(!rows.contains(41));
//! assert!(!rows.contains(1000));
//! assert_eq!(rows.count(), 2);
//! ```

/// A fixed-capacity bit vector.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct BitSet {
    /// The bits, stored as a vector of words.
    words: Vec<u64>,
    /// The number of bits in the set.
    len: usize,
}

impl BitSet {
    /// Creates an empty set able to hold indices `0..capacity`.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let num_words = capacity.div_ceil(64);
        Self {
            words: vec![0; num_words],
            len: capacity,
        }
    }

    /// Returns the capacity of the set.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no bit is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Sets the bit at `index`, returning `true` if it was not set before.
    ///
    /// # Panics
    /// Panics if `index` is not below the capacity.
    pub fn insert(&mut self, index: usize) -> bool {
        assert!(index < self.len, "index out of bounds");
        let word = index / 64;
        let bit = 1u64 << (index % 64);
        let was_set = self.words[word] & bit != 0;
        self.words[word] |= bit;
        !was_set
    }

    /// Returns `true` if the bit at `index` is set; indices beyond the capacity are never set.
    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        if index >= self.len {
            return false;
        }
        let word = index / 64;
        let bit = index % 64;
        (self.words[word] & (1u64 << bit)) != 0
    }

    /// Returns the number of set bits.
    #[must_use]
    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }
}

impl std::fmt::Debug for BitSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BitSet({}/{})", self.count(), self.len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bitset_basic() {
        let mut bs = BitSet::new(100);
        assert!(bs.is_empty());
        assert_eq!(bs.count(), 0);

        assert!(bs.insert(0));
        assert!(bs.insert(50));
        assert!(bs.insert(99));
        assert!(!bs.insert(50));

        assert!(!bs.is_empty());
        assert_eq!(bs.count(), 3);
        assert!(bs.contains(0));
        assert!(bs.contains(50));
        assert!(bs.contains(99));
        assert!(!bs.contains(1));
    }

    #[test]
    fn test_bitset_beyond_capacity() {
        let bs = BitSet::new(10);
        assert!(!bs.contains(10));
        assert!(!bs.contains(usize::MAX));
        assert_eq!(bs.len(), 10);
    }

    #[test]
    #[should_panic(expected = "index out of bounds")]
    fn test_bitset_insert_out_of_bounds() {
        let mut bs = BitSet::new(10);
        bs.insert(10);
    }
}
