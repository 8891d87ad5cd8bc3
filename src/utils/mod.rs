mod bitset;

pub(crate) use bitset::BitSet;
