//! Prefix index used to enumerate next-rank candidates without a cross product

mod trie;

pub use trie::PrefixIndex;
