//! Pluggable primary-key indexes: an ordered B+Tree and an extendible hash.
//!
//! Both index kinds are expressed through the narrow [`KeyIndex`] interface
//! the table façade consumes, so the index backing a table can be swapped
//! without touching the relational operators.

pub mod btree;
pub mod exthash;

pub use btree::BpTree;
pub use exthash::ExtHash;

/// The narrow map interface shared by both index structures.
///
/// `size` is each structure's own notion of size: the B+Tree reports its true
/// key count, while the extendible hash reports its slot capacity
/// (`SLOTS × nBuckets`) for compatibility with its original contract; use
/// [`ExtHash::population`] for the entry count.
pub trait KeyIndex<K, V> {
    /// Look up the value stored under `key`.
    fn get(&self, key: &K) -> Option<&V>;

    /// Insert or overwrite the value stored under `key`.
    fn put(&mut self, key: K, value: V);

    /// Materialize all entries, in arbitrary order.
    fn entries(&self) -> Vec<(K, V)>;

    /// The structure's size figure (see the trait docs for the contract).
    fn size(&self) -> usize;
}
