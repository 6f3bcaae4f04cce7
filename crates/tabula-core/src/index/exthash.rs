//! Extendible hashing: a directory of power-of-two size over split-on-demand
//! buckets with per-bucket local depth.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use xxhash_rust::xxh64::Xxh64;

use super::KeyIndex;

/// The number of (key, value) slots per bucket.
pub const SLOTS: usize = 4;

/// Identifier of a bucket in the pool.
type BucketId = u64;

/// A bucket: up to [`SLOTS`] pairs plus its local modulus.
///
/// The local modulus is `2^d` for local depth `d`; a bucket with local
/// modulus `m` is referenced by every directory slot congruent to its first
/// slot index mod `m`.
#[derive(Debug)]
struct Bucket<K, V> {
    local_modulus: usize,
    entries: Vec<(K, V)>,
}

impl<K, V> Bucket<K, V> {
    fn new(local_modulus: usize) -> Bucket<K, V> {
        Bucket {
            local_modulus,
            entries: Vec::with_capacity(SLOTS),
        }
    }
}

/// A hash map using the extendible hashing algorithm.
///
/// The directory always holds `modulus` slots (a power of two); every slot
/// references exactly one bucket in the pool. Inserting into a full bucket
/// splits it, doubling the directory when the bucket's local depth already
/// equals the global depth. Entries are never removed.
///
/// Keys whose hashes collide in more than [`SLOTS`] low-order bit patterns at
/// every depth cause unbounded splitting; with a 64-bit hash this requires
/// adversarial keys.
pub struct ExtHash<K, V> {
    /// Physical bucket storage.
    pool: HashMap<BucketId, Bucket<K, V>>,
    /// Logical access paths: slot `i` serves keys with `hash(k) % modulus == i`.
    directory: Vec<BucketId>,
    /// Directory size, `2^global_depth`.
    modulus: usize,
    next_id: BucketId,
}

impl<K, V> ExtHash<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    /// Create a table with `directory_size` initial buckets, each at local
    /// depth equal to the global depth.
    ///
    /// # Panics
    ///
    /// Panics when `directory_size` is not a power of two (which includes 0).
    pub fn new(directory_size: usize) -> ExtHash<K, V> {
        assert!(
            directory_size.is_power_of_two(),
            "directory size must be a power of two, got {directory_size}"
        );
        let mut table = ExtHash {
            pool: HashMap::new(),
            directory: Vec::with_capacity(directory_size),
            modulus: directory_size,
            next_id: 0,
        };
        for _ in 0..directory_size {
            let id = table.alloc_bucket(directory_size);
            table.directory.push(id);
        }
        table
    }

    /// Look up the value stored under `key`.
    pub fn get(&self, key: &K) -> Option<&V> {
        let slot = self.slot_of(key);
        let bucket = &self.pool[&self.directory[slot]];
        bucket
            .entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Insert `value` under `key`, overwriting any previous value.
    pub fn put(&mut self, key: K, value: V) {
        let slot = self.slot_of(&key);
        let id = self.directory[slot];
        let bucket = self
            .pool
            .get_mut(&id)
            .expect("directory slot references a pooled bucket");
        if let Some(entry) = bucket.entries.iter_mut().find(|(k, _)| *k == key) {
            entry.1 = value;
            return;
        }
        if bucket.entries.len() < SLOTS {
            bucket.entries.push((key, value));
            return;
        }
        self.split(id, key, value);
    }

    /// Materialize all entries by sweeping the bucket pool (each bucket holds
    /// each key at most once, so no duplicates are emitted).
    pub fn entries(&self) -> Vec<(K, V)> {
        self.pool
            .values()
            .flat_map(|b| b.entries.iter().cloned())
            .collect()
    }

    /// The slot capacity of the table: `SLOTS ×` the number of buckets.
    ///
    /// This is an upper bound on the population, kept for compatibility with
    /// the structure's original contract; see [`population`](Self::population)
    /// for the number of stored entries.
    pub fn size(&self) -> usize {
        SLOTS * self.pool.len()
    }

    /// The number of (key, value) entries stored.
    pub fn population(&self) -> usize {
        self.pool.values().map(|b| b.entries.len()).sum()
    }

    /// Split the full bucket `id` and re-insert its entries plus the new pair.
    ///
    /// When the bucket's local depth equals the global depth the directory is
    /// doubled first. Re-insertion goes through ordinary `put` and may split
    /// again.
    fn split(&mut self, id: BucketId, key: K, value: V) {
        let local = self.pool[&id].local_modulus;
        if local == self.modulus {
            // The bucket is at global depth: double the directory. Slot `i`
            // is the only slot referencing the bucket before doubling, so
            // `i` and its new mirror `i + old_modulus` are exactly the slots
            // to repoint.
            let old_modulus = self.modulus;
            self.directory.extend_from_within(..);
            let i = self.slot_of(&key);
            let j = i + old_modulus;
            self.modulus *= 2;
            let first = self.alloc_bucket(self.modulus);
            let second = self.alloc_bucket(self.modulus);
            self.directory[i] = first;
            self.directory[j] = second;
        } else {
            // Slots referencing the bucket are congruent mod `local`; step
            // through them from the first occurrence, alternating between the
            // two replacement buckets to distribute on the next hash bit.
            let start = self
                .directory
                .iter()
                .position(|&b| b == id)
                .expect("full bucket is referenced by the directory");
            let first = self.alloc_bucket(local * 2);
            let second = self.alloc_bucket(local * 2);
            let mut slot = start;
            let mut k = 0usize;
            while slot < self.modulus {
                self.directory[slot] = if k % 2 == 0 { first } else { second };
                k += 1;
                slot += local;
            }
        }
        let evicted = self
            .pool
            .remove(&id)
            .expect("split target is a pooled bucket");
        self.put(key, value);
        for (k, v) in evicted.entries {
            self.put(k, v);
        }
    }

    fn alloc_bucket(&mut self, local_modulus: usize) -> BucketId {
        let id = self.next_id;
        self.next_id += 1;
        self.pool.insert(id, Bucket::new(local_modulus));
        id
    }

    fn slot_of(&self, key: &K) -> usize {
        let mut hasher = Xxh64::new(0);
        key.hash(&mut hasher);
        // Unsigned reduction: the hash is a u64, so the remainder is already
        // a valid slot index.
        (hasher.finish() % self.modulus as u64) as usize
    }
}

impl<K, V> KeyIndex<K, V> for ExtHash<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    fn get(&self, key: &K) -> Option<&V> {
        ExtHash::get(self, key)
    }

    fn put(&mut self, key: K, value: V) {
        ExtHash::put(self, key, value)
    }

    fn entries(&self) -> Vec<(K, V)> {
        ExtHash::entries(self)
    }

    fn size(&self) -> usize {
        ExtHash::size(self)
    }
}
