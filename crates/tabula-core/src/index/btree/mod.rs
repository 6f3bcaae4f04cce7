//! B+Tree map: a multi-level ordered index for point and range queries.
//!
//! Nodes are arena-allocated and addressed by index; insertion walks down
//! with an explicit stack of ancestor ids and re-ascends on splits, so no
//! parent pointers are needed. Keys are never deleted; capacity grows
//! monotonically.

mod node;
mod submap;

use std::cell::Cell;
use std::collections::VecDeque;
use std::fmt;
use std::ops::Bound;

use tracing::warn;

use crate::error::IndexError;

use self::node::{Node, NodeId, ORDER};
use self::submap::Interval;
pub use self::submap::SubMap;

use super::KeyIndex;

/// What a split inserts into one of the two halves: a leaf entry's value, or
/// a freshly split child node.
enum Wedge<V> {
    Value(V),
    Child(NodeId),
}

/// An ordered map backed by a B+Tree of fanout [`ORDER`].
///
/// Point lookups descend with the left-biased convention (a key equal to a
/// separator belongs to the right child). Duplicate insertions overwrite the
/// stored value in place and emit a `tracing` warning. Range access goes
/// through [`SubMap`] views obtained with [`sub_map`](Self::sub_map),
/// [`head_map`](Self::head_map), and [`tail_map`](Self::tail_map).
pub struct BpTree<K, V> {
    arena: Vec<Node<K, V>>,
    root: NodeId,
    /// Nodes visited by `get`, for performance tests.
    visits: Cell<u64>,
}

impl<K, V> BpTree<K, V>
where
    K: Ord + Clone + fmt::Debug,
    V: Clone,
{
    /// Create an empty tree: a single empty leaf root.
    pub fn new() -> BpTree<K, V> {
        BpTree {
            arena: vec![Node::leaf()],
            root: 0,
            visits: Cell::new(0),
        }
    }

    /// Look up the value stored under `key`.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.find(self.root, key)
    }

    fn find(&self, n: NodeId, key: &K) -> Option<&V> {
        self.visits.set(self.visits.get() + 1);
        let node = &self.arena[n];
        for (i, ki) in node.keys.iter().enumerate() {
            if key <= ki {
                return if node.leaf {
                    if key == ki {
                        Some(&node.values[i])
                    } else {
                        None
                    }
                } else if key == ki {
                    // Equality goes right.
                    self.find(node.children[i + 1], key)
                } else {
                    self.find(node.children[i], key)
                };
            }
        }
        if node.leaf {
            None
        } else {
            self.find(*node.children.last().expect("internal node has children"), key)
        }
    }

    /// Insert `value` under `key`. A duplicate key overwrites the stored
    /// value (and warns); the tree's size is unchanged in that case.
    pub fn put(&mut self, key: K, value: V) {
        // Descend to the leaf, recording the ancestor path.
        let mut stack: Vec<NodeId> = Vec::new();
        let mut n = self.root;
        while !self.arena[n].leaf {
            let node = &self.arena[n];
            let pos = node.keys.partition_point(|k| k <= &key);
            stack.push(n);
            n = node.children[pos];
        }

        let pos = self.arena[n].keys.partition_point(|k| k < &key);
        let leaf = &mut self.arena[n];
        if pos < leaf.keys.len() && leaf.keys[pos] == key {
            warn!(key = ?key, "duplicate key insertion overwrites the stored value");
            leaf.values[pos] = value;
            return;
        }
        if !leaf.is_full() {
            leaf.keys.insert(pos, key);
            leaf.values.insert(pos, value);
            return;
        }

        // Split the leaf, then wedge the new sibling upward while ancestors
        // are full. A root split is handled inside `split`.
        let mut sibling = self.split(n, &key, Wedge::Value(value));
        while let Some(parent) = stack.pop() {
            let sep = self.arena[sibling].keys[0].clone();
            if !self.arena[parent].is_full() {
                let pos = self.arena[parent].keys.partition_point(|k| k <= &sep);
                self.wedge_child(parent, pos, sep, sibling);
                return;
            }
            sibling = self.split(parent, &sep, Wedge::Child(sibling));
        }
    }

    /// The smallest key, or `Empty` when the tree holds no keys.
    pub fn first_key(&self) -> Result<&K, IndexError> {
        let mut n = self.root;
        while !self.arena[n].leaf {
            n = self.arena[n].children[0];
        }
        self.arena[n].keys.first().ok_or(IndexError::Empty)
    }

    /// The largest key, or `Empty` when the tree holds no keys.
    pub fn last_key(&self) -> Result<&K, IndexError> {
        let mut n = self.root;
        while !self.arena[n].leaf {
            n = *self.arena[n]
                .children
                .last()
                .expect("internal node has children");
        }
        self.arena[n].keys.last().ok_or(IndexError::Empty)
    }

    /// The number of keys, summed over the leaves breadth-first.
    pub fn size(&self) -> usize {
        let mut sum = 0;
        let mut queue = VecDeque::from([self.root]);
        while let Some(n) = queue.pop_front() {
            let node = &self.arena[n];
            if node.leaf {
                sum += node.keys.len();
            } else {
                queue.extend(node.children.iter().copied());
            }
        }
        sum
    }

    /// Materialize all entries with a breadth-first sweep, in arbitrary order.
    pub fn entries(&self) -> Vec<(K, V)> {
        let mut out = Vec::new();
        let mut queue = VecDeque::from([self.root]);
        while let Some(n) = queue.pop_front() {
            let node = &self.arena[n];
            if node.leaf {
                for (k, v) in node.keys.iter().zip(&node.values) {
                    out.push((k.clone(), v.clone()));
                }
            } else {
                queue.extend(node.children.iter().copied());
            }
        }
        out
    }

    /// The number of nodes visited by `get` so far.
    pub fn node_visits(&self) -> u64 {
        self.visits.get()
    }

    /// A view of the keys in `[from, to)`. Fails when `from > to`.
    pub fn sub_map(&mut self, from: K, to: K) -> Result<SubMap<'_, K, V>, IndexError> {
        if from > to {
            return Err(IndexError::InconsistentRange);
        }
        Ok(SubMap::new(
            self,
            Interval::new(Bound::Included(from), Bound::Excluded(to)),
        ))
    }

    /// A view of the keys below `to`.
    pub fn head_map(&mut self, to: K) -> SubMap<'_, K, V> {
        SubMap::new(self, Interval::new(Bound::Unbounded, Bound::Excluded(to)))
    }

    /// A view of the keys at or above `from`.
    pub fn tail_map(&mut self, from: K) -> SubMap<'_, K, V> {
        SubMap::new(self, Interval::new(Bound::Included(from), Bound::Unbounded))
    }

    // -----------------------------------------------------------------------
    // Interval primitives (used by SubMap views)
    // -----------------------------------------------------------------------

    /// Count the keys inside `range`, descending only into children whose
    /// key range intersects it.
    fn n_keys_in_interval(&self, range: &Interval<K>) -> usize {
        self.count_in(self.root, range)
    }

    fn count_in(&self, n: NodeId, range: &Interval<K>) -> usize {
        let node = &self.arena[n];
        if node.leaf {
            return node.keys.iter().filter(|k| range.contains(k)).count();
        }
        self.intersecting_children(node, range)
            .map(|child| self.count_in(child, range))
            .sum()
    }

    /// The smallest key inside `range`, scanning children in key order.
    fn first_key_in_interval(&self, range: &Interval<K>) -> Option<&K> {
        self.first_in(self.root, range)
    }

    fn first_in(&self, n: NodeId, range: &Interval<K>) -> Option<&K> {
        let node = &self.arena[n];
        if node.leaf {
            return node.keys.iter().find(|k| range.contains(k));
        }
        self.intersecting_children(node, range)
            .find_map(|child| self.first_in(child, range))
    }

    /// The largest key inside `range`, scanning children in reverse key
    /// order and each leaf from its last key downward.
    fn last_key_in_interval(&self, range: &Interval<K>) -> Option<&K> {
        self.last_in(self.root, range)
    }

    fn last_in(&self, n: NodeId, range: &Interval<K>) -> Option<&K> {
        let node = &self.arena[n];
        if node.leaf {
            return node.keys.iter().rev().find(|k| range.contains(k));
        }
        let children: Vec<NodeId> = self.intersecting_children(node, range).collect();
        children
            .into_iter()
            .rev()
            .find_map(|child| self.last_in(child, range))
    }

    /// The children of `node` whose key range `[keys[i-1], keys[i])`
    /// intersects `range`, in key order.
    fn intersecting_children<'t>(
        &self,
        node: &'t Node<K, V>,
        range: &'t Interval<K>,
    ) -> impl Iterator<Item = NodeId> + 't {
        node.children.iter().enumerate().filter_map(move |(i, &child)| {
            let lo = if i == 0 { None } else { Some(&node.keys[i - 1]) };
            let hi = node.keys.get(i);
            range.overlaps(lo, hi).then_some(child)
        })
    }

    // -----------------------------------------------------------------------
    // Splits
    // -----------------------------------------------------------------------

    /// Insert `(key, ref)` into node `parent` at key position `pos`, shifting
    /// subsequent entries right. When the wedged child is an internal node,
    /// its first key has just been promoted into `parent`, so the child drops
    /// that key together with its boundary-placeholder child.
    fn wedge_child(&mut self, parent: NodeId, pos: usize, key: K, child: NodeId) {
        if !self.arena[child].leaf {
            self.arena[child].keys.remove(0);
            self.arena[child].children.remove(0);
        }
        let node = &mut self.arena[parent];
        node.keys.insert(pos, key);
        node.children.insert(pos + 1, child);
    }

    /// Split the full node `n` while inserting `key` with `wedge`, and return
    /// the new right sibling. The sibling's first key is the separator the
    /// caller must wedge into the parent; when `n` is the root a new root is
    /// created here.
    ///
    /// An internal sibling starts with a copy of the boundary child shared
    /// with `n`; the copy is dropped when the sibling's first key is promoted
    /// (see [`wedge_child`](Self::wedge_child)).
    fn split(&mut self, n: NodeId, key: &K, wedge: Wedge<V>) -> NodeId {
        let pos = self.arena[n].keys.partition_point(|k| k < key);
        let is_leaf = self.arena[n].leaf;
        let mut mid = ORDER / 2;

        // A median-position insert is routed into the left half; for odd
        // ORDER the right-half index arithmetic would underflow on it.
        let to_left = pos < mid || (ORDER % 2 == 1 && pos == mid);

        let mut sibling = if is_leaf {
            Node::leaf()
        } else {
            Node::internal()
        };
        if to_left {
            if ORDER % 2 == 0 {
                mid -= 1;
            }
        } else if ORDER % 2 == 1 {
            mid += 1;
        }

        {
            let node = &mut self.arena[n];
            sibling.keys = node.keys.split_off(mid);
            if is_leaf {
                sibling.values = node.values.split_off(mid);
            } else {
                sibling.children = node.children[mid..].to_vec();
                node.children.truncate(mid + 1);
            }
        }
        let sibling_id = self.arena.len();
        self.arena.push(sibling);

        let (target, target_pos) = if to_left { (n, pos) } else { (sibling_id, pos - mid) };
        match wedge {
            Wedge::Value(value) => {
                let node = &mut self.arena[target];
                node.keys.insert(target_pos, key.clone());
                node.values.insert(target_pos, value);
            }
            Wedge::Child(child) => self.wedge_child(target, target_pos, key.clone(), child),
        }

        if n == self.root {
            let mut new_root = Node::internal();
            new_root.children.push(n);
            let new_root_id = self.arena.len();
            self.arena.push(new_root);
            let sep = self.arena[sibling_id].keys[0].clone();
            self.wedge_child(new_root_id, 0, sep, sibling_id);
            self.root = new_root_id;
        }

        sibling_id
    }
}

impl<K, V> Default for BpTree<K, V>
where
    K: Ord + Clone + fmt::Debug,
    V: Clone,
{
    fn default() -> BpTree<K, V> {
        BpTree::new()
    }
}

impl<K, V> KeyIndex<K, V> for BpTree<K, V>
where
    K: Ord + Clone + fmt::Debug,
    V: Clone,
{
    fn get(&self, key: &K) -> Option<&V> {
        BpTree::get(self, key)
    }

    fn put(&mut self, key: K, value: V) {
        BpTree::put(self, key, value)
    }

    fn entries(&self) -> Vec<(K, V)> {
        BpTree::entries(self)
    }

    fn size(&self) -> usize {
        BpTree::size(self)
    }
}
