//! Range-restricted views over a B+Tree.
//!
//! A [`SubMap`] is a lightweight wrapper pairing a tree reference with an
//! interval of keys. Counting, first/last key, and membership all delegate to
//! the tree's interval primitives; views can be refined into narrower views
//! but never broadened past their parent.

use std::fmt;
use std::ops::Bound;

use crate::error::IndexError;

use super::BpTree;

/// A key interval with independently inclusive/exclusive endpoints.
#[derive(Debug, Clone)]
pub(super) struct Interval<K> {
    pub lo: Bound<K>,
    pub hi: Bound<K>,
}

impl<K: Ord + Clone> Interval<K> {
    pub fn new(lo: Bound<K>, hi: Bound<K>) -> Interval<K> {
        Interval { lo, hi }
    }

    /// The unrestricted interval.
    pub fn all() -> Interval<K> {
        Interval {
            lo: Bound::Unbounded,
            hi: Bound::Unbounded,
        }
    }

    /// Whether `key` lies inside the interval.
    pub fn contains(&self, key: &K) -> bool {
        let above_lo = match &self.lo {
            Bound::Unbounded => true,
            Bound::Included(b) => key >= b,
            Bound::Excluded(b) => key > b,
        };
        let below_hi = match &self.hi {
            Bound::Unbounded => true,
            Bound::Included(b) => key <= b,
            Bound::Excluded(b) => key < b,
        };
        above_lo && below_hi
    }

    /// Whether a child node covering keys in `[child_lo, child_hi)` can hold
    /// any key of this interval. `None` stands for an unbounded side.
    pub fn overlaps(&self, child_lo: Option<&K>, child_hi: Option<&K>) -> bool {
        // All child keys are >= child_lo: they miss the interval when they
        // start at or beyond the upper bound.
        if let Some(cl) = child_lo {
            match &self.hi {
                Bound::Included(b) if cl > b => return false,
                Bound::Excluded(b) if cl >= b => return false,
                _ => {}
            }
        }
        // All child keys are < child_hi: they miss the interval when the
        // child ends at or before the lower bound.
        if let Some(ch) = child_hi {
            match &self.lo {
                Bound::Included(b) | Bound::Excluded(b) if ch <= b => return false,
                _ => {}
            }
        }
        true
    }

    /// Compose this interval with a tighter one. The stricter bound wins on
    /// each side; when bound values coincide, the tighter interval's
    /// inclusivity applies only if it does not widen the interval.
    pub fn refine(&self, tighter: Interval<K>) -> Result<Interval<K>, IndexError> {
        Ok(Interval {
            lo: refine_lo(&self.lo, tighter.lo)?,
            hi: refine_hi(&self.hi, tighter.hi)?,
        })
    }
}

fn refine_lo<K: Ord + Clone>(parent: &Bound<K>, child: Bound<K>) -> Result<Bound<K>, IndexError> {
    let (p, p_inclusive) = match parent {
        Bound::Unbounded => return Ok(child),
        Bound::Included(p) => (p, true),
        Bound::Excluded(p) => (p, false),
    };
    let (c, c_inclusive) = match &child {
        Bound::Unbounded => return Ok(parent.clone()),
        Bound::Included(c) => (c, true),
        Bound::Excluded(c) => (c, false),
    };
    if c < p || (c == p && c_inclusive && !p_inclusive) {
        return Err(IndexError::KeyOutOfRange);
    }
    if c > p || !c_inclusive {
        Ok(child)
    } else {
        Ok(parent.clone())
    }
}

fn refine_hi<K: Ord + Clone>(parent: &Bound<K>, child: Bound<K>) -> Result<Bound<K>, IndexError> {
    let (p, p_inclusive) = match parent {
        Bound::Unbounded => return Ok(child),
        Bound::Included(p) => (p, true),
        Bound::Excluded(p) => (p, false),
    };
    let (c, c_inclusive) = match &child {
        Bound::Unbounded => return Ok(parent.clone()),
        Bound::Included(c) => (c, true),
        Bound::Excluded(c) => (c, false),
    };
    if c > p || (c == p && c_inclusive && !p_inclusive) {
        return Err(IndexError::KeyOutOfRange);
    }
    if c < p || !c_inclusive {
        Ok(child)
    } else {
        Ok(parent.clone())
    }
}

/// A view of the keys of a B+Tree restricted to an interval.
///
/// Reads (`get`, `contains_key`, `first_key`, `last_key`, `size`) observe only
/// keys inside the interval. `put` writes through to the underlying tree with
/// no bounds check: the view restricts what is seen, not what can be
/// written.
pub struct SubMap<'a, K, V> {
    tree: &'a mut BpTree<K, V>,
    range: Interval<K>,
}

impl<'a, K, V> SubMap<'a, K, V>
where
    K: Ord + Clone + fmt::Debug,
    V: Clone,
{
    pub(super) fn new(tree: &'a mut BpTree<K, V>, range: Interval<K>) -> SubMap<'a, K, V> {
        SubMap { tree, range }
    }

    /// The number of tree keys inside the view's interval.
    pub fn size(&self) -> usize {
        self.tree.n_keys_in_interval(&self.range)
    }

    /// The smallest key inside the view.
    pub fn first_key(&self) -> Result<&K, IndexError> {
        self.tree
            .first_key_in_interval(&self.range)
            .ok_or(IndexError::Empty)
    }

    /// The largest key inside the view.
    pub fn last_key(&self) -> Result<&K, IndexError> {
        self.tree
            .last_key_in_interval(&self.range)
            .ok_or(IndexError::Empty)
    }

    /// Look up `key`, answering `None` for keys outside the interval.
    pub fn get(&self, key: &K) -> Option<&V> {
        if !self.range.contains(key) {
            return None;
        }
        self.tree.get(key)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Insert into the underlying tree. The key is not required to lie inside
    /// the view's interval.
    pub fn put(&mut self, key: K, value: V) {
        self.tree.put(key, value);
    }

    /// Narrow the view to `[from, to)`.
    pub fn sub_map(&mut self, from: K, to: K) -> Result<SubMap<'_, K, V>, IndexError> {
        if from > to {
            return Err(IndexError::InconsistentRange);
        }
        let range = self
            .range
            .refine(Interval::new(Bound::Included(from), Bound::Excluded(to)))?;
        Ok(SubMap::new(self.tree, range))
    }

    /// Narrow the view to keys below `to`.
    pub fn head_map(&mut self, to: K) -> Result<SubMap<'_, K, V>, IndexError> {
        let range = self
            .range
            .refine(Interval::new(Bound::Unbounded, Bound::Excluded(to)))?;
        Ok(SubMap::new(self.tree, range))
    }

    /// Narrow the view to keys at or above `from`.
    pub fn tail_map(&mut self, from: K) -> Result<SubMap<'_, K, V>, IndexError> {
        let range = self
            .range
            .refine(Interval::new(Bound::Included(from), Bound::Unbounded))?;
        Ok(SubMap::new(self.tree, range))
    }
}
