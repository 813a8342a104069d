//! Lazy min-heap with stale entry skipping.
//!
//! A priority queue whose score updates never search the heap. An update
//! writes the authoritative score map and pushes a fresh heap entry; older
//! entries for the same key become stale and are discarded when they surface
//! in [`pop_best`](LazyMinHeap::pop_best).
//!
//! ## Architecture
//!
//! ```text
//!   scores: FxHashMap<K, S>            heap: BinaryHeap<Reverse<HeapEntry>>
//!   (authoritative)                    (may hold stale entries)
//!   ┌──────┬───────┐                   ┌───────────────────────────────┐
//!   │  12  │   3   │                   │ (12, 3, seq=5)  current min   │
//!   │  40  │   7   │                   │ (40, 7, seq=4)  live          │
//!   │   9  │  10   │                   │ ( 9, 10, seq=3) live          │
//!   └──────┴───────┘                   │ ( 9, 15, seq=1) STALE         │
//!                                      └───────────────────────────────┘
//!
//!   update(k, s):  scores[k] = s; heap.push((k, s, seq++))
//!   pop_best():    pop until an entry's score equals scores[k]
//! ```
//!
//! Equal scores pop in insertion order (sequence number tie-break).
//!
//! Wrap the score in [`std::cmp::Reverse`] to get max-first behaviour; the
//! Belady-MIN simulator does exactly that to find the resident whose next use
//! is furthest away.
//!
//! ## Operations
//!
//! | Operation       | Complexity          |
//! |-----------------|---------------------|
//! | `update`        | O(log n)            |
//! | `remove`        | O(1)                |
//! | `pop_best`      | amortized O(log n)  |
//! | `score_of`      | O(1)                |
//! | `rebuild`       | O(n log n)          |
//!
//! ## Example Usage
//!
//! ```
//! use cachesim::ds::LazyMinHeap;
//!
//! let mut heap: LazyMinHeap<u64, u32> = LazyMinHeap::new();
//! heap.update(1, 5);
//! heap.update(2, 2);
//! heap.update(3, 8);
//! heap.update(1, 1);
//!
//! assert_eq!(heap.pop_best(), Some((1, 1)));
//! assert_eq!(heap.pop_best(), Some((2, 2)));
//! assert_eq!(heap.pop_best(), Some((3, 8)));
//! assert_eq!(heap.pop_best(), None);
//! ```
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::hash::Hash;

use rustc_hash::FxHashMap;

use crate::error::InvariantError;

#[derive(Debug, Clone)]
struct HeapEntry<K, S> {
    score: S,
    seq: u64,
    key: K,
}

impl<K, S: Ord> PartialEq for HeapEntry<K, S> {
    fn eq(&self, other: &Self) -> bool {
        self.score == other.score && self.seq == other.seq
    }
}

impl<K, S: Ord> Eq for HeapEntry<K, S> {}

impl<K, S: Ord> PartialOrd for HeapEntry<K, S> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K, S: Ord> Ord for HeapEntry<K, S> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .cmp(&other.score)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

/// Min-heap with cheap score updates via lazy deletion.
///
/// # Type Parameters
///
/// - `K`: key type (`Eq + Hash + Clone`)
/// - `S`: score type (`Ord + Clone`)
#[derive(Debug, Clone)]
pub struct LazyMinHeap<K, S> {
    scores: FxHashMap<K, S>,
    heap: BinaryHeap<Reverse<HeapEntry<K, S>>>,
    seq: u64,
}

impl<K, S> LazyMinHeap<K, S>
where
    K: Eq + Hash + Clone,
    S: Ord + Clone,
{
    /// Creates an empty heap.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty heap with pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut scores = FxHashMap::default();
        scores.reserve(capacity);
        Self {
            scores,
            heap: BinaryHeap::with_capacity(capacity),
            seq: 0,
        }
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Underlying heap length, stale entries included.
    pub fn heap_len(&self) -> usize {
        self.heap.len()
    }

    /// Returns the current score for `key`, if present.
    pub fn score_of(&self, key: &K) -> Option<&S> {
        self.scores.get(key)
    }

    /// Iterates live keys in unspecified order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.scores.keys()
    }

    /// Sets `key`'s score and returns the previous score, if any.
    ///
    /// ```
    /// use cachesim::ds::LazyMinHeap;
    ///
    /// let mut heap: LazyMinHeap<u64, i32> = LazyMinHeap::new();
    /// assert_eq!(heap.update(7, 10), None);
    /// assert_eq!(heap.update(7, 5), Some(10));
    /// assert_eq!(heap.score_of(&7), Some(&5));
    /// assert_eq!(heap.heap_len(), 2);
    /// ```
    pub fn update(&mut self, key: K, score: S) -> Option<S> {
        let previous = self.scores.insert(key.clone(), score.clone());
        self.push_entry(key, score);
        previous
    }

    /// Removes `key` from the authoritative map; its heap entries go stale.
    pub fn remove(&mut self, key: &K) -> Option<S> {
        self.scores.remove(key)
    }

    /// Pops the minimum `(key, score)`, skipping stale entries.
    pub fn pop_best(&mut self) -> Option<(K, S)> {
        loop {
            let Reverse(entry) = self.heap.pop()?;
            match self.scores.get(&entry.key) {
                Some(score) if *score == entry.score => {
                    self.scores.remove(&entry.key);
                    return Some((entry.key, entry.score));
                },
                _ => continue,
            }
        }
    }

    /// Drops every key and heap entry.
    pub fn clear(&mut self) {
        self.scores.clear();
        self.heap.clear();
        self.seq = 0;
    }

    /// Rebuilds the heap from the score map, dropping stale entries.
    pub fn rebuild(&mut self) {
        self.heap.clear();
        let entries: Vec<(K, S)> = self
            .scores
            .iter()
            .map(|(key, score)| (key.clone(), score.clone()))
            .collect();
        for (key, score) in entries {
            self.push_entry(key, score);
        }
    }

    /// Rebuilds when `heap_len() > len() * factor`.
    ///
    /// ```
    /// use cachesim::ds::LazyMinHeap;
    ///
    /// let mut heap: LazyMinHeap<u64, u64> = LazyMinHeap::new();
    /// heap.update(1, 1);
    /// heap.update(1, 2);
    /// heap.update(1, 3);
    /// heap.maybe_rebuild(2);
    /// assert_eq!(heap.heap_len(), 1);
    /// ```
    pub fn maybe_rebuild(&mut self, factor: usize) {
        let factor = factor.max(1);
        if self.heap.len() > self.scores.len().saturating_mul(factor) {
            self.rebuild();
        }
    }

    /// Every live key must have at least one heap entry carrying its score.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        if self.heap.len() < self.scores.len() {
            return Err(InvariantError::new(format!(
                "lazy heap: {} heap entries for {} live keys",
                self.heap.len(),
                self.scores.len()
            )));
        }
        let mut backed: FxHashMap<&K, bool> = self.scores.keys().map(|k| (k, false)).collect();
        for Reverse(entry) in self.heap.iter() {
            if self.scores.get(&entry.key) == Some(&entry.score) {
                if let Some(flag) = backed.get_mut(&entry.key) {
                    *flag = true;
                }
            }
        }
        if backed.values().any(|found| !found) {
            return Err(InvariantError::new("lazy heap: live key without a heap entry"));
        }
        Ok(())
    }

    fn push_entry(&mut self, key: K, score: S) {
        let entry = HeapEntry {
            score,
            seq: self.seq,
            key,
        };
        self.seq = self.seq.wrapping_add(1);
        self.heap.push(Reverse(entry));
    }
}

impl<K, S> Default for LazyMinHeap<K, S>
where
    K: Eq + Hash + Clone,
    S: Ord + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lazy_heap_skips_stale_entries() {
        let mut heap = LazyMinHeap::new();
        heap.update(1u64, 5);
        heap.update(1, 2);
        heap.update(2, 3);

        assert_eq!(heap.pop_best(), Some((1, 2)));
        assert_eq!(heap.pop_best(), Some((2, 3)));
        assert_eq!(heap.pop_best(), None);
    }

    #[test]
    fn lazy_heap_remove_then_pop() {
        let mut heap = LazyMinHeap::new();
        heap.update(1u64, 2);
        heap.update(2, 1);
        assert_eq!(heap.remove(&2), Some(1));
        assert_eq!(heap.len(), 1);
        assert_eq!(heap.pop_best(), Some((1, 2)));
        assert_eq!(heap.pop_best(), None);
    }

    #[test]
    fn lazy_heap_tie_breaks_by_insertion() {
        let mut heap = LazyMinHeap::new();
        heap.update(10u64, 1);
        heap.update(20, 1);
        heap.update(30, 1);
        assert_eq!(heap.pop_best(), Some((10, 1)));
        assert_eq!(heap.pop_best(), Some((20, 1)));
        assert_eq!(heap.pop_best(), Some((30, 1)));
    }

    #[test]
    fn lazy_heap_reverse_score_pops_largest() {
        let mut heap: LazyMinHeap<u64, Reverse<usize>> = LazyMinHeap::new();
        heap.update(1, Reverse(4));
        heap.update(2, Reverse(9));
        heap.update(3, Reverse(6));
        heap.update(2, Reverse(5));
        assert_eq!(heap.pop_best(), Some((3, Reverse(6))));
        assert_eq!(heap.pop_best(), Some((2, Reverse(5))));
    }

    #[test]
    fn lazy_heap_rebuild_cleans_stale_entries() {
        let mut heap = LazyMinHeap::new();
        heap.update(1u64, 5);
        heap.update(1, 4);
        heap.update(1, 3);
        heap.update(2, 2);
        assert!(heap.heap_len() > heap.len());
        heap.check_invariants().unwrap();

        heap.rebuild();
        assert_eq!(heap.heap_len(), heap.len());
        assert_eq!(heap.pop_best(), Some((2, 2)));
        assert_eq!(heap.pop_best(), Some((1, 3)));
    }

    #[test]
    fn lazy_heap_clear_resets() {
        let mut heap = LazyMinHeap::new();
        heap.update(1u64, 1u32);
        heap.clear();
        assert!(heap.is_empty());
        assert_eq!(heap.heap_len(), 0);
        assert_eq!(heap.keys().count(), 0);
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[cfg_attr(miri, ignore)]
        #[test]
        fn prop_pops_in_score_order(updates in prop::collection::vec((0u64..32, 0u32..100), 0..200)) {
            let mut heap = LazyMinHeap::new();
            let mut model = std::collections::BTreeMap::new();
            for (k, s) in updates {
                heap.update(k, s);
                model.insert(k, s);
            }
            prop_assert!(heap.check_invariants().is_ok());

            let mut last = None;
            let mut popped = 0;
            while let Some((k, s)) = heap.pop_best() {
                prop_assert_eq!(model.get(&k), Some(&s));
                if let Some(prev) = last {
                    prop_assert!(prev <= s);
                }
                last = Some(s);
                popped += 1;
            }
            prop_assert_eq!(popped, model.len());
        }
    }
}
