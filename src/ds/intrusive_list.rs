//! Doubly linked list backed by `SlotArena`.
//!
//! Nodes live in a `SlotArena` and link to each other by `SlotId`, so
//! handles stay valid while other nodes move or leave. Residency indexes store
//! the `SlotId` next to each address and splice nodes in O(1).
//!
//! ## Architecture
//!
//! ```text
//!   arena (SlotArena<Node<T>>)
//!   ┌────────┬─────────────────────────────────────────────┐
//!   │ SlotId │ Node { value, prev, next }                  │
//!   ├────────┼─────────────────────────────────────────────┤
//!   │ id_1   │ { value: 7,  prev: None,    next: id_2 }    │
//!   │ id_2   │ { value: 3,  prev: id_1,    next: id_3 }    │
//!   │ id_3   │ { value: 12, prev: id_2,    next: None }    │
//!   └────────┴─────────────────────────────────────────────┘
//!
//!   head (front, newest) ─► [id_1] ◄──► [id_2] ◄──► [id_3] ◄── tail (back, oldest)
//! ```
//!
//! ## Operations
//! - `push_front` / `push_back`, `pop_front` / `pop_back`
//! - `move_to_front(id)`: detach + attach at head
//! - `remove(id)`: detach + free slot
//! - `prev_id(id)` / `next_id(id)`: neighbour navigation for hand-based scans
//!
//! ## Performance
//! - All single-node operations: O(1)
//! - `iter`, `check_invariants`: O(n)
use rustc_hash::FxHashSet;

use crate::ds::slot_arena::{SlotArena, SlotId};
use crate::error::InvariantError;

#[derive(Debug, Clone)]
struct Node<T> {
    value: T,
    prev: Option<SlotId>,
    next: Option<SlotId>,
}

/// Linked list that stores nodes in a `SlotArena` and links them via `SlotId`.
#[derive(Debug, Clone)]
pub struct IntrusiveList<T> {
    arena: SlotArena<Node<T>>,
    head: Option<SlotId>,
    tail: Option<SlotId>,
}

impl<T> IntrusiveList<T> {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty list with reserved node capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            arena: SlotArena::with_capacity(capacity),
            head: None,
            tail: None,
        }
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Returns `true` if `id` is currently a node in this list.
    pub fn contains(&self, id: SlotId) -> bool {
        self.arena.contains(id)
    }

    /// Value at the front (head).
    pub fn front(&self) -> Option<&T> {
        self.head.and_then(|id| self.get(id))
    }

    pub fn front_id(&self) -> Option<SlotId> {
        self.head
    }

    /// Value at the back (tail).
    pub fn back(&self) -> Option<&T> {
        self.tail.and_then(|id| self.get(id))
    }

    pub fn back_id(&self) -> Option<SlotId> {
        self.tail
    }

    /// Neighbour of `id` toward the front, `None` at the head or for stale ids.
    pub fn prev_id(&self, id: SlotId) -> Option<SlotId> {
        self.arena.get(id).and_then(|node| node.prev)
    }

    /// Neighbour of `id` toward the back, `None` at the tail or for stale ids.
    pub fn next_id(&self, id: SlotId) -> Option<SlotId> {
        self.arena.get(id).and_then(|node| node.next)
    }

    /// Iterates values from front to back.
    pub fn iter(&self) -> IntrusiveListIter<'_, T> {
        IntrusiveListIter {
            list: self,
            current: self.head,
        }
    }

    /// Iterates node ids from front to back.
    pub fn iter_ids(&self) -> impl Iterator<Item = SlotId> + '_ {
        std::iter::successors(self.head, move |&id| self.next_id(id))
    }

    pub fn get(&self, id: SlotId) -> Option<&T> {
        self.arena.get(id).map(|node| &node.value)
    }

    pub fn get_mut(&mut self, id: SlotId) -> Option<&mut T> {
        self.arena.get_mut(id).map(|node| &mut node.value)
    }

    /// Inserts a new node at the front and returns its `SlotId`.
    pub fn push_front(&mut self, value: T) -> SlotId {
        let id = self.arena.insert(Node {
            value,
            prev: None,
            next: self.head,
        });
        match self.head {
            Some(head) => {
                if let Some(node) = self.arena.get_mut(head) {
                    node.prev = Some(id);
                }
            },
            None => self.tail = Some(id),
        }
        self.head = Some(id);
        id
    }

    /// Inserts a new node at the back and returns its `SlotId`.
    pub fn push_back(&mut self, value: T) -> SlotId {
        let id = self.arena.insert(Node {
            value,
            prev: self.tail,
            next: None,
        });
        match self.tail {
            Some(tail) => {
                if let Some(node) = self.arena.get_mut(tail) {
                    node.next = Some(id);
                }
            },
            None => self.head = Some(id),
        }
        self.tail = Some(id);
        id
    }

    /// Removes and returns the front value.
    pub fn pop_front(&mut self) -> Option<T> {
        let id = self.head?;
        self.remove(id)
    }

    /// Removes and returns the back value.
    pub fn pop_back(&mut self) -> Option<T> {
        let id = self.tail?;
        self.remove(id)
    }

    /// Removes the node `id` from the list and returns its value.
    pub fn remove(&mut self, id: SlotId) -> Option<T> {
        self.detach(id)?;
        self.arena.remove(id).map(|node| node.value)
    }

    /// Moves an existing node to the front; returns `false` if `id` is not present.
    pub fn move_to_front(&mut self, id: SlotId) -> bool {
        if !self.arena.contains(id) {
            return false;
        }
        if Some(id) != self.head {
            self.detach(id);
            self.attach_front(id);
        }
        true
    }

    /// Clears the list and frees all nodes.
    pub fn clear(&mut self) {
        self.arena.clear();
        self.head = None;
        self.tail = None;
    }

    fn detach(&mut self, id: SlotId) -> Option<()> {
        let (prev, next) = {
            let node = self.arena.get(id)?;
            (node.prev, node.next)
        };

        match prev {
            Some(prev_id) => {
                if let Some(prev_node) = self.arena.get_mut(prev_id) {
                    prev_node.next = next;
                }
            },
            None => self.head = next,
        }

        match next {
            Some(next_id) => {
                if let Some(next_node) = self.arena.get_mut(next_id) {
                    next_node.prev = prev;
                }
            },
            None => self.tail = prev,
        }

        if let Some(node) = self.arena.get_mut(id) {
            node.prev = None;
            node.next = None;
        }
        Some(())
    }

    fn attach_front(&mut self, id: SlotId) {
        let old_head = self.head;
        match self.arena.get_mut(id) {
            Some(node) => {
                node.prev = None;
                node.next = old_head;
            },
            None => return,
        }
        match old_head {
            Some(old_head) => {
                if let Some(head_node) = self.arena.get_mut(old_head) {
                    head_node.prev = Some(id);
                }
            },
            None => self.tail = Some(id),
        }
        self.head = Some(id);
    }

    /// Walks the links and checks they agree with the arena.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        if self.head.is_none() || self.tail.is_none() {
            if self.head.is_some() || self.tail.is_some() || !self.is_empty() {
                return Err(InvariantError::new("list: head/tail disagree on emptiness"));
            }
            return Ok(());
        }

        let mut seen = FxHashSet::default();
        let mut current = self.head;
        let mut prev = None;
        while let Some(id) = current {
            if !seen.insert(id) {
                return Err(InvariantError::new("list: cycle detected"));
            }
            let node = self
                .arena
                .get(id)
                .ok_or_else(|| InvariantError::new("list: link to freed slot"))?;
            if node.prev != prev {
                return Err(InvariantError::new("list: prev link mismatch"));
            }
            if node.next.is_none() && self.tail != Some(id) {
                return Err(InvariantError::new("list: tail does not end the chain"));
            }
            prev = Some(id);
            current = node.next;
        }

        if seen.len() != self.len() || self.arena.occupied() != self.len() {
            return Err(InvariantError::new(format!(
                "list: reachable {} != len {}",
                seen.len(),
                self.len()
            )));
        }
        Ok(())
    }
}

/// Iterator over values from front to back.
pub struct IntrusiveListIter<'a, T> {
    list: &'a IntrusiveList<T>,
    current: Option<SlotId>,
}

impl<'a, T> Iterator for IntrusiveListIter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        let node = self.list.arena.get(id)?;
        self.current = node.next;
        Some(&node.value)
    }
}

impl<T> Default for IntrusiveList<T> {
    fn default() -> Self {
        Self::new()
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::VecDeque;

    #[derive(Debug, Clone)]
    enum Op {
        PushFront(u64),
        PushBack(u64),
        PopFront,
        PopBack,
        MoveToFront(usize),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            any::<u64>().prop_map(Op::PushFront),
            any::<u64>().prop_map(Op::PushBack),
            Just(Op::PopFront),
            Just(Op::PopBack),
            (0usize..16).prop_map(Op::MoveToFront),
        ]
    }

    proptest! {
        #[cfg_attr(miri, ignore)]
        #[test]
        fn prop_matches_vecdeque_model(ops in prop::collection::vec(op(), 0..200)) {
            let mut list = IntrusiveList::new();
            let mut model: VecDeque<u64> = VecDeque::new();

            for op in ops {
                match op {
                    Op::PushFront(v) => {
                        list.push_front(v);
                        model.push_front(v);
                    },
                    Op::PushBack(v) => {
                        list.push_back(v);
                        model.push_back(v);
                    },
                    Op::PopFront => prop_assert_eq!(list.pop_front(), model.pop_front()),
                    Op::PopBack => prop_assert_eq!(list.pop_back(), model.pop_back()),
                    Op::MoveToFront(i) => {
                        let picked = list.iter_ids().nth(i);
                        if let Some(id) = picked {
                            list.move_to_front(id);
                            if let Some(v) = model.remove(i) {
                                model.push_front(v);
                            }
                        }
                    },
                }
                prop_assert!(list.check_invariants().is_ok());
            }
            prop_assert_eq!(list.iter().copied().collect::<Vec<_>>(), model.into_iter().collect::<Vec<_>>());
        }
    }
}
