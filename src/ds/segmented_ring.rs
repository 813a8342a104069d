//! Several circular lists packed into one slot array.
//!
//! Multi-list FIFO variants keep K lists of fixed sizes. Each list is a
//! contiguous segment of `cells` with its own rotating head, so "insert at
//! the front and push everything back one place" is a single head decrement
//! plus one write, not a shift.
//!
//! ## Architecture
//!
//! ```text
//!   sizes   = [3, 2]
//!   offsets = [0, 3, 5]
//!
//!   cells:  ┌─────┬─────┬─────┐┌─────┬─────┐
//!           │  a  │  b  │  c  ││  x  │  y  │
//!           └─────┴─────┴─────┘└─────┴─────┘
//!             list 0 (head=1)    list 1 (head=0)
//!
//!   list 0 logical order (front→back): b, c, a
//!     logical_pos(list, slot) = (slot - offset - head + m) % m
//!     phys_slot(list, pos)    = offset + (head + pos) % m
//!
//!   push_front(0, n): head = (head - 1 + m) % m, overwrite that slot,
//!                     return what was there (the old logical tail)
//! ```
//!
//! The ring also owns the residency index (`address → slot`), so every
//! cell write keeps both directions in agreement.
//!
//! ## Performance
//! - `push_front`, `replace`, `slot_of`: O(1)
//! - `list_of_slot`: O(log K)
//! - `shift_back_into_front(list, pos, _)`: O(pos)
use crate::ds::address_table::{AddressTable, TableMode};
use crate::error::{InvariantError, SimError};

/// K fixed-size circular lists sharing one slot array, plus the address index.
#[derive(Debug, Clone)]
pub struct SegmentedRing {
    sizes: Vec<usize>,
    offsets: Vec<usize>,
    heads: Vec<usize>,
    cells: Vec<Option<u64>>,
    index: AddressTable<Option<usize>>,
    occupied: usize,
}

impl SegmentedRing {
    /// Lays out one list per entry of `sizes`.
    ///
    /// Fails with [`SimError::InvalidConfiguration`] if `sizes` is empty or
    /// contains a zero.
    pub fn new(sizes: &[usize], mode: TableMode) -> Result<Self, SimError> {
        if sizes.is_empty() {
            return Err(SimError::config("list sizes must name at least one list"));
        }
        if let Some(i) = sizes.iter().position(|&m| m == 0) {
            return Err(SimError::config(format!("list {i} has size 0; sizes must be >= 1")));
        }

        let mut offsets = Vec::with_capacity(sizes.len() + 1);
        offsets.push(0);
        for &m in sizes {
            let last = offsets.last().copied().unwrap_or(0);
            offsets.push(last + m);
        }
        let total = offsets.last().copied().unwrap_or(0);

        Ok(Self {
            sizes: sizes.to_vec(),
            offsets,
            heads: vec![0; sizes.len()],
            cells: vec![None; total],
            index: AddressTable::with_mode(mode),
            occupied: 0,
        })
    }

    /// Number of lists.
    pub fn list_count(&self) -> usize {
        self.sizes.len()
    }

    pub fn list_size(&self, list: usize) -> usize {
        self.sizes[list]
    }

    pub fn sizes(&self) -> &[usize] {
        &self.sizes
    }

    /// Total slots across all lists.
    pub fn total_slots(&self) -> usize {
        self.cells.len()
    }

    /// Occupied slots.
    pub fn len(&self) -> usize {
        self.occupied
    }

    pub fn is_empty(&self) -> bool {
        self.occupied == 0
    }

    /// Physical slot currently holding `addr`.
    #[inline]
    pub fn slot_of(&self, addr: u64) -> Option<usize> {
        *self.index.get(addr)
    }

    /// Occupant of physical slot `slot`.
    #[inline]
    pub fn get(&self, slot: usize) -> Option<u64> {
        self.cells.get(slot).copied().flatten()
    }

    /// List owning physical slot `slot`.
    #[inline]
    pub fn list_of_slot(&self, slot: usize) -> usize {
        self.offsets
            .partition_point(|&offset| offset <= slot)
            .saturating_sub(1)
    }

    /// Logical position (0 = front) of physical slot `slot` inside `list`.
    #[inline]
    pub fn logical_pos(&self, list: usize, slot: usize) -> usize {
        let m = self.sizes[list];
        let phys = slot - self.offsets[list];
        (phys + m - self.heads[list]) % m
    }

    /// Physical slot of logical position `pos` inside `list`.
    #[inline]
    pub fn phys_slot(&self, list: usize, pos: usize) -> usize {
        let m = self.sizes[list];
        self.offsets[list] + (self.heads[list] + pos) % m
    }

    /// Inserts `addr` at the front of `list`, pushing every item back one
    /// position. Returns the item that fell off the back, now unindexed.
    pub fn push_front(&mut self, list: usize, addr: u64) -> Option<u64> {
        let m = self.sizes[list];
        let new_head = (self.heads[list] + m - 1) % m;
        self.heads[list] = new_head;
        let slot = self.offsets[list] + new_head;
        self.replace(slot, Some(addr))
    }

    /// Moves logical positions `0..pos` of `list` back by one place and
    /// writes `item` at position 0. The previous occupant of `pos` is
    /// overwritten.
    pub fn shift_back_into_front(&mut self, list: usize, pos: usize, item: Option<u64>) {
        for t in (1..=pos).rev() {
            let dst = self.phys_slot(list, t);
            let src = self.phys_slot(list, t - 1);
            let moved = self.cells[src];
            self.replace(dst, moved);
        }
        let front = self.phys_slot(list, 0);
        self.replace(front, item);
    }

    /// Writes `item` into physical slot `slot` and returns the old occupant.
    ///
    /// The old occupant loses its index entry only if that entry still
    /// points at `slot`; an item already rewritten elsewhere keeps its place.
    pub fn replace(&mut self, slot: usize, item: Option<u64>) -> Option<u64> {
        let old = std::mem::replace(&mut self.cells[slot], item);
        if let Some(prev) = old {
            if self.slot_of(prev) == Some(slot) {
                self.index.reset(prev);
            }
            self.occupied -= 1;
        }
        if let Some(addr) = item {
            self.index.set(addr, Some(slot));
            self.occupied += 1;
        }
        old
    }

    /// Occupants of `list` from front to back, skipping empty slots.
    pub fn list_contents(&self, list: usize) -> impl Iterator<Item = u64> + '_ {
        (0..self.sizes[list]).filter_map(move |pos| self.get(self.phys_slot(list, pos)))
    }

    /// Occupants of every list, list 0 first.
    pub fn contents(&self) -> Vec<u64> {
        (0..self.list_count())
            .flat_map(|list| self.list_contents(list))
            .collect()
    }

    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        for (list, (&head, &m)) in self.heads.iter().zip(&self.sizes).enumerate() {
            if head >= m {
                return Err(InvariantError::new(format!(
                    "segmented ring: list {list} head {head} outside size {m}"
                )));
            }
        }

        let mut counted = 0;
        for (slot, cell) in self.cells.iter().enumerate() {
            if let Some(addr) = *cell {
                counted += 1;
                if self.slot_of(addr) != Some(slot) {
                    return Err(InvariantError::new(format!(
                        "segmented ring: slot {slot} holds {addr} but index says {:?}",
                        self.slot_of(addr)
                    )));
                }
            }
        }
        if counted != self.occupied {
            return Err(InvariantError::new(format!(
                "segmented ring: {counted} occupied cells, counter says {}",
                self.occupied
            )));
        }

        for (addr, slot) in self.index.iter_set() {
            let Some(slot) = *slot else { continue };
            if self.get(slot) != Some(addr) {
                return Err(InvariantError::new(format!(
                    "segmented ring: index maps {addr} to slot {slot} holding {:?}",
                    self.get(slot)
                )));
            }
        }
        Ok(())
    }
}
