//! Fixed-capacity circular buffer with a sentinel gap.
//!
//! Backs FIFO and the CLOCK family. `capacity + 1` slots are allocated so
//! that `in == out` always means empty and `(in + 1) % n == out` always means
//! full, without a separate length field.
//!
//! ## Architecture
//!
//! ```text
//!   capacity = 4, n = 5 physical slots
//!
//!        out                  in
//!         │                   │
//!         ▼                   ▼
//!   ┌─────┬─────┬─────┬─────┬─────┐
//!   │  a  │  b  │  c  │  d  │ gap │     full: (in + 1) % n == out
//!   └─────┴─────┴─────┴─────┴─────┘
//!   offset 0     1     2     3          logical offsets count from `out`
//!
//!   pop_front():  read slots[out], out = (out + 1) % n
//!   push_back(x): slots[in] = x,   in  = (in + 1) % n
//!   replace(k, x): overwrite the slot at logical offset k in place
//! ```
//!
//! ## Performance
//! - `push_back` / `pop_front` / `get` / `replace`: O(1)
//! - `iter_newest_first`: O(len)
use crate::error::InvariantError;

/// Circular buffer of `capacity` usable slots plus one sentinel slot.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    slots: Vec<T>,
    head_in: usize,
    head_out: usize,
}

impl<T> RingBuffer<T>
where
    T: Copy + Default,
{
    /// Creates an empty buffer holding at most `capacity` items.
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![T::default(); capacity + 1],
            head_in: 0,
            head_out: 0,
        }
    }

    /// Maximum number of items.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len() - 1
    }

    #[inline]
    pub fn len(&self) -> usize {
        let n = self.slots.len();
        (self.head_in + n - self.head_out) % n
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.head_in == self.head_out
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        (self.head_in + 1) % self.slots.len() == self.head_out
    }

    /// Physical slot of logical offset `offset` (0 = oldest).
    #[inline]
    pub fn phys(&self, offset: usize) -> usize {
        (self.head_out + offset) % self.slots.len()
    }

    /// Appends at the back. Returns the physical slot written, or `None` if full.
    pub fn push_back(&mut self, value: T) -> Option<usize> {
        if self.is_full() {
            return None;
        }
        let slot = self.head_in;
        self.slots[slot] = value;
        self.head_in = (self.head_in + 1) % self.slots.len();
        Some(slot)
    }

    /// Removes and returns the oldest item.
    pub fn pop_front(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let value = self.slots[self.head_out];
        self.head_out = (self.head_out + 1) % self.slots.len();
        Some(value)
    }

    /// Item at logical offset `offset`, if within `len()`.
    pub fn get(&self, offset: usize) -> Option<&T> {
        if offset >= self.len() {
            return None;
        }
        self.slots.get(self.phys(offset))
    }

    /// Overwrites the item at logical offset `offset`, returning the old one.
    pub fn replace(&mut self, offset: usize, value: T) -> Option<T> {
        if offset >= self.len() {
            return None;
        }
        let slot = self.phys(offset);
        Some(std::mem::replace(&mut self.slots[slot], value))
    }

    /// Items from the most recently pushed to the oldest.
    pub fn iter_newest_first(&self) -> impl Iterator<Item = &T> + '_ {
        let len = self.len();
        (0..len).rev().filter_map(move |offset| self.slots.get(self.phys(offset)))
    }

    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        let n = self.slots.len();
        if self.head_in >= n || self.head_out >= n {
            return Err(InvariantError::new(format!(
                "ring buffer: in={} out={} outside {} slots",
                self.head_in, self.head_out, n
            )));
        }
        if self.len() > self.capacity() {
            return Err(InvariantError::new("ring buffer: length exceeds capacity"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_buffer_fills_and_reports_full() {
        let mut ring: RingBuffer<u64> = RingBuffer::new(3);
        assert!(ring.is_empty());
        assert_eq!(ring.capacity(), 3);
        assert_eq!(ring.push_back(1), Some(0));
        assert_eq!(ring.push_back(2), Some(1));
        assert_eq!(ring.push_back(3), Some(2));
        assert!(ring.is_full());
        assert_eq!(ring.push_back(4), None);
        assert_eq!(ring.len(), 3);
    }

    #[test]
    fn ring_buffer_fifo_order_across_wrap() {
        let mut ring: RingBuffer<u64> = RingBuffer::new(2);
        ring.push_back(1);
        ring.push_back(2);
        for next in 3..10 {
            let oldest = ring.pop_front();
            assert_eq!(oldest, Some(next - 2));
            ring.push_back(next);
            ring.check_invariants().unwrap();
        }
        assert_eq!(ring.iter_newest_first().copied().collect::<Vec<_>>(), vec![9, 8]);
    }

    #[test]
    fn ring_buffer_logical_offsets_start_at_oldest() {
        let mut ring: RingBuffer<u64> = RingBuffer::new(3);
        for v in [10, 20, 30] {
            ring.push_back(v);
        }
        ring.pop_front();
        ring.push_back(40);
        assert_eq!(ring.get(0), Some(&20));
        assert_eq!(ring.get(2), Some(&40));
        assert_eq!(ring.get(3), None);

        assert_eq!(ring.replace(1, 35), Some(30));
        assert_eq!(ring.iter_newest_first().copied().collect::<Vec<_>>(), vec![40, 35, 20]);
    }

    #[test]
    fn ring_buffer_pop_empty() {
        let mut ring: RingBuffer<u64> = RingBuffer::new(1);
        assert_eq!(ring.pop_front(), None);
        assert_eq!(ring.replace(0, 1), None);
    }
}
