//! Core fixed-capacity ring buffer.
//!
//! This is the storage half of [`BoundedQueue`](crate::BoundedQueue): a circular
//! array of slots with a read cursor (`head`), a write cursor (`tail`) and an
//! occupied-slot count (`len`). It is not thread-safe on its own; the queue keeps
//! it behind a single mutex and every method here assumes exclusive access.
//!
//! # Layout
//!
//! ```text
//!            head              tail
//!             v                 v
//! ┌──────┬──────┬──────┬──────┬──────┬──────┐
//! │ None │  a   │  b   │  c   │ None │ None │   len = 3
//! └──────┴──────┴──────┴──────┴──────┴──────┘
//! ```
//!
//! When `len == capacity` the cursors coincide exactly as they do when
//! `len == 0`, so `len` is the only thing consulted for full/empty.

use std::num::NonZeroUsize;

/// Circular storage for up to `capacity` items.
pub(crate) struct Ring<T> {
    slots: Box<[Option<T>]>,

    /// Next slot to read.
    head: usize,

    /// Next slot to write.
    tail: usize,

    /// Occupied slots, `0..=capacity`.
    len: usize,
}

impl<T> Ring<T> {
    pub(crate) fn new(capacity: NonZeroUsize) -> Self {
        let slots = std::iter::repeat_with(|| None)
            .take(capacity.get())
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self {
            slots,
            head: 0,
            tail: 0,
            len: 0,
        }
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub(crate) fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    /// Writes `item` at `tail` and advances it.
    ///
    /// # Errors
    ///
    /// Returns `Err(item)` if every slot is occupied.
    pub(crate) fn push(&mut self, item: T) -> Result<(), T> {
        if self.is_full() {
            return Err(item);
        }

        let slot = &mut self.slots[self.tail];
        debug_assert!(slot.is_none(), "write cursor points at a live slot");
        *slot = Some(item);
        self.tail = self.advance(self.tail);
        self.len += 1;

        self.debug_check();
        Ok(())
    }

    /// Removes the item at `head` and advances it.
    ///
    /// The slot is left empty, so the ring keeps no reference to a delivered item.
    pub(crate) fn pop(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }

        let item = self.slots[self.head].take();
        debug_assert!(item.is_some(), "read cursor points at an empty slot");
        self.head = self.advance(self.head);
        self.len -= 1;

        self.debug_check();
        item
    }

    /// Buffered items from `head` to `tail`.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        (0..self.len).filter_map(move |offset| {
            self.slots[(self.head + offset) % self.capacity()].as_ref()
        })
    }

    #[inline]
    fn advance(&self, index: usize) -> usize {
        (index + 1) % self.capacity()
    }

    /// Verifies the cursor/count invariants after a mutation.
    ///
    /// O(1) in debug builds; the full slot scan only runs under test.
    fn debug_check(&self) {
        let capacity = self.capacity();
        debug_assert!(self.len <= capacity);
        debug_assert!(self.head < capacity && self.tail < capacity);
        debug_assert_eq!((self.head + self.len) % capacity, self.tail);

        #[cfg(test)]
        {
            let live = self.slots.iter().filter(|slot| slot.is_some()).count();
            assert_eq!(live, self.len, "occupied slots disagree with len");
        }
    }
}
