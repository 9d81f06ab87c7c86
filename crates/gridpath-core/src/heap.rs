//! [`IndexedMinHeap`]: a binary min-heap over arena handles whose elements
//! remember their own heap slot.
//!
//! The heap stores only indices into a caller-owned arena (`&mut [T]`). Each
//! element records its current slot through [`HeapItem`], so a priority
//! decrease can sift the element up in O(log n) without searching for it.

use std::fmt;

/// An element that can live in an [`IndexedMinHeap`].
pub trait HeapItem {
    /// Ordering key; the smallest key is extracted first.
    type Key: Ord;

    fn key(&self) -> Self::Key;

    /// Current slot in the heap, `None` when not present.
    fn heap_slot(&self) -> Option<usize>;

    fn set_heap_slot(&mut self, slot: Option<usize>);
}

/// Precondition violations of the heap contract.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HeapError {
    /// Insertion past the fixed capacity.
    Full,
    /// Insertion of an element that is already present.
    AlreadyPresent,
    /// Update or removal of an element that is not present.
    NotPresent,
}

impl fmt::Display for HeapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Full => "capacity exceeded",
            Self::AlreadyPresent => "element already present",
            Self::NotPresent => "element not present",
        };
        f.write_str(s)
    }
}

impl std::error::Error for HeapError {}

/// Dense array-backed binary min-heap of arena handles.
#[derive(Clone, Debug, Default)]
pub struct IndexedMinHeap {
    items: Vec<usize>,
    capacity: usize,
}

impl IndexedMinHeap {
    /// Create an empty heap that never holds more than `capacity` elements.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            capacity,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Handle of the minimum element without removing it.
    #[inline]
    pub fn peek(&self) -> Option<usize> {
        self.items.first().copied()
    }

    /// Whether `handle` currently resides in this heap.
    pub fn contains<T: HeapItem>(&self, arena: &[T], handle: usize) -> bool {
        arena[handle]
            .heap_slot()
            .is_some_and(|slot| self.items.get(slot) == Some(&handle))
    }

    /// Append `handle` at the next free slot and sift it up.
    pub fn insert<T: HeapItem>(&mut self, arena: &mut [T], handle: usize) -> Result<(), HeapError> {
        if self.contains(arena, handle) {
            return Err(HeapError::AlreadyPresent);
        }
        if self.items.len() >= self.capacity {
            return Err(HeapError::Full);
        }
        let slot = self.items.len();
        self.items.push(handle);
        arena[handle].set_heap_slot(Some(slot));
        self.sift_up(arena, slot);
        Ok(())
    }

    /// Remove and return the handle with the smallest key.
    pub fn extract_min<T: HeapItem>(&mut self, arena: &mut [T]) -> Option<usize> {
        if self.items.is_empty() {
            return None;
        }
        let min = self.items.swap_remove(0);
        arena[min].set_heap_slot(None);
        if let Some(&moved) = self.items.first() {
            arena[moved].set_heap_slot(Some(0));
            self.sift_down(arena, 0);
        }
        Some(min)
    }

    /// Restore order after the key of `handle` was lowered externally.
    ///
    /// Keys must only ever decrease through this path; a single upward pass
    /// is all that is performed.
    pub fn decrease_key<T: HeapItem>(
        &mut self,
        arena: &mut [T],
        handle: usize,
    ) -> Result<(), HeapError> {
        let slot = self.slot_of(arena, handle)?;
        self.sift_up(arena, slot);
        Ok(())
    }

    /// Remove an arbitrary element, wherever it sits.
    pub fn remove<T: HeapItem>(&mut self, arena: &mut [T], handle: usize) -> Result<(), HeapError> {
        let slot = self.slot_of(arena, handle)?;
        self.items.swap_remove(slot);
        arena[handle].set_heap_slot(None);
        if let Some(&moved) = self.items.get(slot) {
            arena[moved].set_heap_slot(Some(slot));
            // The replacement may belong above or below its new slot.
            let slot = self.sift_up(arena, slot);
            self.sift_down(arena, slot);
        }
        Ok(())
    }

    /// Drop every element, clearing their slots.
    pub fn clear<T: HeapItem>(&mut self, arena: &mut [T]) {
        for &h in &self.items {
            arena[h].set_heap_slot(None);
        }
        self.items.clear();
    }

    /// Handles in slot order.
    pub fn as_slice(&self) -> &[usize] {
        &self.items
    }

    fn slot_of<T: HeapItem>(&self, arena: &[T], handle: usize) -> Result<usize, HeapError> {
        match arena[handle].heap_slot() {
            Some(slot) if self.items.get(slot) == Some(&handle) => Ok(slot),
            _ => Err(HeapError::NotPresent),
        }
    }

    /// Returns the slot the element settled in.
    fn sift_up<T: HeapItem>(&mut self, arena: &mut [T], mut slot: usize) -> usize {
        while slot > 0 {
            let parent = (slot - 1) / 2;
            if arena[self.items[slot]].key() < arena[self.items[parent]].key() {
                self.swap(arena, slot, parent);
                slot = parent;
            } else {
                break;
            }
        }
        slot
    }

    fn sift_down<T: HeapItem>(&mut self, arena: &mut [T], mut slot: usize) {
        loop {
            let left = slot * 2 + 1;
            let right = left + 1;
            if left >= self.items.len() {
                return;
            }
            let mut child = left;
            if right < self.items.len()
                && arena[self.items[right]].key() < arena[self.items[left]].key()
            {
                child = right;
            }
            if arena[self.items[child]].key() < arena[self.items[slot]].key() {
                self.swap(arena, slot, child);
                slot = child;
            } else {
                return;
            }
        }
    }

    fn swap<T: HeapItem>(&mut self, arena: &mut [T], a: usize, b: usize) {
        self.items.swap(a, b);
        arena[self.items[a]].set_heap_slot(Some(a));
        arena[self.items[b]].set_heap_slot(Some(b));
    }
}
