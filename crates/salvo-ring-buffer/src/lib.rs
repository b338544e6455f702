//! Salvo Ring Buffer - Fixed-capacity storage for replicated events
//!
//! This crate provides the per-entity event buffer written by the
//! authoritative simulation and read by every observer.
//!
//! # Features
//!
//! - **Bounded memory**: Fixed number of slots, allocated once
//! - **O(1) insertion**: A write lands at `count % capacity`
//! - **Monotonic counter**: Every event gets a unique, ordered logical index
//! - **Snapshots**: Cheap immutable views for confirmed and predicted state
//!
//! # Bounded loss
//!
//! A write never checks whether the slot it overwrites was observed. An
//! observer that falls more than `capacity` events behind permanently loses
//! the oldest unseen events. Size the capacity so that
//! `capacity >= max events per second * max observer lag in seconds`.
//!
//! # Example
//!
//! ```rust
//! use salvo_core::EventRecord;
//! use salvo_ring_buffer::{EventRing, LogicalIndex};
//!
//! #[derive(Debug, Clone, Copy, Default, PartialEq)]
//! struct Shot(u8);
//!
//! impl EventRecord for Shot {
//!     fn kind(&self) -> u8 {
//!         self.0
//!     }
//! }
//!
//! let mut ring = EventRing::new(4);
//! for k in 0..6 {
//!     ring.push(Shot(k));
//! }
//!
//! // Indices 0 and 1 were overwritten by 4 and 5
//! assert_eq!(ring.count(), 6);
//! assert!(ring.get(LogicalIndex(1)).is_none());
//! assert_eq!(ring.get(LogicalIndex(5)), Some(&Shot(5)));
//!
//! let view = ring.snapshot();
//! assert_eq!(view.oldest_visible(), 2);
//! ```

use salvo_core::EventRecord;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

/// Value of the write counter when an event was appended
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct LogicalIndex(pub u64);

impl LogicalIndex {
    /// Physical slot this index maps to in a buffer of `capacity`
    pub fn slot(self, capacity: usize) -> usize {
        (self.0 % capacity as u64) as usize
    }

    /// The next index
    pub fn next(self) -> Self {
        LogicalIndex(self.0 + 1)
    }
}

impl fmt::Display for LogicalIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lowest index still resolvable in a buffer with `count` writes
fn oldest_visible(count: u64, capacity: usize) -> u64 {
    count.saturating_sub(capacity as u64)
}

/// Fixed-capacity ring of event records with a monotonic write counter
///
/// Owned and mutated by the authoritative side only. Observers read
/// [`RingView`] snapshots.
#[derive(Debug, Clone)]
pub struct EventRing<T> {
    /// Slot storage, `Default` for never-written slots
    slots: Vec<T>,
    /// Total number of writes ever made
    count: u64,
}

impl<T: EventRecord> EventRing<T> {
    /// Create a new ring with the given capacity
    ///
    /// # Arguments
    ///
    /// * `capacity` - Number of slots (typically 32-128)
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Capacity must be greater than 0");
        Self {
            slots: vec![T::default(); capacity],
            count: 0,
        }
    }

    /// Number of slots
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of writes ever made; the logical index of the next write
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Physical slot of a logical index
    pub fn slot_of(&self, index: LogicalIndex) -> usize {
        index.slot(self.capacity())
    }

    /// Append a record, overwriting whatever occupied its slot
    pub fn push(&mut self, record: T) -> LogicalIndex {
        let index = LogicalIndex(self.count);
        let slot = self.slot_of(index);
        self.slots[slot] = record;
        self.count += 1;
        index
    }

    /// Record stored in a physical slot
    pub fn slot(&self, slot: usize) -> &T {
        &self.slots[slot]
    }

    /// Replace the record stored in a physical slot
    pub fn set_slot(&mut self, slot: usize, record: T) {
        self.slots[slot] = record;
    }

    /// All slots in physical order
    pub fn slots(&self) -> &[T] {
        &self.slots
    }

    /// Mutable access to every slot in physical order
    pub fn slots_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.slots.iter_mut()
    }

    /// Record for a logical index, if it has not been overwritten
    pub fn get(&self, index: LogicalIndex) -> Option<&T> {
        if self.window().contains(&index.0) {
            Some(&self.slots[self.slot_of(index)])
        } else {
            None
        }
    }

    /// Lowest logical index that still has its record
    pub fn oldest_visible(&self) -> u64 {
        oldest_visible(self.count, self.capacity())
    }

    /// Range of logical indices currently readable
    pub fn window(&self) -> Range<u64> {
        self.oldest_visible()..self.count
    }

    /// Take an immutable snapshot of the current contents
    pub fn snapshot(&self) -> RingView<T> {
        RingView {
            slots: Arc::from(self.slots.as_slice()),
            count: self.count,
        }
    }

    /// Get statistics about the ring
    pub fn stats(&self) -> RingStats {
        RingStats {
            capacity: self.capacity(),
            count: self.count,
            oldest_visible: self.oldest_visible(),
        }
    }
}

/// Immutable copy of a ring at one point in time
///
/// Cloning a view shares its storage. Confirmed and predicted state are two
/// independent views, never a shared cursor.
#[derive(Debug, Clone)]
pub struct RingView<T> {
    slots: Arc<[T]>,
    count: u64,
}

impl<T: EventRecord> RingView<T> {
    /// Build a view from replicated parts
    ///
    /// Returns `None` for an empty slot list.
    pub fn from_parts(slots: Vec<T>, count: u64) -> Option<Self> {
        if slots.is_empty() {
            return None;
        }
        Some(Self {
            slots: Arc::from(slots),
            count,
        })
    }

    /// Number of slots
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Write count at this view's horizon
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Record stored in a physical slot
    pub fn slot(&self, slot: usize) -> &T {
        &self.slots[slot]
    }

    /// Record in the slot `index` maps to, without a window check
    ///
    /// The slot may hold a newer event than `index`.
    pub fn at(&self, index: LogicalIndex) -> &T {
        &self.slots[index.slot(self.capacity())]
    }

    /// Record for a logical index, if this view still holds it
    pub fn get(&self, index: LogicalIndex) -> Option<&T> {
        if self.window().contains(&index.0) {
            Some(self.at(index))
        } else {
            None
        }
    }

    /// Lowest logical index still resolvable from this view
    pub fn oldest_visible(&self) -> u64 {
        oldest_visible(self.count, self.capacity())
    }

    /// Range of logical indices readable from this view
    pub fn window(&self) -> Range<u64> {
        self.oldest_visible()..self.count
    }

    /// All slots in physical order
    pub fn slots(&self) -> &[T] {
        &self.slots
    }
}

/// Statistics about an event ring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingStats {
    /// Number of slots
    pub capacity: usize,
    /// Total writes
    pub count: u64,
    /// Lowest logical index still readable
    pub oldest_visible: u64,
}

impl RingStats {
    /// Number of slots that have been written at least once
    pub fn written_slots(&self) -> usize {
        self.count.min(self.capacity as u64) as usize
    }

    /// Number of events that have been overwritten
    pub fn overwritten(&self) -> u64 {
        self.oldest_visible
    }

    /// Get the fill percentage (0.0 to 1.0)
    pub fn fill_ratio(&self) -> f32 {
        self.written_slots() as f32 / self.capacity as f32
    }
}
