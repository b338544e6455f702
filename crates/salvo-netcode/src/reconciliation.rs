//! Per-frame visual reconciliation
//!
//! Keeps an observer's local visuals consistent with a replicated event
//! buffer that is smaller than the event history. Each pass:
//!
//! 1. **Sync** - diff the confirmed count against the count seen last frame,
//!    retiring entries above the new count and creating entries for new
//!    indices.
//! 2. **Render** - render every entry from both views while its slot is still
//!    trusted, otherwise freeze it on the data it last rendered with.
//! 3. **Cleanup** - drop entries whose visual reports completion.

use crate::SnapshotPair;
use indexmap::IndexMap;
use salvo_core::EventRecord;
use salvo_ring_buffer::{LogicalIndex, RingView};
use std::fmt::Debug;
use tracing::warn;

/// Creates, renders and destroys presentation instances for records
pub trait VisualBinding<T> {
    /// Handle to one live presentation instance
    type Handle: Copy + Debug;

    /// Create and activate an instance for a newly observed event
    ///
    /// Returns `None` when the record's kind has no presentation.
    fn spawn(&mut self, record: &T) -> Option<Self::Handle>;

    /// Render one frame; returns whether the instance is still active
    fn render(&mut self, handle: Self::Handle, confirmed: &T, predicted: &T, alpha: f32) -> bool;

    /// Deactivate an instance and release it to its factory
    fn despawn(&mut self, handle: Self::Handle);
}

/// A live visual bound to one logical index
#[derive(Debug, Clone)]
pub struct VisualEntry<T, H> {
    /// Presentation instance
    pub handle: H,
    /// Data the instance last rendered with, used once the slot is untrusted
    pub last: T,
    /// Result of the instance's most recent render
    pub active: bool,
}

/// Counters for one reconciliation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    /// Entries created by the sync step
    pub created: usize,
    /// Entries retired because the confirmed count went backwards
    pub removed: usize,
    /// Entries rendered from cached data
    pub frozen: usize,
    /// Entries dropped because their visual completed
    pub finished: usize,
    /// Indices overwritten before this observer could see them
    pub lost: u64,
}

/// Observer-local reconciliation engine for one entity's buffer
///
/// Generic over record type `T` and presentation handle `H`.
#[derive(Debug)]
pub struct VisualReconciler<T, H> {
    /// Live entries keyed by logical index, in creation order
    entries: IndexMap<LogicalIndex, VisualEntry<T, H>>,
    /// Confirmed count seen by the previous pass
    observed_count: u64,
}

impl<T: EventRecord, H: Copy + Debug> VisualReconciler<T, H> {
    /// Create an engine that treats `observed_count` events as already seen
    ///
    /// An observer joining late passes the buffer's current count so that
    /// events fired before it arrived are not replayed.
    pub fn new(observed_count: u64) -> Self {
        Self {
            entries: IndexMap::new(),
            observed_count,
        }
    }

    /// Run a full pass: sync, render, cleanup
    pub fn reconcile<B>(&mut self, views: &SnapshotPair<T>, binding: &mut B) -> ReconcileStats
    where
        B: VisualBinding<T, Handle = H>,
    {
        let mut stats = self.sync(&views.confirmed, binding);
        stats.frozen = self.render(views, binding);
        stats.finished = self.cleanup(binding);
        self.observed_count = views.confirmed.count();
        stats
    }

    /// Create and retire entries so they match the confirmed count
    ///
    /// Does not update the observed count; [`reconcile`](Self::reconcile)
    /// does that once the whole pass has run.
    pub fn sync<B>(&mut self, confirmed: &RingView<T>, binding: &mut B) -> ReconcileStats
    where
        B: VisualBinding<T, Handle = H>,
    {
        let mut stats = ReconcileStats::default();
        let count = confirmed.count();
        let prev = self.observed_count;

        // Indices in [count, prev) were rolled back or reset
        if count < prev {
            let retired: Vec<LogicalIndex> = self
                .entries
                .keys()
                .filter(|index| index.0 >= count)
                .copied()
                .collect();
            for index in retired {
                if let Some(entry) = self.entries.shift_remove(&index) {
                    binding.despawn(entry.handle);
                    stats.removed += 1;
                }
            }
        }

        // Indices in [prev, count) are new; the oldest may already be overwritten
        if count > prev {
            let first = prev.max(confirmed.oldest_visible());
            stats.lost = first - prev;
            if stats.lost > 0 {
                warn!(
                    lost = stats.lost,
                    observed = prev,
                    confirmed = count,
                    capacity = confirmed.capacity(),
                    "events overwritten before this observer saw them"
                );
            }

            for i in first..count {
                let index = LogicalIndex(i);
                let record = *confirmed.at(index);
                let Some(handle) = binding.spawn(&record) else {
                    continue;
                };
                let entry = VisualEntry {
                    handle,
                    last: record,
                    active: true,
                };
                if let Some(stale) = self.entries.insert(index, entry) {
                    binding.despawn(stale.handle);
                }
                stats.created += 1;
            }
        }

        stats
    }

    /// Render every entry; returns how many rendered from cached data
    pub fn render<B>(&mut self, views: &SnapshotPair<T>, binding: &mut B) -> usize
    where
        B: VisualBinding<T, Handle = H>,
    {
        let min_visible = views.min_visible();
        let mut frozen = 0;

        for (index, entry) in self.entries.iter_mut() {
            if index.0 >= min_visible {
                let confirmed = *views.confirmed.at(*index);
                let predicted = *views.predicted.at(*index);
                entry.active = binding.render(entry.handle, &confirmed, &predicted, views.alpha);
                entry.last = predicted;
            } else {
                // The slot now belongs to a newer event
                let last = entry.last;
                entry.active = binding.render(entry.handle, &last, &last, 0.0);
                frozen += 1;
            }
        }

        frozen
    }

    /// Drop entries whose visual completed; returns how many were dropped
    pub fn cleanup<B>(&mut self, binding: &mut B) -> usize
    where
        B: VisualBinding<T, Handle = H>,
    {
        let finished: Vec<LogicalIndex> = self
            .entries
            .iter()
            .filter(|(_, entry)| !entry.active || entry.last.is_finished())
            .map(|(index, _)| *index)
            .collect();

        for index in &finished {
            if let Some(entry) = self.entries.shift_remove(index) {
                binding.despawn(entry.handle);
            }
        }

        finished.len()
    }

    /// Destroy every entry, e.g. when the owning entity is gone
    pub fn teardown<B>(&mut self, binding: &mut B) -> usize
    where
        B: VisualBinding<T, Handle = H>,
    {
        let removed = self.entries.len();
        for (_, entry) in self.entries.drain(..) {
            binding.despawn(entry.handle);
        }
        removed
    }

    /// Confirmed count seen by the previous pass
    pub fn observed_count(&self) -> u64 {
        self.observed_count
    }

    /// Entry for a logical index
    pub fn entry(&self, index: LogicalIndex) -> Option<&VisualEntry<T, H>> {
        self.entries.get(&index)
    }

    /// Whether a logical index has a live entry
    pub fn contains(&self, index: LogicalIndex) -> bool {
        self.entries.contains_key(&index)
    }

    /// Logical indices with live entries, in creation order
    pub fn indices(&self) -> impl Iterator<Item = LogicalIndex> + '_ {
        self.entries.keys().copied()
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use salvo_ring_buffer::EventRing;

    #[derive(Debug, Clone, Copy, Default, PartialEq)]
    struct Rec {
        kind: u8,
        tag: u64,
        finished: bool,
    }

    impl EventRecord for Rec {
        fn kind(&self) -> u8 {
            self.kind
        }

        fn is_finished(&self) -> bool {
            self.finished
        }
    }

    fn rec(tag: u64) -> Rec {
        Rec {
            kind: 0,
            tag,
            finished: false,
        }
    }

    /// Binding that records every call
    #[derive(Default)]
    struct Recorder {
        next: u32,
        spawned: Vec<(u32, u64)>,
        rendered: Vec<(u32, u64, u64, f32)>,
        despawned: Vec<u32>,
        /// Handles whose render reports completion
        done: Vec<u32>,
        /// Kinds without a presentation
        unknown_kind: Option<u8>,
    }

    impl VisualBinding<Rec> for Recorder {
        type Handle = u32;

        fn spawn(&mut self, record: &Rec) -> Option<u32> {
            if self.unknown_kind == Some(record.kind) {
                return None;
            }
            let handle = self.next;
            self.next += 1;
            self.spawned.push((handle, record.tag));
            Some(handle)
        }

        fn render(&mut self, handle: u32, confirmed: &Rec, predicted: &Rec, alpha: f32) -> bool {
            self.rendered
                .push((handle, confirmed.tag, predicted.tag, alpha));
            !self.done.contains(&handle)
        }

        fn despawn(&mut self, handle: u32) {
            self.despawned.push(handle);
        }
    }

    fn pair(ring: &EventRing<Rec>) -> SnapshotPair<Rec> {
        let view = ring.snapshot();
        SnapshotPair::new(view.clone(), view, 0.5).unwrap()
    }

    fn ring_with(capacity: usize, writes: u64) -> EventRing<Rec> {
        let mut ring = EventRing::new(capacity);
        for tag in 0..writes {
            ring.push(rec(tag));
        }
        ring
    }

    fn indices(engine: &VisualReconciler<Rec, u32>) -> Vec<u64> {
        engine.indices().map(|i| i.0).collect()
    }

    #[test]
    fn test_diff_creates_only_new_indices() {
        let ring = ring_with(16, 8);
        let mut engine = VisualReconciler::new(5);
        let mut binding = Recorder::default();

        let stats = engine.reconcile(&pair(&ring), &mut binding);

        assert_eq!(stats.created, 3);
        assert_eq!(stats.removed, 0);
        assert_eq!(indices(&engine), vec![5, 6, 7]);
        assert_eq!(binding.spawned, vec![(0, 5), (1, 6), (2, 7)]);
        assert!(binding.despawned.is_empty());
        assert_eq!(engine.observed_count(), 8);
    }

    #[test]
    fn test_no_change_is_a_no_op() {
        let ring = ring_with(8, 3);
        let mut engine = VisualReconciler::new(0);
        let mut binding = Recorder::default();

        engine.reconcile(&pair(&ring), &mut binding);
        let stats = engine.reconcile(&pair(&ring), &mut binding);

        assert_eq!(stats.created, 0);
        assert_eq!(engine.len(), 3);
        assert_eq!(binding.spawned.len(), 3);
    }

    #[test]
    fn test_count_going_back_retires_entries() {
        let ring = ring_with(8, 6);
        let mut engine = VisualReconciler::new(0);
        let mut binding = Recorder::default();
        engine.reconcile(&pair(&ring), &mut binding);
        assert_eq!(engine.len(), 6);

        // Discontinuity: the buffer was reset to 4 writes
        let reset = ring_with(8, 4);
        let stats = engine.reconcile(&pair(&reset), &mut binding);

        assert_eq!(stats.removed, 2);
        assert_eq!(indices(&engine), vec![0, 1, 2, 3]);
        assert_eq!(binding.despawned, vec![4, 5]);
        assert_eq!(engine.observed_count(), 4);
    }

    #[test]
    fn test_bounded_loss_skips_overwritten_indices() {
        let capacity = 4;
        let ring = ring_with(capacity, 10);
        let mut engine = VisualReconciler::new(0);
        let mut binding = Recorder::default();

        let stats = engine.reconcile(&pair(&ring), &mut binding);

        // Jump of 10 with capacity 4: the oldest 6 are never instantiated
        assert_eq!(stats.lost, 6);
        assert_eq!(stats.created, 4);
        assert_eq!(indices(&engine), vec![6, 7, 8, 9]);
        // Every spawned visual got its own event's data, never a stale slot
        for (_, tag) in &binding.spawned {
            assert!(*tag >= 6);
        }
    }

    #[test]
    fn test_scenario_freezes_entry_outside_window() {
        let mut ring = EventRing::new(4);
        for tag in 0..3 {
            ring.push(rec(tag));
        }
        let mut engine = VisualReconciler::new(0);
        let mut binding = Recorder::default();

        let stats = engine.reconcile(&pair(&ring), &mut binding);
        assert_eq!(stats.created, 3);
        assert_eq!(stats.frozen, 0);
        assert_eq!(indices(&engine), vec![0, 1, 2]);

        ring.push(rec(3));
        ring.push(rec(4));
        binding.rendered.clear();

        let stats = engine.reconcile(&pair(&ring), &mut binding);
        assert_eq!(stats.created, 2);
        assert_eq!(engine.len(), 5);
        assert_eq!(stats.frozen, 1);

        // Entry 0 (handle 0) rendered from its cache, not from slot 0 (event 4)
        let first = binding
            .rendered
            .iter()
            .find(|(handle, ..)| *handle == 0)
            .copied()
            .unwrap();
        assert_eq!(first, (0, 0, 0, 0.0));
        assert_eq!(engine.entry(LogicalIndex(0)).unwrap().last.tag, 0);

        // Entries inside the window rendered from the live slots
        assert!(binding.rendered.contains(&(4, 4, 4, 0.5)));
    }

    #[test]
    fn test_predicted_view_is_cached() {
        let mut confirmed_ring = EventRing::new(4);
        confirmed_ring.push(rec(0));
        let mut predicted_ring = confirmed_ring.clone();
        let mut ahead = rec(0);
        ahead.finished = true;
        predicted_ring.set_slot(0, ahead);

        let views = SnapshotPair::new(confirmed_ring.snapshot(), predicted_ring.snapshot(), 0.25)
            .unwrap();
        let mut engine = VisualReconciler::new(0);
        let mut binding = Recorder::default();
        let stats = engine.reconcile(&views, &mut binding);

        // Created from confirmed data, cached predicted data is finished
        assert_eq!(stats.created, 1);
        assert_eq!(stats.finished, 1);
        assert!(engine.is_empty());
        assert_eq!(binding.despawned, vec![0]);
    }

    #[test]
    fn test_cleanup_removes_completed_visuals() {
        let ring = ring_with(8, 3);
        let mut engine = VisualReconciler::new(0);
        let mut binding = Recorder {
            done: vec![1],
            ..Default::default()
        };

        let stats = engine.reconcile(&pair(&ring), &mut binding);
        assert_eq!(stats.finished, 1);
        assert_eq!(indices(&engine), vec![0, 2]);
        assert_eq!(binding.despawned, vec![1]);
    }

    #[test]
    fn test_cleanup_is_idempotent() {
        let ring = ring_with(8, 4);
        let mut engine = VisualReconciler::new(0);
        let mut binding = Recorder {
            done: vec![0, 3],
            ..Default::default()
        };
        let views = pair(&ring);
        engine.sync(&views.confirmed, &mut binding);
        engine.render(&views, &mut binding);

        assert_eq!(engine.cleanup(&mut binding), 2);
        assert_eq!(engine.cleanup(&mut binding), 0);
        assert_eq!(engine.len(), 2);
        assert_eq!(binding.despawned, vec![0, 3]);
    }

    #[test]
    fn test_unknown_kind_gets_no_entry() {
        let mut ring = EventRing::new(4);
        ring.push(rec(0));
        ring.push(Rec {
            kind: 7,
            tag: 1,
            finished: false,
        });
        let mut engine = VisualReconciler::new(0);
        let mut binding = Recorder {
            unknown_kind: Some(7),
            ..Default::default()
        };

        let stats = engine.reconcile(&pair(&ring), &mut binding);
        assert_eq!(stats.created, 1);
        assert_eq!(indices(&engine), vec![0]);
        assert_eq!(engine.observed_count(), 2);
    }

    #[test]
    fn test_teardown() {
        let ring = ring_with(8, 3);
        let mut engine = VisualReconciler::new(0);
        let mut binding = Recorder::default();
        engine.reconcile(&pair(&ring), &mut binding);

        assert_eq!(engine.teardown(&mut binding), 3);
        assert!(engine.is_empty());
        assert_eq!(binding.despawned, vec![0, 1, 2]);
    }
}
