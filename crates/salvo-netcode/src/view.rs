//! Confirmed and predicted buffer views
//!
//! Every rendered frame an observer reads two time-shifted copies of the
//! same replicated buffer. The confirmed view decides which events exist;
//! the predicted view decides which slots can still be trusted.

use crate::{Error, Result};
use salvo_core::EventRecord;
use salvo_ring_buffer::{EventRing, RingView};

/// The two views read during one rendered frame
#[derive(Debug, Clone)]
pub struct SnapshotPair<T> {
    /// Last state acknowledged as authoritative
    pub confirmed: RingView<T>,
    /// Best local extrapolation of the authoritative state
    pub predicted: RingView<T>,
    /// Interpolation fraction between the two (0.0 to 1.0)
    pub alpha: f32,
}

impl<T: EventRecord> SnapshotPair<T> {
    /// Pair two views of the same buffer
    ///
    /// Fails when the views disagree on capacity, since slot arithmetic
    /// would then map the same logical index to different events.
    pub fn new(confirmed: RingView<T>, predicted: RingView<T>, alpha: f32) -> Result<Self> {
        if confirmed.capacity() != predicted.capacity() {
            return Err(Error::MalformedSnapshot(format!(
                "confirmed capacity {} differs from predicted capacity {}",
                confirmed.capacity(),
                predicted.capacity()
            )));
        }
        Ok(Self {
            confirmed,
            predicted,
            alpha: alpha.clamp(0.0, 1.0),
        })
    }

    /// Number of slots in both views
    pub fn capacity(&self) -> usize {
        self.confirmed.capacity()
    }

    /// Lowest logical index whose slot is still trusted for rendering
    ///
    /// Taken from the predicted view, while entry creation follows the
    /// confirmed view.
    pub fn min_visible(&self) -> u64 {
        self.predicted.oldest_visible()
    }
}

/// Source of confirmed/predicted views for one entity's buffer
pub trait ViewProvider<T> {
    /// Views for the current frame
    ///
    /// `MissingSnapshot` and `MalformedSnapshot` skip the frame;
    /// `EntityGone` tears down every visual.
    fn snapshots(&self) -> Result<SnapshotPair<T>>;
}

/// The authority reads its own buffer directly: both views are the live state
impl<T: EventRecord> ViewProvider<T> for EventRing<T> {
    fn snapshots(&self) -> Result<SnapshotPair<T>> {
        let view = self.snapshot();
        SnapshotPair::new(view.clone(), view, 0.0)
    }
}
