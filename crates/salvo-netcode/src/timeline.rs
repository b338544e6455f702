//! Observer-side snapshot timeline
//!
//! Keeps the two most recent replicated frames of one entity's buffer and
//! exposes them as confirmed (older) and predicted (newer) views, with an
//! interpolation fraction derived from the render tick.

use crate::{Error, Result, SnapshotPair, ViewProvider};
use salvo_core::{EventRecord, Tick};
use salvo_ring_buffer::RingView;

/// Two-frame history of a replicated buffer
#[derive(Debug)]
pub struct SnapshotTimeline<T> {
    /// Older frame (confirmed view)
    prev: Option<(Tick, RingView<T>)>,
    /// Newest frame (predicted view)
    curr: Option<(Tick, RingView<T>)>,
    /// Fractional tick being rendered
    render_tick: f32,
    /// Set once the owning entity has been destroyed
    gone: bool,
}

impl<T: EventRecord> SnapshotTimeline<T> {
    /// Create an empty timeline
    pub fn new() -> Self {
        Self {
            prev: None,
            curr: None,
            render_tick: 0.0,
            gone: false,
        }
    }

    /// Record a newly received frame
    ///
    /// Returns false (and keeps the timeline unchanged) when the frame is
    /// not newer than the latest one, e.g. a reordered or duplicate packet.
    pub fn push(&mut self, tick: Tick, view: RingView<T>) -> bool {
        if self.curr.as_ref().is_some_and(|(t, _)| *t >= tick) {
            return false;
        }
        // Shift current to previous
        self.prev = self.curr.take();
        self.curr = Some((tick, view));
        true
    }

    /// Set the fractional tick being rendered this frame
    pub fn set_render_tick(&mut self, render_tick: f32) {
        self.render_tick = render_tick;
    }

    /// Interpolation fraction between the two frames
    ///
    /// - 0.0 = at the confirmed frame
    /// - 1.0 = at the predicted frame
    pub fn alpha(&self) -> f32 {
        match (&self.prev, &self.curr) {
            (Some((prev_tick, _)), Some((curr_tick, _))) if curr_tick > prev_tick => {
                let range = (curr_tick - prev_tick) as f32;
                let offset = self.render_tick - *prev_tick as f32;
                (offset / range).clamp(0.0, 1.0)
            }
            _ => 0.0,
        }
    }

    /// Mark the owning entity as destroyed
    pub fn mark_gone(&mut self) {
        self.gone = true;
    }

    /// Tick of the confirmed frame
    pub fn confirmed_tick(&self) -> Option<Tick> {
        self.prev.as_ref().or(self.curr.as_ref()).map(|(t, _)| *t)
    }

    /// Tick of the predicted frame
    pub fn predicted_tick(&self) -> Option<Tick> {
        self.curr.as_ref().map(|(t, _)| *t)
    }

    /// Check if both frames are present
    pub fn can_interpolate(&self) -> bool {
        self.prev.is_some() && self.curr.is_some()
    }

    /// Forget every frame
    pub fn reset(&mut self) {
        self.prev = None;
        self.curr = None;
        self.gone = false;
    }
}

impl<T: EventRecord> Default for SnapshotTimeline<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: EventRecord> ViewProvider<T> for SnapshotTimeline<T> {
    fn snapshots(&self) -> Result<SnapshotPair<T>> {
        if self.gone {
            return Err(Error::EntityGone);
        }
        match (&self.prev, &self.curr) {
            (Some((_, prev)), Some((_, curr))) => {
                SnapshotPair::new(prev.clone(), curr.clone(), self.alpha())
            }
            // A single frame serves as both views
            (None, Some((_, curr))) => SnapshotPair::new(curr.clone(), curr.clone(), 0.0),
            _ => Err(Error::MissingSnapshot),
        }
    }
}
