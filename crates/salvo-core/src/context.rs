//! Contexts handed to projectile behaviour
//!
//! A context is only valid for the duration of one handler operation and
//! should not be stored.

use crate::{HistoricalRaycast, HitResolver, PlayerRef, SimClock};

/// Services available to the authoritative side while firing or advancing
pub struct ProjectileContext<'a> {
    /// Simulation clock (read only)
    pub clock: &'a dyn SimClock,
    /// Lag-compensated collision queries
    pub physics: &'a dyn HistoricalRaycast,
    /// Damage application
    pub hits: &'a mut dyn HitResolver,
    /// Player holding input authority over the firing entity
    pub owner: PlayerRef,
}

impl<'a> ProjectileContext<'a> {
    pub fn new(
        clock: &'a dyn SimClock,
        physics: &'a dyn HistoricalRaycast,
        hits: &'a mut dyn HitResolver,
        owner: PlayerRef,
    ) -> Self {
        Self {
            clock,
            physics,
            hits,
            owner,
        }
    }
}

/// Services available to presentation during a rendered frame
#[derive(Clone, Copy)]
pub struct RenderContext<'a> {
    pub clock: &'a dyn SimClock,
    /// Player holding input authority over the firing entity
    pub owner: PlayerRef,
    /// Wall-clock seconds since the previous rendered frame
    pub frame_delta: f32,
}

impl<'a> RenderContext<'a> {
    pub fn new(clock: &'a dyn SimClock, owner: PlayerRef, frame_delta: f32) -> Self {
        Self {
            clock,
            owner,
            frame_delta,
        }
    }

    /// Whether the firing entity is controlled on this peer
    pub fn is_local_owner(&self) -> bool {
        self.clock.local_player() == Some(self.owner)
    }

    /// Render time in seconds
    ///
    /// The instigator's own peer renders on its local clock so its shots do
    /// not trail behind by a round trip.
    pub fn render_time(&self) -> f32 {
        if self.is_local_owner() {
            self.clock.local_render_time()
        } else {
            self.clock.remote_render_time()
        }
    }

    /// Render time as a fractional tick
    pub fn render_tick(&self) -> f32 {
        self.render_time() / self.clock.delta_time()
    }
}
