//! Weapons: fire-rate gated launchers

use crate::error::Rejected;
use crate::hitscan::HitscanHandler;
use crate::kinematic::KinematicHandler;
use salvo_core::{ProjectileContext, SimClock, TickTimer, Vec3};
use salvo_netcode::LogicalIndex;
use serde::{Deserialize, Serialize};

/// Something that turns a fire request into a buffered event
pub trait Launcher {
    fn launch(
        &mut self,
        ctx: &mut ProjectileContext<'_>,
        kind: u8,
        origin: Vec3,
        direction: Vec3,
    ) -> Result<LogicalIndex, Rejected>;
}

impl Launcher for HitscanHandler {
    fn launch(
        &mut self,
        ctx: &mut ProjectileContext<'_>,
        kind: u8,
        origin: Vec3,
        direction: Vec3,
    ) -> Result<LogicalIndex, Rejected> {
        self.spawn_projectile(ctx, kind, origin, direction)
    }
}

impl Launcher for KinematicHandler {
    fn launch(
        &mut self,
        ctx: &mut ProjectileContext<'_>,
        kind: u8,
        origin: Vec3,
        direction: Vec3,
    ) -> Result<LogicalIndex, Rejected> {
        self.spawn_projectile(ctx, kind, origin, direction)
    }
}

/// A weapon firing one projectile kind at a limited rate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weapon {
    /// Kind index in the launcher's table
    pub kind: u8,
    /// Shots per second; 0 for no limit
    pub fire_rate: f32,
    /// Cooldown until the next shot
    next_fire: TickTimer,
}

impl Weapon {
    pub fn new(kind: u8, fire_rate: f32) -> Self {
        Self {
            kind,
            fire_rate,
            next_fire: TickTimer::NONE,
        }
    }

    /// Whether a shot is allowed this tick
    ///
    /// Requires write authority, a pressed trigger and an elapsed cooldown.
    pub fn can_fire(&self, clock: &dyn SimClock, trigger: bool) -> bool {
        clock.is_authority() && trigger && self.next_fire.expired_or_not_running(clock)
    }

    /// Launch a shot and restart the cooldown
    pub fn fire<L: Launcher + ?Sized>(
        &mut self,
        launcher: &mut L,
        ctx: &mut ProjectileContext<'_>,
        origin: Vec3,
        direction: Vec3,
    ) -> Result<LogicalIndex, Rejected> {
        let index = launcher.launch(ctx, self.kind, origin, direction)?;
        self.next_fire = if self.fire_rate > 0.0 {
            TickTimer::from_seconds(ctx.clock, 1.0 / self.fire_rate)
        } else {
            TickTimer::NONE
        };
        Ok(index)
    }

    /// Fire if allowed this tick
    pub fn try_fire<L: Launcher + ?Sized>(
        &mut self,
        launcher: &mut L,
        ctx: &mut ProjectileContext<'_>,
        trigger: bool,
        origin: Vec3,
        direction: Vec3,
    ) -> Option<LogicalIndex> {
        if !self.can_fire(ctx.clock, trigger) {
            return None;
        }
        self.fire(launcher, ctx, origin, direction).ok()
    }

    /// Ticks until the next shot is allowed
    pub fn cooldown_ticks(&self, clock: &dyn SimClock) -> u64 {
        self.next_fire.remaining_ticks(clock).unwrap_or(0)
    }
}
