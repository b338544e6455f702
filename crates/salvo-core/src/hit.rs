//! Hit resolution contract
//!
//! Damage application lives outside the projectile system. Producers report
//! hits here and never look at the outcome beyond logging it.

use crate::{EntityId, PlayerRef};
use glam::Vec3;

/// A confirmed projectile hit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitData {
    pub instigator: PlayerRef,
    pub target: EntityId,
    pub damage: u8,
    pub point: Vec3,
    pub direction: Vec3,
    pub normal: Vec3,
}

/// Applies hits to targets
pub trait HitResolver {
    /// Apply a hit; returns false when the target is gone or already defeated
    fn apply_hit(&mut self, hit: &HitData) -> bool;
}

impl<F> HitResolver for F
where
    F: FnMut(&HitData) -> bool,
{
    fn apply_hit(&mut self, hit: &HitData) -> bool {
        self(hit)
    }
}

/// Resolver that rejects every hit
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHits;

impl HitResolver for NoHits {
    fn apply_hit(&mut self, _hit: &HitData) -> bool {
        false
    }
}
