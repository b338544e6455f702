//! Replicated projectile records

use salvo_core::{EventRecord, Tick, Vec3, UNSET_TICK};
use serde::{Deserialize, Serialize};

/// One instantaneous shot, immutable once written
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HitscanData {
    /// Index into the handler's hit-scan table
    pub kind: u8,
    pub fire_position: Vec3,
    pub fire_direction: Vec3,
    /// Equals `fire_position` when nothing was hit
    pub impact_position: Vec3,
    /// Zero when nothing was hit
    pub impact_normal: Vec3,
}

impl EventRecord for HitscanData {
    fn kind(&self) -> u8 {
        self.kind
    }
}

/// A projectile travelling along `position + velocity * t`
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct KinematicData {
    /// Hit something or outlived its lifetime
    pub finished: bool,
    /// Index into the handler's kinematic table
    pub kind: u8,
    /// Tick the projectile was fired; `UNSET_TICK` for a never-written slot
    pub fire_tick: Tick,
    /// Units per second
    pub velocity: Vec3,
    /// Start position
    pub position: Vec3,
}

impl KinematicData {
    /// Whether this slot holds a fired projectile
    pub fn is_written(&self) -> bool {
        self.fire_tick != UNSET_TICK
    }

    /// Analytic position at a (possibly fractional) tick
    pub fn position_at(&self, tick: f64, delta_time: f32) -> Vec3 {
        let time = ((tick - self.fire_tick as f64) * delta_time as f64) as f32;
        if time <= 0.0 {
            return self.position;
        }
        self.position + self.velocity * time
    }
}

impl EventRecord for KinematicData {
    fn kind(&self) -> u8 {
        self.kind
    }

    fn is_finished(&self) -> bool {
        self.finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_at() {
        let data = KinematicData {
            finished: false,
            kind: 0,
            fire_tick: 10,
            velocity: Vec3::new(0.0, 0.0, 20.0),
            position: Vec3::new(1.0, 2.0, 3.0),
        };
        let dt = 0.05;

        // Before and at the fire tick it sits at the start position
        assert_eq!(data.position_at(5.0, dt), data.position);
        assert_eq!(data.position_at(10.0, dt), data.position);

        // 2 ticks = 0.1s at 20 units/s
        let p = data.position_at(12.0, dt);
        assert!((p - Vec3::new(1.0, 2.0, 5.0)).length() < 1e-4);

        // Fractional ticks for rendering
        let p = data.position_at(10.5, dt);
        assert!((p - Vec3::new(1.0, 2.0, 3.5)).length() < 1e-4);
    }

    #[test]
    fn test_default_slot_is_unwritten() {
        let data = KinematicData::default();
        assert!(!data.is_written());
        assert!(!data.is_finished());
    }
}
