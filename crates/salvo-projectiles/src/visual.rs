//! Presentation instances for projectile records
//!
//! Each projectile kind owns a [`VisualFactory`] that creates, drives and
//! releases its presentation instances. Instances live in an
//! [`InstanceSlab`] and are addressed by [`InstanceId`], so released slots
//! are reused by later shots.

use crate::config::KinematicConfig;
use crate::record::{HitscanData, KinematicData};
use glam::Quat;
use salvo_core::{RenderContext, Tick, Vec3};
use std::fmt;

/// Handle to one presentation instance inside a factory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceId(pub u32);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "instance:{}", self.0)
    }
}

/// Creates and drives presentation instances for one projectile kind
pub trait VisualFactory<T> {
    /// Create an inactive instance
    fn create_instance(&mut self) -> InstanceId;

    /// Initialise an instance from the record it presents
    fn activate(&mut self, id: InstanceId, record: &T);

    /// Render one frame; returns whether the instance is still active
    fn render(
        &mut self,
        id: InstanceId,
        ctx: &RenderContext<'_>,
        confirmed: &T,
        predicted: &T,
        alpha: f32,
    ) -> bool;

    /// Hide an instance
    fn deactivate(&mut self, id: InstanceId);

    /// Return an instance to the factory for reuse
    fn release(&mut self, id: InstanceId);
}

/// Slot storage with free-list reuse
#[derive(Debug, Clone)]
pub struct InstanceSlab<V> {
    slots: Vec<Option<V>>,
    free: Vec<u32>,
}

impl<V> InstanceSlab<V> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Store a value, reusing a released slot when one is available
    pub fn insert(&mut self, value: V) -> InstanceId {
        if let Some(slot) = self.free.pop() {
            self.slots[slot as usize] = Some(value);
            return InstanceId(slot);
        }
        self.slots.push(Some(value));
        InstanceId((self.slots.len() - 1) as u32)
    }

    pub fn get(&self, id: InstanceId) -> Option<&V> {
        self.slots.get(id.0 as usize).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: InstanceId) -> Option<&mut V> {
        self.slots.get_mut(id.0 as usize).and_then(Option::as_mut)
    }

    /// Remove a value and free its slot
    pub fn remove(&mut self, id: InstanceId) -> Option<V> {
        let value = self.slots.get_mut(id.0 as usize)?.take()?;
        self.free.push(id.0);
        Some(value)
    }

    /// Number of live values
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Slots allocated so far, live or free
    pub fn allocated(&self) -> usize {
        self.slots.len()
    }

    /// Iterate live values with their ids
    pub fn iter(&self) -> impl Iterator<Item = (InstanceId, &V)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|v| (InstanceId(i as u32), v)))
    }
}

impl<V> Default for InstanceSlab<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Rotation facing along `direction`, identity for a zero vector
pub fn look_rotation(direction: Vec3) -> Quat {
    let forward = direction.normalize_or_zero();
    if forward == Vec3::ZERO {
        return Quat::IDENTITY;
    }
    Quat::from_rotation_arc(Vec3::Z, forward)
}

/// An impact effect shown for a fixed time
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ImpactEffect {
    pub position: Vec3,
    pub rotation: Quat,
    /// Seconds left on screen
    pub remaining: f32,
    pub active: bool,
}

/// Factory of impact effects for hit-scan shots
#[derive(Debug, Clone)]
pub struct HitscanEffects {
    display_time: f32,
    instances: InstanceSlab<ImpactEffect>,
}

impl HitscanEffects {
    pub fn new(display_time: f32) -> Self {
        Self {
            display_time,
            instances: InstanceSlab::new(),
        }
    }

    pub fn instances(&self) -> &InstanceSlab<ImpactEffect> {
        &self.instances
    }
}

impl VisualFactory<HitscanData> for HitscanEffects {
    fn create_instance(&mut self) -> InstanceId {
        self.instances.insert(ImpactEffect::default())
    }

    fn activate(&mut self, id: InstanceId, record: &HitscanData) {
        let display_time = self.display_time;
        if let Some(effect) = self.instances.get_mut(id) {
            effect.position = record.impact_position;
            effect.rotation = look_rotation(record.fire_direction);
            effect.remaining = display_time;
            effect.active = true;
        }
    }

    fn render(
        &mut self,
        id: InstanceId,
        ctx: &RenderContext<'_>,
        _confirmed: &HitscanData,
        _predicted: &HitscanData,
        _alpha: f32,
    ) -> bool {
        let Some(effect) = self.instances.get_mut(id) else {
            return false;
        };
        // Every effect gets at least one frame
        if effect.remaining <= 0.0 {
            effect.active = false;
            return false;
        }
        effect.remaining -= ctx.frame_delta;
        true
    }

    fn deactivate(&mut self, id: InstanceId) {
        if let Some(effect) = self.instances.get_mut(id) {
            effect.active = false;
        }
    }

    fn release(&mut self, id: InstanceId) {
        self.instances.remove(id);
    }
}

/// A projectile body following its analytic path
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Tracer {
    pub position: Vec3,
    pub rotation: Quat,
    /// Fire tick of the record being presented
    pub fire_tick: Tick,
    pub active: bool,
}

/// Factory of tracers for kinematic projectiles
///
/// A tracer expires on its own once the render tick passes the kind's
/// lifetime, even when the replicated record it was frozen on never
/// reported `finished`.
#[derive(Debug, Clone)]
pub struct KinematicTracers {
    config: KinematicConfig,
    instances: InstanceSlab<Tracer>,
}

impl KinematicTracers {
    pub fn new(config: KinematicConfig) -> Self {
        Self {
            config,
            instances: InstanceSlab::new(),
        }
    }

    pub fn instances(&self) -> &InstanceSlab<Tracer> {
        &self.instances
    }
}

impl VisualFactory<KinematicData> for KinematicTracers {
    fn create_instance(&mut self) -> InstanceId {
        self.instances.insert(Tracer::default())
    }

    fn activate(&mut self, id: InstanceId, record: &KinematicData) {
        if let Some(tracer) = self.instances.get_mut(id) {
            tracer.position = record.position;
            tracer.rotation = look_rotation(record.velocity);
            tracer.fire_tick = record.fire_tick;
            tracer.active = true;
        }
    }

    fn render(
        &mut self,
        id: InstanceId,
        ctx: &RenderContext<'_>,
        confirmed: &KinematicData,
        _predicted: &KinematicData,
        _alpha: f32,
    ) -> bool {
        let lifetime = self.config.lifetime_ticks(ctx.clock.tick_rate());
        let Some(tracer) = self.instances.get_mut(id) else {
            return false;
        };
        let render_tick = ctx.render_tick() as f64;
        if render_tick >= tracer.fire_tick.saturating_add(lifetime) as f64 {
            tracer.active = false;
            return false;
        }
        // The path is analytic, so the render tick alone places the tracer
        tracer.position = confirmed.position_at(render_tick, ctx.clock.delta_time());
        true
    }

    fn deactivate(&mut self, id: InstanceId) {
        if let Some(tracer) = self.instances.get_mut(id) {
            tracer.active = false;
        }
    }

    fn release(&mut self, id: InstanceId) {
        self.instances.remove(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use salvo_core::{FixedClock, PlayerRef, SimulationMode};

    #[test]
    fn test_slab_reuses_released_slots() {
        let mut slab = InstanceSlab::new();
        let a = slab.insert("a");
        let b = slab.insert("b");
        assert_eq!(slab.len(), 2);

        assert_eq!(slab.remove(a), Some("a"));
        assert_eq!(slab.remove(a), None);
        assert_eq!(slab.len(), 1);

        let c = slab.insert("c");
        assert_eq!(c, a);
        assert_eq!(slab.allocated(), 2);
        assert_eq!(slab.get(b), Some(&"b"));
        assert_eq!(slab.get(c), Some(&"c"));
    }

    #[test]
    fn test_impact_effect_lifetime() {
        let clock = FixedClock::new(20, SimulationMode::Client).unwrap();
        let ctx = RenderContext::new(&clock, PlayerRef::new(1), 0.25);
        let mut effects = HitscanEffects::new(0.5);

        let record = HitscanData {
            fire_position: Vec3::ZERO,
            fire_direction: Vec3::X,
            impact_position: Vec3::new(10.0, 0.0, 0.0),
            ..Default::default()
        };
        let id = effects.create_instance();
        effects.activate(id, &record);

        let effect = effects.instances().get(id).copied().unwrap();
        assert!(effect.active);
        assert_eq!(effect.position, Vec3::new(10.0, 0.0, 0.0));

        // 0.5s at 0.25s per frame: two visible frames, then done
        assert!(effects.render(id, &ctx, &record, &record, 0.0));
        assert!(effects.render(id, &ctx, &record, &record, 0.0));
        assert!(!effects.render(id, &ctx, &record, &record, 0.0));

        effects.release(id);
        assert!(effects.instances().is_empty());
    }

    #[test]
    fn test_zero_display_time_renders_once() {
        let clock = FixedClock::new(20, SimulationMode::Client).unwrap();
        let ctx = RenderContext::new(&clock, PlayerRef::new(1), 0.016);
        let mut effects = HitscanEffects::new(0.0);
        let record = HitscanData::default();

        let id = effects.create_instance();
        effects.activate(id, &record);
        assert!(!effects.render(id, &ctx, &record, &record, 0.0));
    }

    #[test]
    fn test_tracer_follows_render_tick() {
        let mut clock = FixedClock::new(20, SimulationMode::Client).unwrap();
        // Render tick 14 for remote objects
        clock.set_render_times(0.0, 0.7);
        let ctx = RenderContext::new(&clock, PlayerRef::new(2), 0.016);

        let record = KinematicData {
            finished: false,
            kind: 0,
            fire_tick: 10,
            velocity: Vec3::new(0.0, 0.0, 10.0),
            position: Vec3::ZERO,
        };

        // 1s lifetime: 20 ticks
        let mut tracers =
            KinematicTracers::new(KinematicConfig::new("bolt", 10.0).with_max_time(1.0));
        let id = tracers.create_instance();
        tracers.activate(id, &record);
        assert_eq!(tracers.instances().get(id).map(|t| t.position), Some(Vec3::ZERO));

        assert!(tracers.render(id, &ctx, &record, &record, 0.0));
        // 4 ticks * 0.05s * 10 units/s
        let position = tracers.instances().get(id).map(|t| t.position).unwrap();
        assert!((position - Vec3::new(0.0, 0.0, 2.0)).length() < 1e-3);
    }

    #[test]
    fn test_tracer_expires_after_lifetime() {
        let mut clock = FixedClock::new(20, SimulationMode::Client).unwrap();
        fn ctx_at(clock: &FixedClock) -> RenderContext<'_> {
            RenderContext::new(clock, PlayerRef::new(2), 0.016)
        }

        // 0.5s at 20Hz: 10 ticks
        let mut tracers =
            KinematicTracers::new(KinematicConfig::new("bolt", 10.0).with_max_time(0.5));
        // A record frozen before it was ever marked finished
        let record = KinematicData {
            finished: false,
            kind: 0,
            fire_tick: 4,
            velocity: Vec3::new(0.0, 0.0, 10.0),
            position: Vec3::ZERO,
        };
        let id = tracers.create_instance();
        tracers.activate(id, &record);
        assert_eq!(tracers.instances().get(id).map(|t| t.fire_tick), Some(4));

        // Render tick 13.5
        clock.set_render_times(0.0, 0.675);
        assert!(tracers.render(id, &ctx_at(&clock), &record, &record, 0.0));
        assert_eq!(tracers.instances().get(id).map(|t| t.active), Some(true));

        // Render tick 14 reaches fire tick + lifetime
        clock.set_render_times(0.0, 0.7);
        assert!(!tracers.render(id, &ctx_at(&clock), &record, &record, 0.0));
        assert_eq!(tracers.instances().get(id).map(|t| t.active), Some(false));
    }

    #[test]
    fn test_impact_effect_at_world_origin() {
        let clock = FixedClock::new(20, SimulationMode::Client).unwrap();
        let ctx = RenderContext::new(&clock, PlayerRef::new(1), 0.016);
        let mut effects = HitscanEffects::new(1.0);

        // A hit exactly at the origin still plays there
        let record = HitscanData {
            fire_position: Vec3::new(5.0, 0.0, 0.0),
            fire_direction: Vec3::new(-1.0, 0.0, 0.0),
            impact_position: Vec3::ZERO,
            impact_normal: Vec3::X,
            ..Default::default()
        };
        let id = effects.create_instance();
        effects.activate(id, &record);
        assert!(effects.render(id, &ctx, &record, &record, 0.0));
        assert_eq!(effects.instances().get(id).map(|e| e.position), Some(Vec3::ZERO));
    }

    #[test]
    fn test_look_rotation() {
        assert_eq!(look_rotation(Vec3::ZERO), Quat::IDENTITY);
        let rotated = look_rotation(Vec3::new(0.0, 0.0, -3.0)) * Vec3::Z;
        assert!((rotated - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-4);
    }
}
