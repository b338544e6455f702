//! Hit-scan projectiles
//!
//! A hit-scan shot resolves instantly: the authority raycasts against
//! historical world state, reports any hit and writes one immutable record.
//! Observers play a short impact effect for each record they see.

use crate::config::{HandlerConfig, HitscanConfig, ProjectileDefs};
use crate::error::{Rejected, Result};
use crate::kinds::{render_frame, KindBinding, KindTable, ProjectileKind, VisualHandle};
use crate::record::HitscanData;
use crate::visual::{HitscanEffects, VisualFactory};
use salvo_core::{HitData, HitOptions, ProjectileContext, RaycastQuery, RenderContext, Vec3};
use salvo_netcode::{EventRing, LogicalIndex, ReconcileStats, ViewProvider, VisualReconciler};
use std::fmt;
use tracing::{debug, trace};

/// A registered hit-scan kind: its configuration and presentation
pub struct HitscanProjectile {
    config: HitscanConfig,
    factory: Box<dyn VisualFactory<HitscanData>>,
}

impl HitscanProjectile {
    /// Create a kind presented with impact effects
    pub fn new(config: HitscanConfig) -> Self {
        let factory = Box::new(HitscanEffects::new(config.display_time));
        Self { config, factory }
    }

    /// Create a kind with a custom presentation factory
    pub fn with_factory(config: HitscanConfig, factory: Box<dyn VisualFactory<HitscanData>>) -> Self {
        Self { config, factory }
    }

    pub fn config(&self) -> &HitscanConfig {
        &self.config
    }

    /// Raycast and report a hit; the returned record has kind 0
    pub fn fire(&self, ctx: &mut ProjectileContext<'_>, origin: Vec3, direction: Vec3) -> HitscanData {
        let direction = direction.normalize_or_zero();
        let mut data = HitscanData {
            kind: 0,
            fire_position: origin,
            fire_direction: direction,
            impact_position: origin,
            impact_normal: Vec3::ZERO,
        };

        let query = RaycastQuery {
            origin,
            direction,
            max_distance: self.config.max_distance,
            ignore: Some(ctx.owner),
            mask: self.config.hit_mask,
            options: HitOptions::HITSCAN,
        };

        if let Some(hit) = ctx.physics.raycast(&query) {
            data.impact_position = hit.point;
            data.impact_normal = hit.normal;

            let applied = ctx.hits.apply_hit(&HitData {
                instigator: ctx.owner,
                target: hit.target,
                damage: self.config.damage,
                point: hit.point,
                direction,
                normal: hit.normal,
            });
            trace!(
                projectile = %self.config.name,
                entity = %hit.target,
                distance = hit.distance,
                applied,
                "hitscan hit"
            );
        }

        data
    }
}

impl ProjectileKind for HitscanProjectile {
    type Record = HitscanData;

    fn name(&self) -> &str {
        &self.config.name
    }

    fn factory_mut(&mut self) -> &mut dyn VisualFactory<HitscanData> {
        self.factory.as_mut()
    }
}

impl fmt::Debug for HitscanProjectile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HitscanProjectile")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Per-entity hit-scan handler
///
/// Owns the replicated buffer on the authority and the visual entries on
/// observers. A host is both.
#[derive(Debug)]
pub struct HitscanHandler {
    kinds: KindTable<HitscanProjectile>,
    buffer: EventRing<HitscanData>,
    visuals: VisualReconciler<HitscanData, VisualHandle>,
}

impl HitscanHandler {
    pub fn new(config: HandlerConfig) -> Self {
        Self {
            kinds: KindTable::new(),
            buffer: EventRing::new(config.capacity),
            visuals: VisualReconciler::new(0),
        }
    }

    /// Build a handler with every hit-scan kind from `defs`
    pub fn from_defs(defs: &ProjectileDefs) -> Result<Self> {
        let mut handler = Self::new(defs.handler_config());
        for config in &defs.hitscan {
            handler.register(HitscanProjectile::new(config.clone()))?;
        }
        Ok(handler)
    }

    /// Register a kind and return its index
    pub fn register(&mut self, projectile: HitscanProjectile) -> Result<u8> {
        self.kinds.register(projectile)
    }

    /// Called when the owning entity is spawned on this peer
    ///
    /// Events already in the buffer predate this observer and are never
    /// presented.
    pub fn spawned(&mut self, views: &impl ViewProvider<HitscanData>) {
        if let Ok(views) = views.snapshots() {
            self.visuals = VisualReconciler::new(views.confirmed.count());
        }
    }

    /// Fire a shot and append its record
    ///
    /// Only the authority writes; other callers are rejected without side
    /// effects.
    pub fn spawn_projectile(
        &mut self,
        ctx: &mut ProjectileContext<'_>,
        kind: u8,
        origin: Vec3,
        direction: Vec3,
    ) -> std::result::Result<LogicalIndex, Rejected> {
        if !ctx.clock.is_authority() {
            debug!(kind, "hitscan fire rejected: not the authority");
            return Err(Rejected::NotAuthority);
        }
        let projectile = self.kinds.resolve(kind, "hitscan")?;

        let mut data = projectile.fire(ctx, origin, direction);
        data.kind = kind;
        Ok(self.buffer.push(data))
    }

    /// Reconcile visuals against this frame's views
    pub fn render<V>(&mut self, views: &V, ctx: RenderContext<'_>) -> Option<ReconcileStats>
    where
        V: ViewProvider<HitscanData> + ?Sized,
    {
        render_frame(
            &mut self.kinds,
            &mut self.visuals,
            self.buffer.capacity(),
            views,
            ctx,
        )
    }

    /// Tear down every visual when the owning entity is destroyed
    pub fn despawned(&mut self, ctx: RenderContext<'_>) -> usize {
        self.visuals
            .teardown(&mut KindBinding::new(&mut self.kinds, ctx))
    }

    pub fn kinds(&self) -> &KindTable<HitscanProjectile> {
        &self.kinds
    }

    /// The replicated buffer
    pub fn buffer(&self) -> &EventRing<HitscanData> {
        &self.buffer
    }

    pub fn visuals(&self) -> &VisualReconciler<HitscanData, VisualHandle> {
        &self.visuals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use salvo_core::{
        EntityId, FixedClock, HitMask, NoHits, PlayerRef, SimulationMode, SphereCollider,
        SphereWorld,
    };
    use salvo_netcode::SnapshotTimeline;

    fn world() -> SphereWorld {
        let mut world = SphereWorld::new();
        world.insert(SphereCollider {
            target: EntityId::new(7),
            center: Vec3::new(0.0, 0.0, 20.0),
            radius: 1.0,
            layer: 0,
            owner: Some(PlayerRef::new(2)),
        });
        world
    }

    fn handler() -> HitscanHandler {
        let mut handler = HitscanHandler::new(HandlerConfig::new(4));
        handler
            .register(HitscanProjectile::new(
                HitscanConfig::new("rifle").with_damage(10),
            ))
            .unwrap();
        handler
    }

    #[test]
    fn test_hit_writes_impact_and_applies_damage() {
        let clock = FixedClock::new(20, SimulationMode::Server).unwrap();
        let world = world();
        let mut hits = Vec::new();
        let mut resolver = |hit: &HitData| {
            hits.push(*hit);
            true
        };
        let mut handler = handler();

        let index = {
            let mut ctx = ProjectileContext::new(&clock, &world, &mut resolver, PlayerRef::new(1));
            handler
                .spawn_projectile(&mut ctx, 0, Vec3::ZERO, Vec3::new(0.0, 0.0, 5.0))
                .unwrap()
        };

        assert_eq!(index, LogicalIndex(0));
        let data = *handler.buffer().get(index).unwrap();
        assert_eq!(data.kind, 0);
        assert_eq!(data.fire_direction, Vec3::Z);
        assert!((data.impact_position - Vec3::new(0.0, 0.0, 19.0)).length() < 1e-4);
        assert!((data.impact_normal - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-4);

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].instigator, PlayerRef::new(1));
        assert_eq!(hits[0].target, EntityId::new(7));
        assert_eq!(hits[0].damage, 10);
    }

    #[test]
    fn test_miss_uses_origin_and_zero_normal() {
        let clock = FixedClock::new(20, SimulationMode::Host).unwrap();
        let world = world();
        let mut resolver = NoHits;
        let mut handler = handler();
        let origin = Vec3::new(5.0, 1.0, 0.0);

        let mut ctx = ProjectileContext::new(&clock, &world, &mut resolver, PlayerRef::new(1));
        let index = handler
            .spawn_projectile(&mut ctx, 0, origin, Vec3::X)
            .unwrap();

        let data = *handler.buffer().get(index).unwrap();
        assert_eq!(data.impact_position, origin);
        assert_eq!(data.impact_normal, Vec3::ZERO);
    }

    #[test]
    fn test_hit_mask_filters_layers() {
        let clock = FixedClock::new(20, SimulationMode::Server).unwrap();
        let world = world();
        let mut count = 0;
        let mut resolver = |_: &HitData| {
            count += 1;
            true
        };
        let mut handler = HitscanHandler::new(HandlerConfig::new(4));
        handler
            .register(HitscanProjectile::new(
                HitscanConfig::new("ghost").with_hit_mask(HitMask::layer(3)),
            ))
            .unwrap();

        let mut ctx = ProjectileContext::new(&clock, &world, &mut resolver, PlayerRef::new(1));
        handler
            .spawn_projectile(&mut ctx, 0, Vec3::ZERO, Vec3::Z)
            .unwrap();
        drop(ctx);
        assert_eq!(count, 0);
    }

    #[test]
    fn test_shooter_does_not_hit_itself() {
        let clock = FixedClock::new(20, SimulationMode::Server).unwrap();
        let world = world();
        let mut count = 0;
        let mut resolver = |_: &HitData| {
            count += 1;
            true
        };
        let mut handler = handler();

        // Player 2 owns the only collider
        let mut ctx = ProjectileContext::new(&clock, &world, &mut resolver, PlayerRef::new(2));
        handler
            .spawn_projectile(&mut ctx, 0, Vec3::ZERO, Vec3::Z)
            .unwrap();
        drop(ctx);
        assert_eq!(count, 0);
    }

    #[test]
    fn test_non_authority_is_rejected() {
        let clock = FixedClock::new(20, SimulationMode::Client).unwrap();
        let world = world();
        let mut count = 0;
        let mut resolver = |_: &HitData| {
            count += 1;
            true
        };
        let mut handler = handler();

        let mut ctx = ProjectileContext::new(&clock, &world, &mut resolver, PlayerRef::new(1));
        assert_eq!(
            handler.spawn_projectile(&mut ctx, 0, Vec3::ZERO, Vec3::Z),
            Err(Rejected::NotAuthority)
        );
        drop(ctx);

        assert_eq!(handler.buffer().count(), 0);
        assert_eq!(count, 0);
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let clock = FixedClock::new(20, SimulationMode::Server).unwrap();
        let world = world();
        let mut resolver = NoHits;
        let mut handler = handler();

        let mut ctx = ProjectileContext::new(&clock, &world, &mut resolver, PlayerRef::new(1));
        assert_eq!(
            handler.spawn_projectile(&mut ctx, 9, Vec3::ZERO, Vec3::Z),
            Err(Rejected::UnknownKind(9))
        );
        assert_eq!(handler.buffer().count(), 0);
    }

    #[test]
    fn test_host_presents_its_own_shots() {
        let clock = FixedClock::new(20, SimulationMode::Host).unwrap();
        let world = world();
        let mut resolver = NoHits;
        let mut handler = handler();

        for _ in 0..2 {
            let mut ctx = ProjectileContext::new(&clock, &world, &mut resolver, PlayerRef::new(1));
            handler
                .spawn_projectile(&mut ctx, 0, Vec3::ZERO, Vec3::X)
                .unwrap();
        }

        let ring = handler.buffer().clone();
        let ctx = RenderContext::new(&clock, PlayerRef::new(1), 0.016);
        let stats = handler.render(&ring, ctx).unwrap();
        assert_eq!(stats.created, 2);
        assert_eq!(handler.visuals().len(), 2);

        // Effects last one second, then cleanup removes them
        let ctx = RenderContext::new(&clock, PlayerRef::new(1), 0.6);
        handler.render(&ring, ctx).unwrap();
        handler.render(&ring, ctx).unwrap();
        let stats = handler.render(&ring, ctx).unwrap();
        assert_eq!(stats.finished, 2);
        assert!(handler.visuals().is_empty());
    }

    #[test]
    fn test_server_skips_render() {
        let clock = FixedClock::new(20, SimulationMode::Server).unwrap();
        let mut handler = handler();
        let ring = handler.buffer().clone();
        let ctx = RenderContext::new(&clock, PlayerRef::new(1), 0.016);
        assert!(handler.render(&ring, ctx).is_none());
    }

    #[test]
    fn test_capacity_mismatch_skips_render() {
        let clock = FixedClock::new(20, SimulationMode::Client).unwrap();
        let mut handler = handler();
        let mut other: EventRing<HitscanData> = EventRing::new(8);
        other.push(HitscanData::default());

        let ctx = RenderContext::new(&clock, PlayerRef::new(1), 0.016);
        assert!(handler.render(&other, ctx).is_none());
        assert!(handler.visuals().is_empty());
        assert_eq!(handler.visuals().observed_count(), 0);
    }

    #[test]
    fn test_timeline_gaps_and_owner_loss() {
        let clock = FixedClock::new(20, SimulationMode::Client).unwrap();
        let ctx = RenderContext::new(&clock, PlayerRef::new(1), 0.016);
        let mut handler = handler();
        let mut ring: EventRing<HitscanData> = EventRing::new(4);
        let mut timeline: SnapshotTimeline<HitscanData> = SnapshotTimeline::new();

        // Nothing received yet
        assert!(handler.render(&timeline, ctx).is_none());
        assert_eq!(handler.visuals().observed_count(), 0);

        ring.push(HitscanData::default());
        timeline.push(5, ring.snapshot());
        assert_eq!(handler.render(&timeline, ctx).unwrap().created, 1);

        // A dropped history skips the pass but keeps what is on screen
        timeline.reset();
        assert!(handler.render(&timeline, ctx).is_none());
        assert_eq!(handler.visuals().observed_count(), 1);
        assert_eq!(handler.visuals().len(), 1);

        ring.push(HitscanData::default());
        timeline.push(6, ring.snapshot());
        assert_eq!(handler.render(&timeline, ctx).unwrap().created, 1);
        assert_eq!(handler.visuals().len(), 2);

        // The shooter is destroyed
        timeline.mark_gone();
        assert!(handler.render(&timeline, ctx).is_none());
        assert!(handler.visuals().is_empty());
    }

    #[test]
    fn test_late_join_skips_existing_events() {
        let mut ring: EventRing<HitscanData> = EventRing::new(4);
        ring.push(HitscanData::default());
        ring.push(HitscanData::default());

        let clock = FixedClock::new(20, SimulationMode::Client).unwrap();
        let mut handler = handler();
        handler.spawned(&ring);

        let ctx = RenderContext::new(&clock, PlayerRef::new(1), 0.016);
        let stats = handler.render(&ring, ctx).unwrap();
        assert_eq!(stats.created, 0);

        ring.push(HitscanData::default());
        let stats = handler.render(&ring, ctx).unwrap();
        assert_eq!(stats.created, 1);
    }

    #[test]
    fn test_from_defs() {
        let defs = ProjectileDefs::from_ron_str(
            "(capacity: 16, hitscan: [(name: \"rifle\"), (name: \"sniper\", max_distance: 500.0)])",
        )
        .unwrap();
        let handler = HitscanHandler::from_defs(&defs).unwrap();
        assert_eq!(handler.buffer().capacity(), 16);
        assert_eq!(handler.kinds().index_of("sniper"), Some(1));
        assert_eq!(handler.kinds().get(1).unwrap().config().max_distance, 500.0);
    }
}
