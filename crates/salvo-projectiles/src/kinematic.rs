//! Kinematic projectiles
//!
//! A kinematic projectile flies along `position + velocity * t` from its
//! fire tick. Every fixed step the authority sweeps the segment covered
//! since the previous step and finishes the projectile on a collision or
//! once its lifetime runs out. Observers evaluate the same formula at their
//! render tick, so only the start state ever needs replicating.

use crate::config::{HandlerConfig, KinematicConfig, ProjectileDefs};
use crate::error::{Rejected, Result};
use crate::kinds::{render_frame, KindBinding, KindTable, ProjectileKind, VisualHandle};
use crate::record::KinematicData;
use crate::visual::{KinematicTracers, VisualFactory};
use salvo_core::{HitData, HitOptions, ProjectileContext, RaycastQuery, RenderContext, Tick, Vec3};
use salvo_netcode::{EventRing, LogicalIndex, ReconcileStats, ViewProvider, VisualReconciler};
use std::cell::OnceCell;
use std::fmt;
use tracing::{debug, trace, warn};

/// A registered kinematic kind: its configuration and presentation
pub struct KinematicProjectile {
    config: KinematicConfig,
    /// Lifetime in ticks, computed on first use
    lifetime: OnceCell<Tick>,
    factory: Box<dyn VisualFactory<KinematicData>>,
}

impl KinematicProjectile {
    /// Create a kind presented with tracers
    pub fn new(config: KinematicConfig) -> Self {
        let tracers = KinematicTracers::new(config.clone());
        Self::with_factory(config, Box::new(tracers))
    }

    /// Create a kind with a custom presentation factory
    pub fn with_factory(
        config: KinematicConfig,
        factory: Box<dyn VisualFactory<KinematicData>>,
    ) -> Self {
        Self {
            config,
            lifetime: OnceCell::new(),
            factory,
        }
    }

    pub fn config(&self) -> &KinematicConfig {
        &self.config
    }

    /// Lifetime in ticks, fixed by the tick rate seen on first call
    pub fn lifetime_ticks(&self, tick_rate: u32) -> Tick {
        *self
            .lifetime
            .get_or_init(|| self.config.lifetime_ticks(tick_rate))
    }

    /// Initial state for a projectile fired this tick; the record has kind 0
    pub fn fire(&self, ctx: &ProjectileContext<'_>, origin: Vec3, direction: Vec3) -> KinematicData {
        self.lifetime_ticks(ctx.clock.tick_rate());
        KinematicData {
            finished: false,
            kind: 0,
            fire_tick: ctx.clock.tick(),
            velocity: direction.normalize_or_zero() * self.config.speed,
            position: origin,
        }
    }

    /// Advance one fixed step
    ///
    /// Sweeps the segment from the previous tick's position to this tick's
    /// and marks the record finished on a hit or when its lifetime elapses.
    pub fn advance(&self, ctx: &mut ProjectileContext<'_>, data: &mut KinematicData) {
        let tick = ctx.clock.tick();
        let delta_time = ctx.clock.delta_time();

        let previous = data.position_at(tick.saturating_sub(1) as f64, delta_time);
        let current = data.position_at(tick as f64, delta_time);
        let travel = current - previous;
        let distance = travel.length();

        if distance > f32::EPSILON {
            let query = RaycastQuery {
                origin: previous,
                direction: travel / distance,
                max_distance: distance,
                ignore: Some(ctx.owner),
                mask: self.config.hit_mask,
                options: HitOptions::KINEMATIC,
            };

            if let Some(hit) = ctx.physics.raycast(&query) {
                data.finished = true;

                if self.config.damage > 0 {
                    let applied = ctx.hits.apply_hit(&HitData {
                        instigator: ctx.owner,
                        target: hit.target,
                        damage: self.config.damage,
                        point: hit.point,
                        direction: query.direction,
                        normal: hit.normal,
                    });
                    trace!(
                        projectile = %self.config.name,
                        entity = %hit.target,
                        applied,
                        "kinematic hit"
                    );
                }
            }
        }

        let lifetime = self.lifetime_ticks(ctx.clock.tick_rate());
        if tick.saturating_sub(data.fire_tick) >= lifetime {
            data.finished = true;
        }
    }
}

impl ProjectileKind for KinematicProjectile {
    type Record = KinematicData;

    fn name(&self) -> &str {
        &self.config.name
    }

    fn factory_mut(&mut self) -> &mut dyn VisualFactory<KinematicData> {
        self.factory.as_mut()
    }
}

impl fmt::Debug for KinematicProjectile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KinematicProjectile")
            .field("config", &self.config)
            .field("lifetime", &self.lifetime.get())
            .finish_non_exhaustive()
    }
}

/// Per-entity kinematic handler
#[derive(Debug)]
pub struct KinematicHandler {
    kinds: KindTable<KinematicProjectile>,
    buffer: EventRing<KinematicData>,
    visuals: VisualReconciler<KinematicData, VisualHandle>,
}

impl KinematicHandler {
    pub fn new(config: HandlerConfig) -> Self {
        Self {
            kinds: KindTable::new(),
            buffer: EventRing::new(config.capacity),
            visuals: VisualReconciler::new(0),
        }
    }

    /// Build a handler with every kinematic kind from `defs`
    pub fn from_defs(defs: &ProjectileDefs) -> Result<Self> {
        let mut handler = Self::new(defs.handler_config());
        for config in &defs.kinematic {
            handler.register(KinematicProjectile::new(config.clone()))?;
        }
        Ok(handler)
    }

    /// Register a kind and return its index
    pub fn register(&mut self, projectile: KinematicProjectile) -> Result<u8> {
        self.kinds.register(projectile)
    }

    /// Called when the owning entity is spawned on this peer
    pub fn spawned(&mut self, views: &impl ViewProvider<KinematicData>) {
        if let Ok(views) = views.snapshots() {
            self.visuals = VisualReconciler::new(views.confirmed.count());
        }
    }

    /// Launch a projectile and append its record
    pub fn spawn_projectile(
        &mut self,
        ctx: &mut ProjectileContext<'_>,
        kind: u8,
        origin: Vec3,
        direction: Vec3,
    ) -> std::result::Result<LogicalIndex, Rejected> {
        if !ctx.clock.is_authority() {
            debug!(kind, "kinematic fire rejected: not the authority");
            return Err(Rejected::NotAuthority);
        }
        let projectile = self.kinds.resolve(kind, "kinematic")?;

        let mut data = projectile.fire(ctx, origin, direction);
        data.kind = kind;
        Ok(self.buffer.push(data))
    }

    /// Advance every live projectile by one fixed step
    ///
    /// Returns how many projectiles finished during this step. Does nothing
    /// off the authority.
    pub fn fixed_update(&mut self, ctx: &mut ProjectileContext<'_>) -> usize {
        if !ctx.clock.is_authority() {
            return 0;
        }

        let mut finished = 0;
        for data in self.buffer.slots_mut() {
            if data.finished || !data.is_written() {
                continue;
            }
            let Ok(projectile) = self.kinds.get(data.kind) else {
                warn!(kind = data.kind, "live projectile has an unregistered kind");
                continue;
            };
            projectile.advance(ctx, data);
            if data.finished {
                finished += 1;
            }
        }
        finished
    }

    /// Reconcile visuals against this frame's views
    pub fn render<V>(&mut self, views: &V, ctx: RenderContext<'_>) -> Option<ReconcileStats>
    where
        V: ViewProvider<KinematicData> + ?Sized,
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

    pub fn kinds(&self) -> &KindTable<KinematicProjectile> {
        &self.kinds
    }

    /// The replicated buffer
    pub fn buffer(&self) -> &EventRing<KinematicData> {
        &self.buffer
    }

    pub fn visuals(&self) -> &VisualReconciler<KinematicData, VisualHandle> {
        &self.visuals
    }
}
