//! Duel Example
//!
//! A host fires hit-scan and kinematic projectiles at a target owned by a
//! remote client. Buffer frames travel to the client through a lagged link
//! that stalls for a while, so the client shows both interpolation and
//! bounded loss.

use salvo_core::{
    EntityId, FixedClock, HitData, HitResolver, PlayerRef, ProjectileContext, RenderContext,
    SimulationMode, SphereCollider, SphereWorld, Tick, Vec3,
};
use salvo_netcode::{decode_frame, encode_frame, SnapshotTimeline};
use salvo_projectiles::{
    recommended_capacity, HitscanData, HitscanHandler, KinematicData, KinematicHandler,
    ProjectileDefs, Weapon,
};
use std::collections::{HashMap, VecDeque};
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const TICK_RATE: u32 = 20;
const TICKS: Tick = 120;
/// One-way link delay
const LAG_TICKS: Tick = 3;
/// Ticks during which every frame is dropped
const STALL: std::ops::Range<Tick> = 40..56;
const FRAME_DELTA: f32 = 1.0 / 60.0;

const HOST: PlayerRef = PlayerRef(1);
const CLIENT: PlayerRef = PlayerRef(2);
const SHOOTER: EntityId = EntityId(1);
const TARGET: EntityId = EntityId(2);

/// Hit points per entity
#[derive(Debug, Default)]
struct Health {
    points: HashMap<EntityId, i32>,
}

impl HitResolver for Health {
    fn apply_hit(&mut self, hit: &HitData) -> bool {
        match self.points.get_mut(&hit.target) {
            Some(points) if *points > 0 => {
                *points -= hit.damage as i32;
                info!(entity = %hit.target, damage = hit.damage, remaining = *points, "hit");
                true
            }
            _ => false,
        }
    }
}

/// Delivers packets after a fixed delay
#[derive(Debug, Default)]
struct Link {
    in_flight: VecDeque<(Tick, Vec<u8>)>,
    dropped: usize,
}

impl Link {
    fn send(&mut self, now: Tick, bytes: Vec<u8>) {
        if STALL.contains(&now) {
            self.dropped += 1;
            return;
        }
        self.in_flight.push_back((now + LAG_TICKS, bytes));
    }

    fn receive(&mut self, now: Tick) -> Vec<Vec<u8>> {
        let mut delivered = Vec::new();
        while self.in_flight.front().is_some_and(|(at, _)| *at <= now) {
            if let Some((_, bytes)) = self.in_flight.pop_front() {
                delivered.push(bytes);
            }
        }
        delivered
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let defs = ProjectileDefs::from_ron_str(include_str!("../projectiles.ron"))?;
    info!(
        capacity = defs.capacity,
        recommended = recommended_capacity(TICK_RATE as f32, (LAG_TICKS + 1) as f32 / TICK_RATE as f32),
        "loaded projectile definitions"
    );

    // Host side: authority and observer of its own shots
    let mut host_rifles = HitscanHandler::from_defs(&defs)?;
    let mut host_bolts = KinematicHandler::from_defs(&defs)?;
    let mut host_clock =
        FixedClock::new(TICK_RATE, SimulationMode::Host)?.with_local_player(HOST);

    // Client side: observer only
    let mut client_rifles = HitscanHandler::from_defs(&defs)?;
    let mut client_bolts = KinematicHandler::from_defs(&defs)?;
    let mut client_clock =
        FixedClock::new(TICK_RATE, SimulationMode::Client)?.with_local_player(CLIENT);
    let mut rifle_timeline: SnapshotTimeline<HitscanData> = SnapshotTimeline::new();
    let mut bolt_timeline: SnapshotTimeline<KinematicData> = SnapshotTimeline::new();

    let rifle = host_rifles.kinds().index_of("rifle").ok_or("rifle is not defined")?;
    let bolt = host_bolts.kinds().index_of("bolt").ok_or("bolt is not defined")?;
    let mut rifle_weapon = Weapon::new(rifle, TICK_RATE as f32);
    let mut bolt_weapon = Weapon::new(bolt, 2.0);

    let mut world = SphereWorld::new();
    world.insert(SphereCollider {
        target: TARGET,
        center: Vec3::new(0.0, 0.0, 30.0),
        radius: 1.0,
        layer: 0,
        owner: Some(CLIENT),
    });
    // The shooter's own body sits on the firing line and is skipped
    world.insert(SphereCollider {
        target: SHOOTER,
        center: Vec3::ZERO,
        radius: 1.0,
        layer: 0,
        owner: Some(HOST),
    });
    let mut health = Health::default();
    health.points.insert(TARGET, 500);

    let mut rifle_link = Link::default();
    let mut bolt_link = Link::default();
    let muzzle = Vec3::new(0.0, 0.0, 0.5);

    for _ in 0..TICKS {
        let tick = host_clock.tick;

        // Authority fixed step
        {
            let mut ctx = ProjectileContext::new(&host_clock, &world, &mut health, HOST);
            // Sweep the aim so some shots miss
            let sway = ((tick % 10) as f32 - 5.0) * 0.02;
            let aim = Vec3::new(sway, 0.0, 1.0);
            let trigger = (30..60).contains(&tick);
            rifle_weapon.try_fire(&mut host_rifles, &mut ctx, trigger, muzzle, aim);
            bolt_weapon.try_fire(&mut host_bolts, &mut ctx, true, muzzle, Vec3::Z);
            host_bolts.fixed_update(&mut ctx);
        }

        // Host renders straight from its own buffers
        let now = host_clock.tick_time();
        host_clock.set_render_times(now, now);
        let render = RenderContext::new(&host_clock, HOST, FRAME_DELTA);
        let rifle_ring = host_rifles.buffer().clone();
        host_rifles.render(&rifle_ring, render);
        let bolt_ring = host_bolts.buffer().clone();
        host_bolts.render(&bolt_ring, render);

        // Replicate
        rifle_link.send(tick, encode_frame(SHOOTER, tick, &rifle_ring.snapshot())?);
        bolt_link.send(tick, encode_frame(SHOOTER, tick, &bolt_ring.snapshot())?);

        // Client receives and renders half a tick behind the newest frame
        client_clock.tick = tick;
        for bytes in rifle_link.receive(tick) {
            let frame = decode_frame::<HitscanData>(&bytes)?;
            rifle_timeline.push(frame.tick, frame.view);
        }
        for bytes in bolt_link.receive(tick) {
            let frame = decode_frame::<KinematicData>(&bytes)?;
            bolt_timeline.push(frame.tick, frame.view);
        }

        let remote_tick = tick.saturating_sub(LAG_TICKS) as f32 - 0.5;
        client_clock.set_render_times(
            tick as f32 / TICK_RATE as f32,
            remote_tick.max(0.0) / TICK_RATE as f32,
        );
        rifle_timeline.set_render_tick(remote_tick);
        bolt_timeline.set_render_tick(remote_tick);

        let render = RenderContext::new(&client_clock, HOST, FRAME_DELTA);
        if let Some(stats) = client_rifles.render(&rifle_timeline, render) {
            if stats.created > 0 || stats.finished > 0 || stats.lost > 0 {
                debug!(tick, ?stats, "client rifle visuals");
            }
        }
        if let Some(stats) = client_bolts.render(&bolt_timeline, render) {
            if stats.created > 0 || stats.finished > 0 {
                debug!(tick, ?stats, "client bolt visuals");
            }
        }

        host_clock.advance();
    }

    info!(
        rifle = ?host_rifles.buffer().stats(),
        bolt = ?host_bolts.buffer().stats(),
        "host buffers"
    );
    info!(
        rifle_dropped = rifle_link.dropped,
        bolt_dropped = bolt_link.dropped,
        "link stall"
    );
    if let Some(points) = health.points.get(&TARGET) {
        info!(entity = %TARGET, points, "target health");
    }

    // The shooter leaves: every remaining client visual goes with it
    rifle_timeline.mark_gone();
    bolt_timeline.mark_gone();
    let render = RenderContext::new(&client_clock, HOST, FRAME_DELTA);
    client_rifles.render(&rifle_timeline, render);
    client_bolts.render(&bolt_timeline, render);
    if !client_rifles.visuals().is_empty() || !client_bolts.visuals().is_empty() {
        warn!("client visuals survived their owner");
    }
    info!("duel finished");

    Ok(())
}
