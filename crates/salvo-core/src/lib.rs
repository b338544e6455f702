//! Salvo Core - Shared contracts for replicated projectile events
//!
//! This crate provides the types every other salvo crate builds on:
//! - Tick-based time (`Tick`, `SimClock`, `FixedClock`, `TickTimer`)
//! - Identities for networked entities and players
//! - The historical collision query contract and an in-memory `SphereWorld`
//! - The hit resolution contract
//! - Fire and render contexts handed to projectile behaviour
//! - The `EventRecord` trait implemented by every replicated record
//!
//! ## Authority
//!
//! Only the authoritative side writes projectile events. Every peer that
//! presents visuals (hosts and clients) reads replicated snapshots:
//!
//! ```text
//! Server / Host (authority)          Host / Client (observers)
//!  ┌──────────┐   ┌────────┐          ┌──────────────┐
//!  │ Producer │──▶│ Buffer │══views══▶│ Reconciliation│──▶ visuals
//!  └──────────┘   └────────┘          └──────────────┘
//!                     ▲
//!                ┌────┴─────┐
//!                │ Advancer │  (fixed step)
//!                └──────────┘
//! ```

pub mod collision;
mod context;
mod error;
mod hit;
mod identity;
mod record;
pub mod time;

pub use collision::{
    HistoricalRaycast, HitMask, HitOptions, RaycastHit, RaycastQuery, SphereCollider, SphereWorld,
};
pub use context::{ProjectileContext, RenderContext};
pub use error::{Error, Result};
pub use hit::{HitData, HitResolver, NoHits};
pub use identity::{EntityId, PlayerRef};
pub use record::EventRecord;
pub use time::{FixedClock, SimClock, SimulationMode, Tick, TickTimer, UNSET_TICK};

// Vector type used across the public API
pub use glam::Vec3;
