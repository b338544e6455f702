//! Salvo Projectiles - Networked hit-scan and kinematic projectiles
//!
//! Projectiles are not networked objects. Each firing entity owns one handler
//! per projectile family, and each handler owns a small replicated ring of
//! event records:
//!
//! - **Authority** (server or host): [`HitscanHandler::spawn_projectile`]
//!   raycasts and writes one record per shot; [`KinematicHandler::spawn_projectile`]
//!   writes a start state that [`KinematicHandler::fixed_update`] advances
//!   every fixed step until it hits something or expires.
//! - **Observers** (host or client): `render` reconciles local visuals with
//!   the replicated views every frame, so each event is presented once even
//!   though the ring is far smaller than the event history.
//!
//! Definitions are authored in RON:
//!
//! ```rust,ignore
//! use salvo_projectiles::{HitscanHandler, KinematicHandler, ProjectileDefs};
//!
//! let defs = ProjectileDefs::load_file("projectiles.ron")?;
//! let mut rifles = HitscanHandler::from_defs(&defs)?;
//! let mut bolts = KinematicHandler::from_defs(&defs)?;
//! ```

pub mod config;
mod error;
pub mod hitscan;
pub mod kinematic;
pub mod kinds;
mod record;
pub mod visual;
mod weapon;

pub use config::{
    recommended_capacity, HandlerConfig, HitscanConfig, KinematicConfig, ProjectileDefs,
    DEFAULT_CAPACITY, MAX_KINDS,
};
pub use error::{Error, Rejected, Result};
pub use hitscan::{HitscanHandler, HitscanProjectile};
pub use kinematic::{KinematicHandler, KinematicProjectile};
pub use kinds::{KindBinding, KindTable, ProjectileKind, VisualHandle};
pub use record::{HitscanData, KinematicData};
pub use visual::{
    HitscanEffects, ImpactEffect, InstanceId, InstanceSlab, KinematicTracers, Tracer,
    VisualFactory,
};
pub use weapon::{Launcher, Weapon};
