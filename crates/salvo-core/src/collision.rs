//! Historical collision queries
//!
//! Projectiles query world state as it was when the instigator acted
//! (lag compensation). The query itself is an external service; this module
//! defines its contract and a small sphere-based world for tests and demos.

use crate::{EntityId, PlayerRef};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Bit mask of collision layers a query may hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HitMask(pub u32);

impl HitMask {
    /// Every layer
    pub const ALL: HitMask = HitMask(u32::MAX);
    /// No layer
    pub const NONE: HitMask = HitMask(0);

    /// Mask containing a single layer (0..32)
    pub fn layer(layer: u8) -> Self {
        HitMask(1u32.checked_shl(layer as u32).unwrap_or(0))
    }

    /// Whether `layer` is part of this mask
    pub fn contains_layer(&self, layer: u8) -> bool {
        self.0 & Self::layer(layer).0 != 0
    }
}

impl Default for HitMask {
    fn default() -> Self {
        HitMask::ALL
    }
}

/// Query flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HitOptions {
    /// Resolve hits between fixed steps using interpolated history
    pub subtick_accuracy: bool,
    /// Skip colliders owned by the querying player
    pub ignore_input_authority: bool,
}

impl HitOptions {
    /// Options for instantaneous shots
    pub const HITSCAN: HitOptions = HitOptions {
        subtick_accuracy: false,
        ignore_input_authority: true,
    };

    /// Options for per-step kinematic segments
    pub const KINEMATIC: HitOptions = HitOptions {
        subtick_accuracy: true,
        ignore_input_authority: true,
    };
}

/// A ray against historical world state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastQuery {
    pub origin: Vec3,
    /// Direction of travel, normalised by the implementation
    pub direction: Vec3,
    pub max_distance: f32,
    /// Player whose colliders are skipped
    pub ignore: Option<PlayerRef>,
    pub mask: HitMask,
    pub options: HitOptions,
}

/// Nearest hit along a ray
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastHit {
    pub point: Vec3,
    pub normal: Vec3,
    pub target: EntityId,
    pub distance: f32,
}

/// Lag-compensated raycast against historical world state
///
/// Implementations must be side-effect free.
pub trait HistoricalRaycast {
    /// Return the nearest hit along the query ray, if any
    fn raycast(&self, query: &RaycastQuery) -> Option<RaycastHit>;
}

/// A sphere collider registered in a [`SphereWorld`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SphereCollider {
    pub target: EntityId,
    pub center: Vec3,
    pub radius: f32,
    /// Collision layer (0..32)
    pub layer: u8,
    /// Player controlling this collider, if any
    pub owner: Option<PlayerRef>,
}

/// In-memory world of static sphere colliders
///
/// The world does not move, so every tick of its history is identical and
/// current-state queries are already historically exact.
#[derive(Debug, Clone, Default)]
pub struct SphereWorld {
    colliders: Vec<SphereCollider>,
}

impl SphereWorld {
    /// Create an empty world
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a collider
    pub fn insert(&mut self, collider: SphereCollider) {
        self.colliders.push(collider);
    }

    /// Remove every collider belonging to `target`
    pub fn remove(&mut self, target: EntityId) {
        self.colliders.retain(|c| c.target != target);
    }

    /// All colliders
    pub fn colliders(&self) -> &[SphereCollider] {
        &self.colliders
    }

    pub fn len(&self) -> usize {
        self.colliders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colliders.is_empty()
    }

    /// Distance along a normalised ray to the entry point of a sphere
    fn ray_sphere(origin: Vec3, dir: Vec3, center: Vec3, radius: f32) -> Option<f32> {
        let m = origin - center;
        let b = m.dot(dir);
        let c = m.dot(m) - radius * radius;
        // Outside and pointing away
        if c > 0.0 && b > 0.0 {
            return None;
        }
        let disc = b * b - c;
        if disc < 0.0 {
            return None;
        }
        Some((-b - disc.sqrt()).max(0.0))
    }
}

impl HistoricalRaycast for SphereWorld {
    fn raycast(&self, query: &RaycastQuery) -> Option<RaycastHit> {
        let dir = query.direction.normalize_or_zero();
        if dir == Vec3::ZERO || query.max_distance <= 0.0 {
            return None;
        }

        let mut nearest: Option<RaycastHit> = None;
        for collider in &self.colliders {
            if !query.mask.contains_layer(collider.layer) {
                continue;
            }
            if query.options.ignore_input_authority
                && query.ignore.is_some()
                && collider.owner == query.ignore
            {
                continue;
            }

            let Some(distance) = Self::ray_sphere(query.origin, dir, collider.center, collider.radius)
            else {
                continue;
            };
            if distance > query.max_distance {
                continue;
            }
            if nearest.is_some_and(|hit| hit.distance <= distance) {
                continue;
            }

            let point = query.origin + dir * distance;
            let normal = (point - collider.center).try_normalize().unwrap_or(-dir);
            nearest = Some(RaycastHit {
                point,
                normal,
                target: collider.target,
                distance,
            });
        }
        nearest
    }
}
