//! Projectile definitions and their RON loader
//!
//! ```ron
//! (
//!     capacity: 64,
//!     hitscan: [ (name: "rifle", max_distance: 100.0, damage: 10) ],
//!     kinematic: [ (name: "bolt", speed: 40.0, max_distance: 200.0, max_time: 3.0) ],
//! )
//! ```

use crate::error::{Error, Result};
use salvo_core::HitMask;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Default number of slots in a handler's event buffer
pub const DEFAULT_CAPACITY: usize = 64;

/// Most kinds a single handler can dispatch (kind indices are `u8`)
pub const MAX_KINDS: usize = u8::MAX as usize + 1;

fn default_capacity() -> usize {
    DEFAULT_CAPACITY
}

fn default_max_distance() -> f32 {
    100.0
}

fn default_display_time() -> f32 {
    1.0
}

/// Settings for one projectile handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerConfig {
    /// Slots in the replicated event buffer
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

impl HandlerConfig {
    pub fn new(capacity: usize) -> Self {
        Self { capacity }
    }
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// An instantaneous projectile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HitscanConfig {
    pub name: String,
    /// Ray length
    #[serde(default = "default_max_distance")]
    pub max_distance: f32,
    #[serde(default)]
    pub damage: u8,
    #[serde(default)]
    pub hit_mask: HitMask,
    /// Seconds the impact effect stays visible
    #[serde(default = "default_display_time")]
    pub display_time: f32,
}

impl HitscanConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            max_distance: default_max_distance(),
            damage: 0,
            hit_mask: HitMask::ALL,
            display_time: default_display_time(),
        }
    }

    pub fn with_max_distance(mut self, max_distance: f32) -> Self {
        self.max_distance = max_distance;
        self
    }

    pub fn with_damage(mut self, damage: u8) -> Self {
        self.damage = damage;
        self
    }

    pub fn with_hit_mask(mut self, hit_mask: HitMask) -> Self {
        self.hit_mask = hit_mask;
        self
    }

    pub fn with_display_time(mut self, display_time: f32) -> Self {
        self.display_time = display_time;
        self
    }

    fn validate(&self) -> Result<()> {
        // Negated comparisons also reject NaN
        if !(self.max_distance > 0.0) {
            return Err(Error::InvalidDefinition(format!(
                "hitscan '{}': max_distance must be positive",
                self.name
            )));
        }
        if !(self.display_time >= 0.0) {
            return Err(Error::InvalidDefinition(format!(
                "hitscan '{}': display_time must not be negative",
                self.name
            )));
        }
        Ok(())
    }
}

/// A projectile that travels along a straight line over several ticks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KinematicConfig {
    pub name: String,
    /// Units per second
    pub speed: f32,
    /// Range limit; 0 for none
    #[serde(default)]
    pub max_distance: f32,
    /// Flight time limit in seconds; 0 for none
    #[serde(default)]
    pub max_time: f32,
    #[serde(default)]
    pub damage: u8,
    #[serde(default)]
    pub hit_mask: HitMask,
}

impl KinematicConfig {
    pub fn new(name: impl Into<String>, speed: f32) -> Self {
        Self {
            name: name.into(),
            speed,
            max_distance: 0.0,
            max_time: 0.0,
            damage: 0,
            hit_mask: HitMask::ALL,
        }
    }

    pub fn with_max_distance(mut self, max_distance: f32) -> Self {
        self.max_distance = max_distance;
        self
    }

    pub fn with_max_time(mut self, max_time: f32) -> Self {
        self.max_time = max_time;
        self
    }

    pub fn with_damage(mut self, damage: u8) -> Self {
        self.damage = damage;
        self
    }

    pub fn with_hit_mask(mut self, hit_mask: HitMask) -> Self {
        self.hit_mask = hit_mask;
        self
    }

    /// Lifetime in ticks at `tick_rate`
    ///
    /// The shorter of the range and time limits when both are set,
    /// otherwise whichever is set.
    pub fn lifetime_ticks(&self, tick_rate: u32) -> u64 {
        let rate = tick_rate as f32;
        let by_distance = if self.speed > 0.0 {
            (self.max_distance / self.speed * rate).round()
        } else {
            0.0
        };
        let by_time = (self.max_time * rate).round();

        let ticks = match (by_distance > 0.0, by_time > 0.0) {
            (true, true) => by_distance.min(by_time),
            (true, false) => by_distance,
            _ => by_time,
        };
        ticks.max(0.0) as u64
    }

    fn validate(&self) -> Result<()> {
        if !(self.speed > 0.0) {
            return Err(Error::InvalidDefinition(format!(
                "kinematic '{}': speed must be positive",
                self.name
            )));
        }
        if !(self.max_distance >= 0.0) || !(self.max_time >= 0.0) {
            return Err(Error::InvalidDefinition(format!(
                "kinematic '{}': max_distance and max_time must not be negative",
                self.name
            )));
        }
        if self.max_distance == 0.0 && self.max_time == 0.0 {
            return Err(Error::InvalidDefinition(format!(
                "kinematic '{}': needs a max_distance or a max_time",
                self.name
            )));
        }
        Ok(())
    }
}

/// Every projectile definition for one game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectileDefs {
    /// Buffer capacity shared by both handlers
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    #[serde(default)]
    pub hitscan: Vec<HitscanConfig>,
    #[serde(default)]
    pub kinematic: Vec<KinematicConfig>,
}

impl ProjectileDefs {
    /// Parse and validate definitions from a RON string
    pub fn from_ron_str(content: &str) -> Result<Self> {
        let defs: ProjectileDefs = ron::from_str(content)?;
        defs.validate()?;
        Ok(defs)
    }

    /// Load and validate definitions from a RON file
    pub fn load_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_ron_str(&content)
    }

    /// Handler settings derived from these definitions
    pub fn handler_config(&self) -> HandlerConfig {
        HandlerConfig::new(self.capacity)
    }

    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(Error::InvalidDefinition(
                "capacity must be greater than 0".to_string(),
            ));
        }

        if self.hitscan.len() > MAX_KINDS || self.kinematic.len() > MAX_KINDS {
            return Err(Error::TooManyKinds { max: MAX_KINDS });
        }

        let mut names = HashSet::new();
        for def in &self.hitscan {
            def.validate()?;
            if !names.insert(def.name.as_str()) {
                return Err(Error::DuplicateDefinition(format!("hitscan '{}'", def.name)));
            }
        }

        let mut names = HashSet::new();
        for def in &self.kinematic {
            def.validate()?;
            if !names.insert(def.name.as_str()) {
                return Err(Error::DuplicateDefinition(format!(
                    "kinematic '{}'",
                    def.name
                )));
            }
        }

        Ok(())
    }
}

impl Default for ProjectileDefs {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            hitscan: Vec::new(),
            kinematic: Vec::new(),
        }
    }
}

/// Smallest capacity that keeps every event observable
///
/// An observer loses events once more than `capacity` are written between
/// two of its frames, so the buffer must hold every event fired during the
/// worst expected replication delay.
pub fn recommended_capacity(fire_rate_hz: f32, max_lag_secs: f32) -> usize {
    let events = (fire_rate_hz.max(0.0) * max_lag_secs.max(0.0)).ceil();
    (events as usize).max(1)
}
