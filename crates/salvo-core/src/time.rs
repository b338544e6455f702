//! Time system for the fixed simulation step
//!
//! Provides discrete time management for the authoritative simulation:
//! - `Tick` - Logical time unit (one fixed simulation step)
//! - `SimulationMode` - Which roles this peer plays
//! - `SimClock` - Read access to the simulation clock
//! - `FixedClock` - A clock driven explicitly by the caller
//! - `TickTimer` - Countdown measured in ticks

use crate::{Error, PlayerRef, Result};
use serde::{Deserialize, Serialize};

/// A discrete tick identifier (logical time unit)
pub type Tick = u64;

/// Tick value of a record slot that was never written
///
/// Simulation ticks start at 1, so no fired projectile carries this value.
pub const UNSET_TICK: Tick = 0;

/// Role of this peer in the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SimulationMode {
    /// Dedicated server: authoritative, presents nothing
    Server,
    /// Server with a local player: authoritative and presenting
    #[default]
    Host,
    /// Remote peer: presents replicated state only
    Client,
}

impl SimulationMode {
    /// Whether this peer may write projectile events
    pub fn is_authority(&self) -> bool {
        matches!(self, SimulationMode::Server | SimulationMode::Host)
    }

    /// Whether this peer renders visuals
    pub fn presents_visuals(&self) -> bool {
        !matches!(self, SimulationMode::Server)
    }
}

/// Read access to the simulation clock
///
/// Render times are expressed in seconds since tick 0, so dividing by
/// [`SimClock::delta_time`] yields a fractional tick.
pub trait SimClock {
    /// Current simulation tick
    fn tick(&self) -> Tick;

    /// Fixed steps per second
    fn tick_rate(&self) -> u32;

    /// Duration of one fixed step in seconds
    fn delta_time(&self) -> f32 {
        1.0 / self.tick_rate() as f32
    }

    /// Role of this peer
    fn mode(&self) -> SimulationMode;

    /// Whether this peer holds write authority
    fn is_authority(&self) -> bool {
        self.mode().is_authority()
    }

    /// The player controlled on this peer, if any
    fn local_player(&self) -> Option<PlayerRef>;

    /// Render time for objects this peer predicts locally
    fn local_render_time(&self) -> f32;

    /// Render time for objects driven by remote state
    fn remote_render_time(&self) -> f32;
}

/// Simulation clock advanced explicitly by its owner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixedClock {
    /// Current tick number
    pub tick: Tick,
    /// Fixed steps per second
    tick_rate: u32,
    /// Role of this peer
    pub mode: SimulationMode,
    /// Player controlled on this peer
    pub local_player: Option<PlayerRef>,
    /// Render time of locally predicted objects (seconds)
    pub local_render_time: f32,
    /// Render time of remote objects (seconds)
    pub remote_render_time: f32,
}

impl FixedClock {
    /// Create a clock at the first simulation tick
    pub fn new(tick_rate: u32, mode: SimulationMode) -> Result<Self> {
        if tick_rate == 0 {
            return Err(Error::InvalidTickRate(tick_rate));
        }
        Ok(Self {
            tick: 1,
            tick_rate,
            mode,
            local_player: None,
            local_render_time: 0.0,
            remote_render_time: 0.0,
        })
    }

    /// Set the player controlled on this peer
    pub fn with_local_player(mut self, player: PlayerRef) -> Self {
        self.local_player = Some(player);
        self
    }

    /// Advance to the next tick
    pub fn advance(&mut self) {
        self.tick += 1;
    }

    /// Update both render clocks
    pub fn set_render_times(&mut self, local: f32, remote: f32) {
        self.local_render_time = local;
        self.remote_render_time = remote;
    }

    /// Time of the current tick in seconds
    pub fn tick_time(&self) -> f32 {
        self.tick as f32 * self.delta_time()
    }
}

impl SimClock for FixedClock {
    fn tick(&self) -> Tick {
        self.tick
    }

    fn tick_rate(&self) -> u32 {
        self.tick_rate
    }

    fn mode(&self) -> SimulationMode {
        self.mode
    }

    fn local_player(&self) -> Option<PlayerRef> {
        self.local_player
    }

    fn local_render_time(&self) -> f32 {
        self.local_render_time
    }

    fn remote_render_time(&self) -> f32 {
        self.remote_render_time
    }
}

/// Countdown that expires at a target tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickTimer {
    target: Option<Tick>,
}

impl TickTimer {
    /// A timer that is not running
    pub const NONE: TickTimer = TickTimer { target: None };

    /// Create a timer expiring `ticks` steps from now
    pub fn from_ticks(clock: &dyn SimClock, ticks: u64) -> Self {
        Self {
            target: Some(clock.tick().saturating_add(ticks)),
        }
    }

    /// Create a timer expiring after `seconds`, rounded up to whole ticks
    pub fn from_seconds(clock: &dyn SimClock, seconds: f32) -> Self {
        let ticks = (seconds.max(0.0) * clock.tick_rate() as f32).ceil() as u64;
        Self::from_ticks(clock, ticks)
    }

    /// Whether the timer has a target
    pub fn is_running(&self) -> bool {
        self.target.is_some()
    }

    /// Whether the timer is running and its target tick has been reached
    pub fn expired(&self, clock: &dyn SimClock) -> bool {
        self.target.is_some_and(|target| clock.tick() >= target)
    }

    /// Whether the timer has expired or was never started
    pub fn expired_or_not_running(&self, clock: &dyn SimClock) -> bool {
        self.target.is_none() || self.expired(clock)
    }

    /// Ticks left until expiry, if running
    pub fn remaining_ticks(&self, clock: &dyn SimClock) -> Option<u64> {
        self.target.map(|target| target.saturating_sub(clock.tick()))
    }
}
