//! Identity types for networked entities and players

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a networked entity (hit targets, weapon owners)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl EntityId {
    /// Create a new entity ID
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entity:{}", self.0)
    }
}

/// A connected player
///
/// The player holding input authority over a weapon is the instigator of
/// every projectile that weapon fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerRef(pub u32);

impl PlayerRef {
    /// Create a new player reference
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw player index
    pub fn raw(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for PlayerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player:{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id() {
        let id = EntityId::new(42);
        assert_eq!(id.raw(), 42);
        assert_eq!(format!("{}", id), "entity:42");
    }

    #[test]
    fn test_player_ref() {
        let player = PlayerRef::new(3);
        assert_eq!(player.raw(), 3);
        assert_eq!(format!("{}", player), "player:3");
    }

    #[test]
    fn test_player_ref_ron_is_transparent() {
        let text = ron::to_string(&PlayerRef::new(7)).unwrap();
        assert_eq!(text, "7");
        let back: PlayerRef = ron::from_str(&text).unwrap();
        assert_eq!(back, PlayerRef::new(7));
    }
}
