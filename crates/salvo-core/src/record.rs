//! Replicated event records

use std::fmt::Debug;

/// A fixed-size record stored in a replicated event buffer
///
/// Records are plain values: `Default` is the content of a slot that was
/// never written.
pub trait EventRecord: Copy + Default + Debug {
    /// Index into the owning entity's projectile table
    fn kind(&self) -> u8;

    /// Whether the event has completed on the authoritative side
    fn is_finished(&self) -> bool {
        false
    }
}
