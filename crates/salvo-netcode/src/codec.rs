//! Wire format for replicated buffer frames
//!
//! A frame carries one entity's buffer at one tick. Records are encoded with
//! `bincode`, which keeps every field (including float bit patterns) intact.

use crate::{Error, Result};
use salvo_core::{EntityId, EventRecord, Tick};
use salvo_ring_buffer::RingView;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Frame as it travels on the wire
#[derive(Debug, Serialize, Deserialize)]
struct BufferFrame<T> {
    /// Entity owning the buffer
    entity: EntityId,
    /// Server tick for this state
    tick: Tick,
    /// Write count at this tick
    count: u64,
    /// Slots in physical order
    slots: Vec<T>,
}

/// A frame after decoding and validation
#[derive(Debug, Clone)]
pub struct DecodedFrame<T> {
    pub entity: EntityId,
    pub tick: Tick,
    pub view: RingView<T>,
}

/// Encode a buffer view for replication
pub fn encode_frame<T>(entity: EntityId, tick: Tick, view: &RingView<T>) -> Result<Vec<u8>>
where
    T: EventRecord + Serialize,
{
    let frame = BufferFrame {
        entity,
        tick,
        count: view.count(),
        slots: view.slots().to_vec(),
    };
    bincode::serialize(&frame).map_err(|e| Error::Serialization(e.to_string()))
}

/// Decode and validate a replicated frame
pub fn decode_frame<T>(bytes: &[u8]) -> Result<DecodedFrame<T>>
where
    T: EventRecord + DeserializeOwned,
{
    let frame: BufferFrame<T> =
        bincode::deserialize(bytes).map_err(|e| Error::Serialization(e.to_string()))?;
    let view = RingView::from_parts(frame.slots, frame.count)
        .ok_or_else(|| Error::MalformedSnapshot("frame has no slots".to_string()))?;
    Ok(DecodedFrame {
        entity: frame.entity,
        tick: frame.tick,
        view,
    })
}
