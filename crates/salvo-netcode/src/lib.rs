//! Salvo Netcode - Observer-side replication of event buffers
//!
//! This crate turns replicated copies of an entity's event buffer into
//! local visuals:
//!
//! - **Views**: Confirmed and predicted snapshots read each rendered frame
//! - **Timeline**: Two-frame history of received snapshots with interpolation
//! - **Codec**: Bit-exact wire format for buffer frames
//! - **Reconciliation**: Diff-based spawn/render/despawn of visuals
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Observer                               │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────────┐  │
//! │  │ decode_frame │─▶│   Timeline   │─▶│  SnapshotPair    │  │
//! │  └──────────────┘  └──────────────┘  └──────────────────┘  │
//! │                                              │              │
//! │                                              ▼              │
//! │                    ┌──────────────────────────────────┐    │
//! │                    │ VisualReconciler ─▶ VisualBinding │    │
//! │                    └──────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use salvo_netcode::{decode_frame, SnapshotTimeline, ViewProvider, VisualReconciler};
//!
//! let mut timeline = SnapshotTimeline::new();
//! let mut visuals = VisualReconciler::new(0);
//!
//! // Every received packet
//! let frame = decode_frame(&bytes)?;
//! timeline.push(frame.tick, frame.view);
//!
//! // Every rendered frame
//! timeline.set_render_tick(render_tick);
//! if let Ok(views) = timeline.snapshots() {
//!     visuals.reconcile(&views, &mut binding);
//! }
//! ```

mod codec;
mod error;
mod reconciliation;
mod timeline;
mod view;

pub use codec::{decode_frame, encode_frame, DecodedFrame};
pub use error::{Error, Result};
pub use reconciliation::{ReconcileStats, VisualBinding, VisualEntry, VisualReconciler};
pub use timeline::SnapshotTimeline;
pub use view::{SnapshotPair, ViewProvider};

// Re-export buffer types for convenience
pub use salvo_ring_buffer::{EventRing, LogicalIndex, RingView};
