//! Error types for salvo-netcode

use thiserror::Error;

/// Netcode error type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// No replicated snapshot has arrived yet
    #[error("No snapshot available")]
    MissingSnapshot,

    /// Snapshot contents cannot be read safely
    #[error("Malformed snapshot: {0}")]
    MalformedSnapshot(String),

    /// The entity owning the buffer no longer exists
    #[error("Owning entity was destroyed")]
    EntityGone,

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for netcode operations
pub type Result<T> = std::result::Result<T, Error>;
