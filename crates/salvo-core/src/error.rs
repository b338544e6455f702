//! Error types for salvo-core

use thiserror::Error;

/// Core error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid tick rate: {0} (must be greater than 0)")]
    InvalidTickRate(u32),

    #[error("Unknown projectile kind: {0}")]
    UnknownKind(u8),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
