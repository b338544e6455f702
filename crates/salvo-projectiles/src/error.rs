//! Error types for salvo-projectiles

use thiserror::Error;

/// Definition loading and registration error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("RON parse error: {0}")]
    Ron(#[from] ron::error::SpannedError),

    #[error("Invalid definition: {0}")]
    InvalidDefinition(String),

    #[error("Duplicate definition: {0}")]
    DuplicateDefinition(String),

    #[error("Too many projectile kinds: at most {max} per handler")]
    TooManyKinds { max: usize },
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Why a fire request produced no event
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejected {
    #[error("caller does not hold write authority")]
    NotAuthority,

    #[error("projectile kind {0} is not registered")]
    UnknownKind(u8),
}
