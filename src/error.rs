//! Errors

use std::time::Duration;

/// Result alias used throughout ringq
pub type Result<T> = std::result::Result<T, Error>;

/// Ringq errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The queue was constructed with a capacity of zero or less
    #[error("invalid capacity {0}, the capacity has to be greater than zero")]
    InvalidCapacity(i64),

    /// The requested capacity does not fit in a `usize` on this target
    #[error("capacity {0} is too large for this platform")]
    CapacityOverflow(i64),

    /// No value became available before the deadline.
    /// The queue is left untouched.
    #[error("timed out after {0:?} waiting for a value")]
    Timeout(Duration),

    /// Serde json error
    #[error("failed to deserialize config: {0}")]
    Config(#[from] serde_json::Error),

    /// Io error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True if this is a `Timeout`
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout(_))
    }
}
