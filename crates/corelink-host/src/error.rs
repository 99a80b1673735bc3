//! Error types for corelink-host

use thiserror::Error;

/// Host execution error type
#[derive(Debug, Error)]
pub enum Error {
    /// Spawning the host process failed
    #[error("failed to spawn host process: {0}")]
    Spawn(String),

    /// The host process exceeded its time budget
    #[error("timeout after {0}s")]
    Timeout(u64),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
