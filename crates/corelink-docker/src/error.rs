//! Error types for corelink-docker

use thiserror::Error;

/// Docker collaborator error type
#[derive(Debug, Error)]
pub enum DockerError {
    /// The Docker client could not be constructed or the daemon is gone
    #[error("docker is not available: {0}")]
    Unavailable(String),

    /// The requested container does not exist
    #[error("container '{0}' not found")]
    NotFound(String),

    /// The Docker API rejected the request
    #[error("docker API error: {0}")]
    Api(String),

    /// The log stream failed mid-read
    #[error("log stream interrupted: {0}")]
    Stream(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, DockerError>;
