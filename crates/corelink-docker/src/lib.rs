//! Docker integration for CoreLink.
//!
//! Two halves: a thin collaborator around the Docker Engine API (container
//! listing, opening a log source), and the [`bridge`] that turns the
//! blocking, chunked log source into a backpressured, line-oriented feed for
//! a single async consumer.

pub mod bridge;
pub mod error;
pub mod service;

pub use bridge::{ChunkSource, LineBuffer, LogItem, LogStreamBridge};
pub use error::{DockerError, Result};
pub use service::{ContainerInfo, DockerLogSource, DockerService};
