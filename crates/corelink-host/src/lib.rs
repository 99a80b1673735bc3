//! Host-namespace command execution for CoreLink.
//!
//! CoreLink runs inside a container started with `--pid=host`; everything an
//! operator executes is re-entered into the host's namespaces via `nsenter`.
//! This crate owns the safety policy deciding which commands may run, the
//! preset command catalog, and the runner that spawns a validated command and
//! streams its output lines.

pub mod error;
pub mod nsenter;
pub mod policy;
pub mod presets;
pub mod runner;

pub use error::{Error, Result};
pub use nsenter::{run_host_capture, NSENTER_PREFIX};
pub use policy::{ExecPolicy, Validation};
pub use presets::{preset_catalog, CommandPreset};
pub use runner::HostRunner;
