//! Host metrics collection for CoreLink.
//!
//! With `--pid=host` the container's `/proc` is the host's, so system stats
//! are read straight from procfs. GPU stats come from `nvidia-smi` run in the
//! host namespaces, parsed from CSV.

pub mod gpu;
pub mod system;

pub use gpu::{GpuDevice, GpuService};
pub use system::{SystemMonitor, SystemStats};
