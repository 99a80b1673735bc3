//! Server module for CoreLink
//!
//! Contains the main server initialization and runtime logic.
//!
//! # Module Structure
//!
//! - `config`: Configuration structures for all gateway components
//! - `loader`: Configuration loading from files and environment
//! - `init`: Main server initialization and run loop

pub mod config;
mod init;
mod loader;

pub use config::AppConfig;
pub use init::run;
pub use loader::load_config;
