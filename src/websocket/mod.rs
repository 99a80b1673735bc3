//! WebSocket module for CoreLink
//!
//! Provides real-time endpoints:
//! - /ws/exec - host command execution with streamed output
//! - /ws/logs/:container_id - live container log tailing
//! - /ws/gpu - periodic GPU stats push

pub mod exec;
pub mod gpu;
pub mod logs;

pub use exec::exec_handler;
pub use gpu::gpu_handler;
pub use logs::logs_handler;

use axum::{routing::get, Router};

/// Create the WebSocket router
pub fn websocket_router() -> Router {
    Router::new()
        .route("/ws/exec", get(exec_handler))
        .route("/ws/logs/:container_id", get(logs_handler))
        .route("/ws/gpu", get(gpu_handler))
}
