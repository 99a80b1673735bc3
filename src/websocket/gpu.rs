//! GPU stats push WebSocket handler.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    response::IntoResponse,
    Extension,
};
use serde::Serialize;
use tracing::info;

use corelink_metrics::{GpuDevice, GpuService};

const PUSH_INTERVAL: Duration = Duration::from_secs(2);

/// GPU stats event to client
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GpuEvent {
    GpuStats { data: Vec<GpuDevice> },
}

/// WebSocket upgrade handler
pub async fn gpu_handler(
    ws: WebSocketUpgrade,
    Extension(gpu): Extension<Arc<GpuService>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, gpu))
}

async fn handle_socket(mut socket: WebSocket, gpu: Arc<GpuService>) {
    info!("gpu stats session established");
    let mut interval = tokio::time::interval(PUSH_INTERVAL);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let event = GpuEvent::GpuStats {
                    data: gpu.snapshot().await,
                };
                let Ok(json) = serde_json::to_string(&event) else {
                    break;
                };
                if socket.send(Message::Text(json)).await.is_err() {
                    break;
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    info!("gpu stats session ended");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gpu_stats_event_tag() {
        let json = serde_json::to_string(&GpuEvent::GpuStats { data: Vec::new() }).unwrap();
        assert!(json.contains("\"type\":\"gpu_stats\""));
        assert!(json.contains("\"data\":[]"));
    }
}
