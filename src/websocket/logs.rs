//! Container log streaming WebSocket handler.
//!
//! Opens a tail+follow log source for one container and forwards bridge
//! items as events. Open failure sends a single error event and closes; a
//! mid-stream failure sends one terminal error event; normal exhaustion just
//! closes. Client disconnect drops the bridge receiver, which stops the
//! worker between chunks.

use std::sync::Arc;

use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::Path,
    response::IntoResponse,
    Extension,
};
use serde::Serialize;
use tracing::{info, warn};

use corelink_docker::{DockerError, DockerService, LogItem, LogStreamBridge};

use crate::server::AppConfig;

/// Log event to client
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LogEvent {
    /// One decoded log line
    LogLine { container: String, data: String },
    /// Terminal failure for this session
    Error {
        #[serde(skip_serializing_if = "Option::is_none")]
        container: Option<String>,
        data: String,
    },
}

/// WebSocket upgrade handler
pub async fn logs_handler(
    ws: WebSocketUpgrade,
    Path(container_id): Path<String>,
    Extension(config): Extension<Arc<AppConfig>>,
    Extension(docker): Extension<Arc<DockerService>>,
    Extension(bridge): Extension<Arc<LogStreamBridge>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, container_id, config, docker, bridge))
}

async fn handle_socket(
    mut socket: WebSocket,
    container_id: String,
    config: Arc<AppConfig>,
    docker: Arc<DockerService>,
    bridge: Arc<LogStreamBridge>,
) {
    info!(container = %container_id, "log session established");

    let source = match docker.open_log_source(&container_id, config.logs.tail).await {
        Ok(source) => source,
        Err(e) => {
            let data = match &e {
                DockerError::NotFound(id) => format!("Container '{id}' not found."),
                DockerError::Unavailable(_) => "Docker service is not available.".to_string(),
                other => format!("Docker error for '{container_id}': {other}"),
            };
            let _ = send(&mut socket, &LogEvent::Error {
                container: None,
                data,
            })
            .await;
            let _ = socket.send(Message::Close(None)).await;
            return;
        }
    };

    let mut items = bridge.spawn(source);

    loop {
        tokio::select! {
            item = items.recv() => {
                match item {
                    Some(LogItem::Line(line)) => {
                        if send(&mut socket, &LogEvent::LogLine {
                            container: container_id.clone(),
                            data: line,
                        })
                        .await
                        .is_err()
                        {
                            break;
                        }
                    }
                    Some(LogItem::Error(message)) => {
                        let _ = send(&mut socket, &LogEvent::Error {
                            container: Some(container_id.clone()),
                            data: format!("Log stream interrupted: {message}"),
                        })
                        .await;
                        break;
                    }
                    Some(LogItem::Eof) | None => break,
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(container = %container_id, error = %e, "log session socket error");
                        break;
                    }
                }
            }
        }
    }

    info!(container = %container_id, "log session ended");
}

async fn send(socket: &mut WebSocket, event: &LogEvent) -> Result<(), ()> {
    let json = serde_json::to_string(event).map_err(|_| ())?;
    socket.send(Message::Text(json)).await.map_err(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_line_event_carries_container_and_data() {
        let json = serde_json::to_string(&LogEvent::LogLine {
            container: "abc123".to_string(),
            data: "hello\n".to_string(),
        })
        .unwrap();
        assert!(json.contains("\"type\":\"log_line\""));
        assert!(json.contains("\"container\":\"abc123\""));
    }

    #[test]
    fn error_event_omits_container_when_absent() {
        let json = serde_json::to_string(&LogEvent::Error {
            container: None,
            data: "Container 'x' not found.".to_string(),
        })
        .unwrap();
        assert!(json.contains("\"type\":\"error\""));
        assert!(!json.contains("\"container\""));
    }
}
