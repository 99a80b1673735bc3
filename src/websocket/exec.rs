//! Command execution WebSocket handler.
//!
//! One session accepts any number of commands, sequentially. Policy
//! rejections and spawn failures arrive as ordinary output lines, so the
//! session survives them; only client disconnect (or a socket fault) ends it.

use std::sync::Arc;

use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    response::IntoResponse,
    Extension,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use corelink_host::HostRunner;

/// Command request from client
#[derive(Debug, Deserialize)]
pub struct ExecRequest {
    #[serde(default)]
    pub command: String,
}

/// Execution event to client
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExecEvent {
    /// Command accepted, output follows
    ExecStart { command: String },
    /// One output line
    ExecOutput { data: String },
    /// Output finished for this command
    ExecDone { command: String },
    /// Malformed or empty request
    ExecError { data: String },
}

/// WebSocket upgrade handler
pub async fn exec_handler(
    ws: WebSocketUpgrade,
    Extension(runner): Extension<Arc<HostRunner>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, runner))
}

async fn handle_socket(mut socket: WebSocket, runner: Arc<HostRunner>) {
    let session_id = Uuid::new_v4();
    info!(%session_id, "exec session established");

    loop {
        let msg = match socket.recv().await {
            Some(Ok(msg)) => msg,
            Some(Err(e)) => {
                warn!(%session_id, error = %e, "exec session socket error");
                break;
            }
            None => break,
        };

        match msg {
            Message::Text(text) => {
                let command = match serde_json::from_str::<ExecRequest>(&text) {
                    Ok(req) => req.command.trim().to_string(),
                    Err(e) => {
                        if send(&mut socket, &ExecEvent::ExecError {
                            data: format!("Invalid message format: {e}"),
                        })
                        .await
                        .is_err()
                        {
                            break;
                        }
                        continue;
                    }
                };

                if command.is_empty() {
                    if send(&mut socket, &ExecEvent::ExecError {
                        data: "Empty command".to_string(),
                    })
                    .await
                    .is_err()
                    {
                        break;
                    }
                    continue;
                }

                if run_command(&mut socket, &runner, &command).await.is_err() {
                    break;
                }
            }
            Message::Ping(data) => {
                if socket.send(Message::Pong(data)).await.is_err() {
                    break;
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    info!(%session_id, "exec session ended");
}

/// Stream one command's lines to the client. `Err` means the socket is gone.
async fn run_command(
    socket: &mut WebSocket,
    runner: &HostRunner,
    command: &str,
) -> Result<(), ()> {
    debug!(command, "executing host command");

    send(socket, &ExecEvent::ExecStart {
        command: command.to_string(),
    })
    .await?;

    let mut lines = runner.run(command);
    while let Some(line) = lines.recv().await {
        send(socket, &ExecEvent::ExecOutput { data: line }).await?;
    }

    send(socket, &ExecEvent::ExecDone {
        command: command.to_string(),
    })
    .await
}

async fn send(socket: &mut WebSocket, event: &ExecEvent) -> Result<(), ()> {
    let json = serde_json::to_string(event).map_err(|_| ())?;
    socket.send(Message::Text(json)).await.map_err(|_| ())
}
