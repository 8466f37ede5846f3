//! Subscriber WebSocket handler (spec.md §4.6 state machine, §6 "Subscriber
//! push protocol").

use crate::repo::clients;
use crate::state::AppState;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

const AUTH_TIMEOUT: Duration = Duration::from_secs(5);
const CLOSE_AUTH_TIMEOUT: u16 = 4001;
const CLOSE_INVALID_KEY: u16 = 4002;
const CLOSE_SHUTDOWN: u16 = 1001;

#[derive(Debug, Deserialize)]
struct AuthFrame {
    action: String,
    api_key: String,
}

pub async fn subscriber_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn close_with_code(socket: &mut WebSocket, code: u16, reason: &str) {
    let _ = socket
        .send(Message::Close(Some(axum::extract::ws::CloseFrame {
            code,
            reason: reason.to_owned().into(),
        })))
        .await;
}

async fn handle_socket(mut socket: WebSocket, state: AppState) {
    let raw_key = match tokio::time::timeout(AUTH_TIMEOUT, socket.recv()).await {
        Ok(Some(Ok(Message::Text(text)))) => match serde_json::from_str::<AuthFrame>(&text) {
            Ok(frame) if frame.action == "auth" => frame.api_key,
            _ => {
                close_with_code(&mut socket, CLOSE_INVALID_KEY, "Invalid API Key").await;
                return;
            }
        },
        Ok(_) => {
            close_with_code(&mut socket, CLOSE_INVALID_KEY, "Invalid API Key").await;
            return;
        }
        Err(_) => {
            let _ = socket
                .send(Message::Close(Some(axum::extract::ws::CloseFrame {
                    code: CLOSE_AUTH_TIMEOUT,
                    reason: "".into(),
                })))
                .await;
            return;
        }
    };

    let client = match clients::lookup_by_key(&state.pool, &raw_key).await {
        Ok(Some(client)) => client,
        _ => {
            let error_frame = serde_json::json!({"status": "error", "message": "Invalid API Key"});
            let _ = socket
                .send(Message::Text(error_frame.to_string()))
                .await;
            close_with_code(&mut socket, CLOSE_INVALID_KEY, "Invalid API Key").await;
            return;
        }
    };

    let welcome = serde_json::json!({"status": "authenticated", "message": "welcome"});
    if socket
        .send(Message::Text(welcome.to_string()))
        .await
        .is_err()
    {
        return;
    }

    let connection_id = Uuid::new_v4();
    let (mut frames, backlog) = state.broadcaster.register(connection_id).await;
    info!(client_id = %client.id, "subscriber authenticated");

    for message in backlog {
        let frame = serde_json::json!({"type": "signal", "data": message});
        if socket
            .send(Message::Text(frame.to_string()))
            .await
            .is_err()
        {
            state.broadcaster.unregister(connection_id).await;
            return;
        }
    }

    let mut shutdown = state.shutdown.clone();
    loop {
        tokio::select! {
            biased;
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    close_with_code(&mut socket, CLOSE_SHUTDOWN, "server shutting down").await;
                    break;
                }
            }
            frame = frames.recv() => {
                match frame {
                    Some(text) => {
                        if socket.send(Message::Text(text)).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(Message::Ping(payload))) => {
                        let _ = socket.send(Message::Pong(payload)).await;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(_)) => break,
                }
            }
        }
    }

    debug!(client_id = %client.id, "subscriber disconnected");
    state.broadcaster.unregister(connection_id).await;
}
