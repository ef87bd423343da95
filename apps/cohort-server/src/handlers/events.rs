//! WebSocket relay: one socket per client per classroom room.
//!
//! Each event goes out as a JSON text frame `{"event": "...", "data": ...}`.
//! Nothing is replayed on connect; clients fetch full state first and then
//! apply pushes, re-fetching on a `resync` notification.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use cohort_events::EventStream;
use cohort_storage::{ClassroomId, StoreError};
use futures::StreamExt;

use super::{require_member, ApiPath};
use crate::auth::Actor;
use crate::error::ApiError;
use crate::server::CohortServer;
use crate::service::ServiceError;

pub async fn subscribe(
    State(server): State<CohortServer>,
    actor: Actor,
    ApiPath(classroom_id): ApiPath<ClassroomId>,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    require_member(&server, &actor, &classroom_id).await?;

    // Subscribe before upgrading so nothing published after the handshake is missed.
    let events = server
        .events
        .subscribe(&classroom_id)
        .await
        .map_err(|e| ServiceError::Store(StoreError::Backend(e.to_string())))?;

    let user_id = actor.user_id;
    Ok(ws.on_upgrade(move |socket| async move {
        tracing::debug!(classroom_id = %classroom_id, user_id = %user_id, "subscriber joined room");
        relay(socket, events).await;
        tracing::debug!(classroom_id = %classroom_id, user_id = %user_id, "subscriber left room");
    }))
}

async fn relay(mut socket: WebSocket, mut events: EventStream) {
    loop {
        tokio::select! {
            event = events.next() => {
                let Some(event) = event else { break };
                let text = match serde_json::to_string(&event) {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::warn!(event = event.name(), error = %e, "failed to encode event");
                        continue;
                    }
                };
                if socket.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Ping(data))) => {
                    if socket.send(Message::Pong(data)).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                // Clients don't send commands over this socket.
                Some(Ok(_)) => {}
            },
        }
    }
}
