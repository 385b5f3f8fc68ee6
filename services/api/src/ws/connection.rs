//! WebSocket connection lifecycle
//!
//! One task per connection multiplexes two sources: frames arriving from
//! the client and broadcast frames from the rooms the client has joined.

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt, stream::SplitSink};
use tokio_stream::{StreamMap, wrappers::BroadcastStream};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    routes::messages::{ChatAccess, chat_access},
    state::AppState,
    validation,
    ws::{ClientEvent, ServerEvent},
};

type RoomStreams = StreamMap<Uuid, BroadcastStream<std::sync::Arc<ServerEvent>>>;

pub async fn handle_socket(socket: WebSocket, state: AppState, user_id: Uuid) {
    debug!(%user_id, "websocket connected");

    let (mut ws_tx, mut ws_rx) = socket.split();
    let mut rooms: RoomStreams = StreamMap::new();

    loop {
        tokio::select! {
            incoming = ws_rx.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientEvent>(&text) {
                            Ok(event) => {
                                handle_client_event(&state, user_id, event, &mut rooms).await;
                            }
                            Err(_) => debug!(%user_id, "unparseable client frame"),
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {} // pings are answered by axum
                    Some(Err(e)) => {
                        warn!(%user_id, error = %e, "websocket error");
                        break;
                    }
                }
            }

            Some((_, frame)) = tokio_stream::StreamExt::next(&mut rooms), if !rooms.is_empty() => {
                let Ok(frame) = frame else { continue }; // lagged receiver, skip
                if !forward_frame(&mut ws_tx, user_id, &frame).await {
                    break;
                }
            }
        }
    }

    debug!(%user_id, "websocket disconnected");
}

/// Send a room frame to this client; typing indicators skip their sender
async fn forward_frame(
    ws_tx: &mut SplitSink<WebSocket, Message>,
    user_id: Uuid,
    frame: &ServerEvent,
) -> bool {
    if let ServerEvent::UserTyping { user_id: sender, .. } = frame {
        if *sender == user_id {
            return true;
        }
    }

    let Ok(json) = serde_json::to_string(frame) else {
        return true;
    };

    ws_tx.send(Message::Text(json)).await.is_ok()
}

/// React to a client frame. Failed gates are ignored silently; a chat
/// socket has no error channel worth speaking of.
async fn handle_client_event(
    state: &AppState,
    user_id: Uuid,
    event: ClientEvent,
    rooms: &mut RoomStreams,
) {
    match event {
        ClientEvent::JoinEvent { event_id } => {
            match chat_access(state, user_id, event_id).await {
                Ok(ChatAccess::Allowed) => {
                    if !rooms.contains_key(&event_id) {
                        let rx = state.rooms.subscribe(event_id);
                        rooms.insert(event_id, BroadcastStream::new(rx));
                        debug!(%user_id, %event_id, "joined room");
                    }
                }
                Ok(_) => debug!(%user_id, %event_id, "room join denied"),
                Err(e) => warn!(%user_id, error = %e, "room join failed"),
            }
        }

        ClientEvent::LeaveEvent { event_id } => {
            rooms.remove(&event_id);
        }

        ClientEvent::SendMessage {
            event_id,
            content,
            image_url,
        } => {
            if validation::validate_message_content(&content).is_err() {
                return;
            }

            match chat_access(state, user_id, event_id).await {
                Ok(ChatAccess::Allowed) => {
                    match state
                        .message_repository
                        .create(user_id, event_id, &content, image_url.as_deref())
                        .await
                    {
                        Ok(message) => {
                            state.rooms.publish(event_id, ServerEvent::NewMessage(message));
                        }
                        Err(e) => warn!(%user_id, error = %e, "failed to persist message"),
                    }
                }
                Ok(_) => debug!(%user_id, %event_id, "message send denied"),
                Err(e) => warn!(%user_id, error = %e, "message gate failed"),
            }
        }

        ClientEvent::Typing {
            event_id,
            is_typing,
        } => {
            state
                .rooms
                .publish(event_id, ServerEvent::UserTyping { user_id, is_typing });
        }
    }
}
