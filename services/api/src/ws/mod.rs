//! Realtime chat over WebSocket
//!
//! Clients connect to `/ws?token=<jwt>` and exchange JSON frames shaped
//! `{"event": ..., "data": ...}`. Each event has a broadcast room; messages
//! sent through the socket (or the REST endpoint) fan out to every
//! subscriber of that room.

pub mod connection;
pub mod rooms;

pub use rooms::EventRooms;

use axum::{
    extract::{Query, State, WebSocketUpgrade},
    response::Response,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{error::ApiError, models::MessageWithAuthor, state::AppState};

/// Broadcast channel capacity per event room
pub const ROOM_CHANNEL_CAPACITY: usize = 256;

/// Frames the client sends
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    #[serde(rename_all = "camelCase")]
    JoinEvent { event_id: Uuid },
    #[serde(rename_all = "camelCase")]
    LeaveEvent { event_id: Uuid },
    #[serde(rename_all = "camelCase")]
    SendMessage {
        event_id: Uuid,
        content: String,
        image_url: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Typing { event_id: Uuid, is_typing: bool },
}

/// Frames the server broadcasts into a room
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    NewMessage(MessageWithAuthor),
    #[serde(rename_all = "camelCase")]
    UserTyping { user_id: Uuid, is_typing: bool },
}

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    token: Option<String>,
}

/// Upgrade handler
///
/// The token is checked before the upgrade is looked at, so a missing or
/// bad token answers 401 whether or not the request could upgrade.
pub async fn ws_handler(
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
    ws: Option<WebSocketUpgrade>,
) -> Result<Response, ApiError> {
    let token = query
        .token
        .as_deref()
        .ok_or(ApiError::Unauthorized("No token provided"))?;

    let claims = state
        .jwt_service
        .validate_token(token)
        .map_err(|_| ApiError::Unauthorized("Invalid token"))?;

    let ws = ws.ok_or(ApiError::Validation(
        "WebSocket upgrade required".to_string(),
    ))?;

    let user_id = claims.sub;
    Ok(ws.on_upgrade(move |socket| connection::handle_socket(socket, state, user_id)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_frames_parse() {
        let join: ClientEvent = serde_json::from_str(
            r#"{"event":"join_event","data":{"eventId":"550e8400-e29b-41d4-a716-446655440000"}}"#,
        )
        .unwrap();
        assert!(matches!(join, ClientEvent::JoinEvent { .. }));

        let typing: ClientEvent = serde_json::from_str(
            r#"{"event":"typing","data":{"eventId":"550e8400-e29b-41d4-a716-446655440000","isTyping":true}}"#,
        )
        .unwrap();
        assert!(matches!(typing, ClientEvent::Typing { is_typing: true, .. }));
    }

    #[test]
    fn server_typing_frame_shape() {
        let frame = ServerEvent::UserTyping {
            user_id: Uuid::nil(),
            is_typing: true,
        };
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["event"], "user_typing");
        assert_eq!(json["data"]["isTyping"], true);
        assert!(json["data"]["userId"].is_string());
    }
}
