//! Event chat routes
//!
//! Chat is gated: only the organizer and APPROVED attendees may read or
//! write an event's messages. The WebSocket layer applies the same gate
//! through [`chat_access`].

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    middleware::AuthUser,
    models::{CreateMessageRequest, MessageWithAuthor},
    state::AppState,
    validation,
    ws::ServerEvent,
};

/// Default and maximum chat page size
const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 100;

/// Whether a user may take part in an event's chat
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ChatAccess {
    NoEvent,
    Denied,
    Allowed,
}

/// The chat gate: organizer or APPROVED attendee
pub(crate) async fn chat_access(
    state: &AppState,
    user_id: Uuid,
    event_id: Uuid,
) -> sqlx::Result<ChatAccess> {
    let Some(event) = state.event_repository.find_by_id(event_id).await? else {
        return Ok(ChatAccess::NoEvent);
    };

    if event.organizer_id == user_id {
        return Ok(ChatAccess::Allowed);
    }

    if state.attendance_repository.is_approved(user_id, event_id).await? {
        return Ok(ChatAccess::Allowed);
    }

    Ok(ChatAccess::Denied)
}

fn require_access(access: ChatAccess) -> Result<(), ApiError> {
    match access {
        ChatAccess::Allowed => Ok(()),
        ChatAccess::NoEvent => Err(ApiError::NotFound("Event not found")),
        ChatAccess::Denied => Err(ApiError::Forbidden(
            "Only approved attendees can access the chat",
        )),
    }
}

/// Cursor pagination over an event's chat history
#[derive(Debug, Default, Deserialize)]
pub struct ListMessagesQuery {
    pub limit: Option<i64>,
    /// Message id; only messages older than it are returned
    pub before: Option<Uuid>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageListResponse {
    pub messages: Vec<MessageWithAuthor>,
    pub has_more: bool,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: MessageWithAuthor,
}

/// Chat history, oldest first within the page
pub async fn list_messages(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(event_id): Path<Uuid>,
    Query(query): Query<ListMessagesQuery>,
) -> ApiResult<impl IntoResponse> {
    require_access(chat_access(&state, auth_user.id, event_id).await?)?;

    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

    let mut messages = state
        .message_repository
        .list(event_id, limit, query.before)
        .await?;

    let has_more = messages.len() as i64 == limit;
    messages.reverse();

    Ok(Json(MessageListResponse { messages, has_more }))
}

/// Post a message to an event's chat
///
/// The message is persisted and fanned out to the event's WebSocket room.
pub async fn send_message(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(event_id): Path<Uuid>,
    Json(payload): Json<CreateMessageRequest>,
) -> ApiResult<impl IntoResponse> {
    require_access(chat_access(&state, auth_user.id, event_id).await?)?;

    validation::validate_message_content(&payload.content).map_err(ApiError::Validation)?;

    let message = state
        .message_repository
        .create(
            auth_user.id,
            event_id,
            &payload.content,
            payload.image_url.as_deref(),
        )
        .await?;

    state
        .rooms
        .publish(event_id, ServerEvent::NewMessage(message.clone()));

    Ok((StatusCode::CREATED, Json(MessageResponse { message })))
}
