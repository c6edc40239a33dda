//! Messaging Endpoints
//!
//! Companies and individuals talk only to the admin; the admin can write to
//! any user. Grouping into conversations happens in `services::conversations`.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    auth::CurrentUser,
    db::Message,
    error::ApiError,
    services::{load_conversations, Conversation, ConversationView},
    types::Role,
    AppState,
};

/// 메시지 최대 길이 (문자 수)
const MAX_MESSAGE_CHARS: usize = 5000;

// ============ Request/Response Types ============

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct AdminSendRequest {
    pub to_user_id: i64,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct MarkReadResponse {
    pub updated: u64,
}

// ============ Handlers ============

/// GET /api/messages
pub async fn list_messages(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<Message>>, ApiError> {
    Ok(Json(state.db.messages_for_user(user.id).await?))
}

/// GET /api/messages/conversations
pub async fn list_conversations(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<Conversation>>, ApiError> {
    let view = view_for(&state, &user);
    let conversations = load_conversations(state.db.as_ref(), user.id, view).await?;
    Ok(Json(conversations))
}

/// POST /api/messages
///
/// 회사 / 개인 → 관리자
pub async fn send_to_admin(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<SendMessageRequest>,
) -> Result<Json<Message>, ApiError> {
    if user.role == Role::Admin {
        return Err(ApiError::BadRequest(
            "Admins send messages via /api/admin/messages/send".to_string(),
        ));
    }

    let content = validate_content(&req.content)?;
    let message = state
        .db
        .insert_message(user.id, state.config.admin_user_id, content)
        .await?;
    tracing::debug!(message_id = message.id, from = user.id, "Message sent to admin");

    Ok(Json(message))
}

/// POST /api/admin/messages/send
pub async fn admin_send(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<AdminSendRequest>,
) -> Result<Json<Message>, ApiError> {
    user.require(Role::Admin)?;

    if req.to_user_id == user.id {
        return Err(ApiError::ValidationError("Cannot message yourself".to_string()));
    }
    let content = validate_content(&req.content)?;
    if !state.db.user_exists(req.to_user_id).await? {
        return Err(ApiError::NotFound(format!("User {}", req.to_user_id)));
    }

    let message = state.db.insert_message(user.id, req.to_user_id, content).await?;
    tracing::debug!(message_id = message.id, to = req.to_user_id, "Admin message sent");

    Ok(Json(message))
}

/// POST /api/messages/:user_id/read
///
/// 해당 상대에게서 받은 메시지를 모두 읽음 처리.
/// 회사 / 개인은 대화가 하나뿐이므로 받은 메시지 전체
pub async fn mark_read(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(other_user_id): Path<i64>,
) -> Result<Json<MarkReadResponse>, ApiError> {
    let from = match view_for(&state, &user) {
        ConversationView::Admin => Some(other_user_id),
        ConversationView::Member { .. } => None,
    };

    let updated = state.db.mark_messages_read(user.id, from).await?;
    Ok(Json(MarkReadResponse { updated }))
}

// ============ Helpers ============

fn view_for(state: &AppState, user: &CurrentUser) -> ConversationView {
    match user.role {
        Role::Admin => ConversationView::Admin,
        Role::Company | Role::Individual => ConversationView::Member {
            admin_user_id: state.config.admin_user_id,
        },
    }
}

fn validate_content(raw: &str) -> Result<&str, ApiError> {
    let content = raw.trim();
    if content.is_empty() {
        return Err(ApiError::ValidationError("Message cannot be empty".to_string()));
    }
    if content.chars().count() > MAX_MESSAGE_CHARS {
        return Err(ApiError::ValidationError(format!(
            "Message exceeds {} characters",
            MAX_MESSAGE_CHARS
        )));
    }
    Ok(content)
}
