//! Conversation and message endpoints

use axum::{
    extract::{Path, State},
    response::Json,
};
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::data::Message;
use crate::error::AppError;
use crate::service::{ConversationService, ConversationView, MessageService, MessageView};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateConversationRequest {
    /// The member to start a conversation with
    pub other_user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
}

/// GET /api/conversations
///
/// The caller's conversations, newest activity first, each annotated
/// with the other participant. The caller's draft conversation, if
/// any, comes first with `is_temporary: true`.
pub async fn list_conversations(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
) -> Result<Json<Vec<ConversationView>>, AppError> {
    let service = ConversationService::new(state.db.clone(), state.config.clone());
    let conversations = service.list_for_user(&session.user_id).await?;

    Ok(Json(conversations))
}

/// POST /api/conversations
///
/// Stash a draft conversation towards another member. The draft is
/// returned as a list entry; it becomes a real conversation when the
/// first message is sent into it.
pub async fn create_conversation(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Json(request): Json<CreateConversationRequest>,
) -> Result<Json<ConversationView>, AppError> {
    let service = ConversationService::new(state.db.clone(), state.config.clone());
    service
        .create_pending(&session.user_id, &request.other_user_id)
        .await?;

    // The draft always resolves to the head of the list.
    let conversations = service.list_for_user(&session.user_id).await?;
    let draft = conversations
        .into_iter()
        .find(|conversation| conversation.is_temporary)
        .ok_or(AppError::NotFound)?;

    Ok(Json(draft))
}

/// GET /api/conversations/:id/messages
///
/// Messages of a conversation, oldest first, with sender identities.
pub async fn list_messages(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<MessageView>>, AppError> {
    let service = MessageService::new(state.db.clone());
    let messages = service.list(&id, &session.user_id).await?;

    Ok(Json(messages))
}

/// POST /api/conversations/:id/messages
///
/// Send a message. Sending into the caller's draft conversation
/// materializes it first.
pub async fn send_message(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Path(id): Path<String>,
    Json(request): Json<SendMessageRequest>,
) -> Result<Json<Message>, AppError> {
    let service = MessageService::new(state.db.clone());
    let message = service.send(&id, &session.user_id, &request.content).await?;

    Ok(Json(message))
}
