//! Message service
//!
//! Message fetch/send for a conversation. Sending into a draft
//! conversation materializes it: the conversation and its participants
//! are created, the message inserted, and the draft dropped.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::data::{
    Conversation, Database, EntityId, Joined, Message, PendingConversation, ProfileCard,
};
use crate::error::AppError;

/// A message annotated with its sender's public identity
#[derive(Debug, Clone, Serialize)]
pub struct MessageView {
    pub id: String,
    pub conversation_id: String,
    pub sender_id: String,
    pub content: String,
    pub sender: ProfileCard,
    pub created_at: DateTime<Utc>,
}

/// Message service
pub struct MessageService {
    db: Arc<Database>,
}

impl MessageService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Messages of a conversation, oldest first.
    ///
    /// The id may refer to the caller's draft conversation, which has
    /// no messages yet; that returns an empty list rather than 404.
    pub async fn list(
        &self,
        conversation_id: &str,
        user_id: &str,
    ) -> Result<Vec<MessageView>, AppError> {
        if self.db.get_conversation(conversation_id).await?.is_none() {
            return match self.db.get_pending_conversation_by_id(conversation_id).await? {
                Some(pending) if pending.user_id == user_id => Ok(Vec::new()),
                _ => Err(AppError::NotFound),
            };
        }

        if !self.db.is_participant(conversation_id, user_id).await? {
            return Err(AppError::Forbidden);
        }

        let rows = self.db.get_messages_with_sender(conversation_id).await?;
        let views = rows
            .into_iter()
            .map(|row| {
                let sender = Joined::from_columns(
                    row.sender_profile_id,
                    row.sender_name,
                    row.sender_avatar_url,
                )
                .unwrap_or_else(|| ProfileCard::bare(&row.sender_id));
                MessageView {
                    id: row.id,
                    conversation_id: row.conversation_id,
                    sender_id: row.sender_id,
                    content: row.content,
                    sender,
                    created_at: row.created_at,
                }
            })
            .collect();

        Ok(views)
    }

    /// Send a message into a conversation.
    ///
    /// The message insert and the parent conversation's activity bump
    /// are independent: a failed bump is logged and tolerated, leaving
    /// the message in place with a stale sort position.
    pub async fn send(
        &self,
        conversation_id: &str,
        sender_id: &str,
        content: &str,
    ) -> Result<Message, AppError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(AppError::Validation("message cannot be empty".to_string()));
        }

        let conversation_id = match self.db.get_conversation(conversation_id).await? {
            Some(conversation) => {
                if !self.db.is_participant(&conversation.id, sender_id).await? {
                    return Err(AppError::Forbidden);
                }
                conversation.id
            }
            None => {
                let pending = self
                    .db
                    .get_pending_conversation_by_id(conversation_id)
                    .await?
                    .filter(|pending| pending.user_id == sender_id)
                    .ok_or(AppError::NotFound)?;
                self.materialize(&pending).await?
            }
        };

        let message = Message {
            id: EntityId::new().0,
            conversation_id: conversation_id.clone(),
            sender_id: sender_id.to_string(),
            content: content.to_string(),
            created_at: Utc::now(),
        };
        self.db.insert_message(&message).await?;

        if let Err(error) = self
            .db
            .touch_conversation(&conversation_id, message.created_at)
            .await
        {
            tracing::warn!(
                conversation_id = %conversation_id,
                error = %error,
                "Failed to bump conversation activity after send"
            );
        }

        Ok(message)
    }

    /// Turn a draft into a real conversation, keeping the draft's id
    /// so the client's open view stays valid.
    async fn materialize(&self, pending: &PendingConversation) -> Result<String, AppError> {
        let now = Utc::now();
        let conversation = Conversation {
            id: pending.id.clone(),
            is_pinned: false,
            is_archived: false,
            created_at: now,
            updated_at: now,
        };
        self.db.insert_conversation(&conversation).await?;
        self.db
            .insert_participant(&conversation.id, &pending.user_id, now)
            .await?;
        self.db
            .insert_participant(&conversation.id, &pending.other_user_id, now)
            .await?;
        self.db.delete_pending_conversation(&pending.id).await?;

        tracing::info!(
            conversation_id = %conversation.id,
            "Materialized draft conversation on first message"
        );

        Ok(conversation.id)
    }
}
