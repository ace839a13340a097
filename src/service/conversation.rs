//! Conversation service
//!
//! Resolves a user's conversation list into rows annotated with the
//! other participant's public identity, and manages the per-user
//! conversation draft that exists until a first message is sent.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future;
use serde::Serialize;

use crate::config::AppConfig;
use crate::data::{
    is_online, Database, EntityId, Joined, ParticipantRow, PendingConversation, ProfileCard,
};
use crate::error::AppError;

/// A participant as shown in a conversation list entry
#[derive(Debug, Clone, Serialize)]
pub struct ParticipantView {
    pub user_id: String,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub is_online: bool,
}

/// A conversation list entry
#[derive(Debug, Clone, Serialize)]
pub struct ConversationView {
    pub id: String,
    pub is_pinned: bool,
    pub is_archived: bool,
    /// True for the not-yet-persisted draft entry
    pub is_temporary: bool,
    pub latest_message: Option<String>,
    pub latest_message_at: Option<DateTime<Utc>>,
    pub other_participant: Option<ParticipantView>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Conversation service
pub struct ConversationService {
    db: Arc<Database>,
    config: Arc<AppConfig>,
}

impl ConversationService {
    pub fn new(db: Arc<Database>, config: Arc<AppConfig>) -> Self {
        Self { db, config }
    }

    /// List the user's conversations, newest activity first.
    ///
    /// Each entry carries the participant other than `user_id`. The
    /// joined profile behind that participant may be whole, absent, or
    /// partial; absent and partial degrade to a minimal record that
    /// keeps the participant id. A user somehow missing from their own
    /// conversation's participant set yields `other_participant: None`.
    ///
    /// The user's draft conversation, if any, is prepended with
    /// `is_temporary: true`.
    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<ConversationView>, AppError> {
        if user_id.trim().is_empty() {
            return Ok(Vec::new());
        }

        let conversation_ids = self.db.get_participations(user_id).await?;
        let rows = self.db.get_conversations_by_ids(&conversation_ids).await?;

        // One participant fetch per conversation, in flight together.
        let participant_sets = future::try_join_all(
            rows.iter()
                .map(|row| self.db.get_participants_with_profiles(&row.id)),
        )
        .await?;

        let window = self.config.community.online_window_seconds;
        let mut views = Vec::with_capacity(rows.len() + 1);
        for (row, participants) in rows.into_iter().zip(participant_sets) {
            views.push(ConversationView {
                id: row.id,
                is_pinned: row.is_pinned,
                is_archived: row.is_archived,
                is_temporary: false,
                latest_message: row.latest_message,
                latest_message_at: row.latest_message_at,
                other_participant: resolve_other_participant(&participants, user_id, window),
                created_at: row.created_at,
                updated_at: row.updated_at,
            });
        }

        if let Some(pending) = self.db.get_pending_conversation(user_id).await? {
            let draft = self.pending_view(&pending).await?;
            views.insert(0, draft);
        }

        Ok(views)
    }

    /// Stash a draft conversation towards another member.
    ///
    /// Each user holds at most one draft; a new one replaces it. The
    /// draft becomes a real conversation when its first message is
    /// sent.
    pub async fn create_pending(
        &self,
        user_id: &str,
        other_user_id: &str,
    ) -> Result<PendingConversation, AppError> {
        let other_user_id = other_user_id.trim();
        if other_user_id.is_empty() {
            return Err(AppError::Validation(
                "other_user_id cannot be empty".to_string(),
            ));
        }
        if other_user_id == user_id {
            return Err(AppError::Validation(
                "cannot start a conversation with yourself".to_string(),
            ));
        }

        let pending = PendingConversation {
            id: EntityId::new().0,
            user_id: user_id.to_string(),
            other_user_id: other_user_id.to_string(),
            created_at: Utc::now(),
        };
        self.db.upsert_pending_conversation(&pending).await?;

        Ok(pending)
    }

    async fn pending_view(
        &self,
        pending: &PendingConversation,
    ) -> Result<ConversationView, AppError> {
        let other = self.db.get_profile(&pending.other_user_id).await?;
        let window = self.config.community.online_window_seconds;
        let participant = match other {
            Some(profile) => ParticipantView {
                user_id: profile.id,
                name: profile.name,
                avatar_url: profile.avatar_url,
                is_online: is_online(profile.last_seen, window),
            },
            None => {
                let card = ProfileCard::bare(&pending.other_user_id);
                ParticipantView {
                    user_id: card.id,
                    name: card.name,
                    avatar_url: card.avatar_url,
                    is_online: false,
                }
            }
        };

        Ok(ConversationView {
            id: pending.id.clone(),
            is_pinned: false,
            is_archived: false,
            is_temporary: true,
            latest_message: None,
            latest_message_at: None,
            other_participant: Some(participant),
            created_at: pending.created_at,
            updated_at: pending.created_at,
        })
    }
}

/// Pick the participant other than `user_id` and resolve their joined
/// profile into a view, keeping the bare user id when the profile is
/// missing or unusable.
fn resolve_other_participant(
    participants: &[ParticipantRow],
    user_id: &str,
    online_window_seconds: i64,
) -> Option<ParticipantView> {
    let user_present = participants.iter().any(|row| row.user_id == user_id);
    if !user_present {
        return None;
    }

    let other = participants.iter().find(|row| row.user_id != user_id)?;
    let card = Joined::from_columns(
        other.profile_id.clone(),
        other.profile_name.clone(),
        other.profile_avatar_url.clone(),
    )
    .unwrap_or_else(|| ProfileCard::bare(&other.user_id));

    Some(ParticipantView {
        user_id: other.user_id.clone(),
        name: card.name,
        avatar_url: card.avatar_url,
        is_online: is_online(other.profile_last_seen, online_window_seconds),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(
        user_id: &str,
        profile_id: Option<&str>,
        name: Option<&str>,
        avatar: Option<&str>,
    ) -> ParticipantRow {
        ParticipantRow {
            user_id: user_id.to_string(),
            profile_id: profile_id.map(str::to_string),
            profile_name: name.map(str::to_string),
            profile_avatar_url: avatar.map(str::to_string),
            profile_last_seen: None,
        }
    }

    #[test]
    fn other_participant_with_profile() {
        let participants = vec![
            row("me", Some("me"), Some("Me"), None),
            row("them", Some("them"), Some("Ana"), Some("https://m/a.webp")),
        ];

        let view = resolve_other_participant(&participants, "me", 300).unwrap();
        assert_eq!(view.user_id, "them");
        assert_eq!(view.name.as_deref(), Some("Ana"));
        assert_eq!(view.avatar_url.as_deref(), Some("https://m/a.webp"));
        assert!(!view.is_online);
    }

    #[test]
    fn missing_profile_degrades_to_bare_id() {
        let participants = vec![
            row("me", Some("me"), None, None),
            row("them", None, None, None),
        ];

        let view = resolve_other_participant(&participants, "me", 300).unwrap();
        assert_eq!(view.user_id, "them");
        assert_eq!(view.name, None);
        assert_eq!(view.avatar_url, None);
    }

    #[test]
    fn partial_profile_degrades_to_bare_id() {
        // Name present but no id: the join is unusable, keep the id only.
        let participants = vec![
            row("me", Some("me"), None, None),
            row("them", None, Some("Ana"), None),
        ];

        let view = resolve_other_participant(&participants, "me", 300).unwrap();
        assert_eq!(view.user_id, "them");
        assert_eq!(view.name, None);
    }

    #[test]
    fn current_user_absent_yields_none() {
        let participants = vec![row("them", Some("them"), Some("Ana"), None)];
        assert!(resolve_other_participant(&participants, "me", 300).is_none());
    }

    #[test]
    fn recently_seen_participant_is_online() {
        let mut other = row("them", Some("them"), Some("Ana"), None);
        other.profile_last_seen = Some(Utc::now());
        let participants = vec![row("me", Some("me"), None, None), other];

        let view = resolve_other_participant(&participants, "me", 300).unwrap();
        assert!(view.is_online);
    }
}
