//! Data models
//!
//! Rust structs representing database entities.
//! All models use ULID for IDs and chrono for timestamps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// ID Types
// =============================================================================

/// Entity ID wrapper (ULID format, 26 characters)
///
/// Example: "01ARZ3NDEKTSV4RRFFQ69G5FAV"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    /// Generate a new ULID
    pub fn new() -> Self {
        Self(ulid::Ulid::new().to_string())
    }

    /// Create from existing string
    pub fn from_string(s: String) -> Self {
        Self(s)
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Profile
// =============================================================================

/// A language paired with an optional proficiency level
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageLevel {
    pub language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
}

/// A member profile
///
/// List fields (languages, preferences) are stored as JSON text
/// columns and parsed on load; malformed JSON degrades to an empty
/// list instead of failing the row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub username: Option<String>,
    pub name: Option<String>,
    pub age: Option<i64>,
    pub avatar_url: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub bio: Option<String>,
    pub gender: Option<String>,
    pub native_languages: Vec<String>,
    pub language_levels: Vec<LanguageLevel>,
    pub interested_in: Vec<String>,
    pub looking_for: Vec<String>,
    pub last_seen: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// An empty profile shell for a freshly registered user
    pub fn empty(id: &str) -> Self {
        let now = Utc::now();
        Self {
            id: id.to_string(),
            username: None,
            name: None,
            age: None,
            avatar_url: None,
            city: None,
            country: None,
            bio: None,
            gender: None,
            native_languages: Vec::new(),
            language_levels: Vec::new(),
            interested_in: Vec::new(),
            looking_for: Vec::new(),
            last_seen: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Raw profile row as stored in SQLite
///
/// JSON columns stay as text here; [`Profile`] owns the parsed view.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProfileRow {
    pub id: String,
    pub username: Option<String>,
    pub name: Option<String>,
    pub age: Option<i64>,
    pub avatar_url: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub bio: Option<String>,
    pub gender: Option<String>,
    pub native_languages: Option<String>,
    pub language_levels: Option<String>,
    pub interested_in: Option<String>,
    pub looking_for: Option<String>,
    pub last_seen: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn parse_json_list<T: serde::de::DeserializeOwned>(raw: Option<&str>) -> Vec<T> {
    raw.and_then(|raw| serde_json::from_str(raw).ok())
        .unwrap_or_default()
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            name: row.name,
            age: row.age,
            avatar_url: row.avatar_url,
            city: row.city,
            country: row.country,
            bio: row.bio,
            gender: row.gender,
            native_languages: parse_json_list(row.native_languages.as_deref()),
            language_levels: parse_json_list(row.language_levels.as_deref()),
            interested_in: parse_json_list(row.interested_in.as_deref()),
            looking_for: parse_json_list(row.looking_for.as_deref()),
            last_seen: row.last_seen,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

// =============================================================================
// Credentials
// =============================================================================

/// Login credentials for a member
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Credential {
    pub user_id: String,
    pub username: String,
    /// "salt_b64.digest_b64"
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Conversations
// =============================================================================

/// A persisted conversation between participants
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Conversation {
    pub id: String,
    pub is_pinned: bool,
    pub is_archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Conversation row with its latest message folded in (subselect)
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ConversationRow {
    pub id: String,
    pub is_pinned: bool,
    pub is_archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub latest_message: Option<String>,
    pub latest_message_at: Option<DateTime<Utc>>,
}

/// Participant row with the joined profile columns left nullable
///
/// The join can come back empty (participant without a profile row)
/// or partial; the mapping layer decides what to do with that.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ParticipantRow {
    pub user_id: String,
    pub profile_id: Option<String>,
    pub profile_name: Option<String>,
    pub profile_avatar_url: Option<String>,
    pub profile_last_seen: Option<DateTime<Utc>>,
}

/// A not-yet-persisted conversation draft
///
/// Held per user until a first message materializes it.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PendingConversation {
    pub id: String,
    pub user_id: String,
    pub other_user_id: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Messages
// =============================================================================

/// A message in a conversation
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Message {
    pub id: String,
    pub conversation_id: String,
    pub sender_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Message row with the sender profile joined (nullable columns)
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MessageRow {
    pub id: String,
    pub conversation_id: String,
    pub sender_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub sender_profile_id: Option<String>,
    pub sender_name: Option<String>,
    pub sender_avatar_url: Option<String>,
}

// =============================================================================
// Posts, comments, likes
// =============================================================================

/// A wall post on a profile
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: String,
    pub user_id: String,
    pub content: String,
    pub image_url: Option<String>,
    pub likes_count: i64,
    pub created_at: DateTime<Utc>,
}

/// A comment on a photo (by URL) or a post
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: String,
    pub user_id: String,
    pub content: String,
    pub photo_url: Option<String>,
    pub post_id: Option<String>,
    pub likes_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Comment row with the author profile joined (nullable columns)
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CommentRow {
    pub id: String,
    pub user_id: String,
    pub content: String,
    pub photo_url: Option<String>,
    pub post_id: Option<String>,
    pub likes_count: i64,
    pub created_at: DateTime<Utc>,
    pub author_profile_id: Option<String>,
    pub author_name: Option<String>,
    pub author_username: Option<String>,
    pub author_avatar_url: Option<String>,
}

/// Post row with the author profile joined (nullable columns)
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostRow {
    pub id: String,
    pub user_id: String,
    pub content: String,
    pub image_url: Option<String>,
    pub likes_count: i64,
    pub created_at: DateTime<Utc>,
    pub author_profile_id: Option<String>,
    pub author_name: Option<String>,
    pub author_username: Option<String>,
    pub author_avatar_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_json_list_degrades_to_empty() {
        let row = ProfileRow {
            id: "p1".to_string(),
            username: None,
            name: None,
            age: None,
            avatar_url: None,
            city: None,
            country: None,
            bio: None,
            gender: None,
            native_languages: Some("not json".to_string()),
            language_levels: Some("{\"truncated\":".to_string()),
            interested_in: None,
            looking_for: Some("[\"friends\"]".to_string()),
            last_seen: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let profile = Profile::from(row);
        assert!(profile.native_languages.is_empty());
        assert!(profile.language_levels.is_empty());
        assert!(profile.interested_in.is_empty());
        assert_eq!(profile.looking_for, vec!["friends".to_string()]);
    }

    #[test]
    fn language_levels_round_trip() {
        let levels = vec![
            LanguageLevel {
                language: "French".to_string(),
                level: Some("beginner".to_string()),
            },
            LanguageLevel {
                language: "German".to_string(),
                level: None,
            },
        ];
        let raw = serde_json::to_string(&levels).unwrap();
        let parsed: Vec<LanguageLevel> = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed, levels);
    }
}
