//! SQLite database operations
//!
//! All database access goes through this module.

use chrono::{DateTime, Utc};
use sqlx::{Pool, QueryBuilder, Sqlite, SqlitePool};
use std::path::Path;

use super::models::*;
use crate::error::AppError;

/// Database connection pool wrapper.
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    // =========================================================================
    // Connection
    // =========================================================================

    /// Connect to SQLite database
    ///
    /// Creates the database file if it doesn't exist.
    /// Runs pending migrations automatically.
    ///
    /// # Arguments
    /// * `path` - Path to SQLite database file
    ///
    /// # Errors
    /// Returns error if connection or migration fails
    pub async fn connect(path: &Path) -> Result<Self, AppError> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::Database(sqlx::Error::Io(e)))?;
        }

        let connection_string = format!("sqlite:{}?mode=rwc", path.display());
        let pool = SqlitePool::connect(&connection_string).await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| {
                tracing::error!("Migration failed: {}", e);
                AppError::Internal(anyhow::anyhow!("Migration failed: {}", e))
            })?;

        tracing::info!("Database connected and migrated successfully");

        Ok(Self { pool })
    }

    // =========================================================================
    // Profiles
    // =========================================================================

    /// Get a profile by id
    pub async fn get_profile(&self, id: &str) -> Result<Option<Profile>, AppError> {
        let row = sqlx::query_as::<_, ProfileRow>("SELECT * FROM profiles WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Profile::from))
    }

    /// List profiles for the community grid, newest first
    ///
    /// Pagination is a literal row-count limit.
    pub async fn list_profiles(&self, limit: usize) -> Result<Vec<Profile>, AppError> {
        let rows = sqlx::query_as::<_, ProfileRow>(
            "SELECT * FROM profiles ORDER BY created_at DESC LIMIT ?",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Profile::from).collect())
    }

    /// Create or replace a profile wholesale
    pub async fn upsert_profile(&self, profile: &Profile) -> Result<(), AppError> {
        let native_languages = serde_json::to_string(&profile.native_languages)
            .map_err(|e| AppError::Internal(e.into()))?;
        let language_levels = serde_json::to_string(&profile.language_levels)
            .map_err(|e| AppError::Internal(e.into()))?;
        let interested_in = serde_json::to_string(&profile.interested_in)
            .map_err(|e| AppError::Internal(e.into()))?;
        let looking_for = serde_json::to_string(&profile.looking_for)
            .map_err(|e| AppError::Internal(e.into()))?;

        sqlx::query(
            r#"
            INSERT OR REPLACE INTO profiles (
                id, username, name, age, avatar_url, city, country, bio, gender,
                native_languages, language_levels, interested_in, looking_for,
                last_seen, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&profile.id)
        .bind(&profile.username)
        .bind(&profile.name)
        .bind(profile.age)
        .bind(&profile.avatar_url)
        .bind(&profile.city)
        .bind(&profile.country)
        .bind(&profile.bio)
        .bind(&profile.gender)
        .bind(native_languages)
        .bind(language_levels)
        .bind(interested_in)
        .bind(looking_for)
        .bind(profile.last_seen)
        .bind(profile.created_at)
        .bind(profile.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Insert an empty profile row if none exists for this id
    ///
    /// # Returns
    /// `true` if a row was created
    pub async fn insert_profile_if_missing(&self, id: &str) -> Result<bool, AppError> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT OR IGNORE INTO profiles (id, created_at, updated_at) VALUES (?, ?, ?)",
        )
        .bind(id)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Update a profile's avatar URL
    ///
    /// # Returns
    /// `true` if updated, `false` if no matching profile row exists
    pub async fn update_profile_avatar(
        &self,
        id: &str,
        avatar_url: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE profiles SET avatar_url = ?, updated_at = ? WHERE id = ?")
            .bind(avatar_url)
            .bind(updated_at)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Record activity for presence
    pub async fn touch_last_seen(&self, id: &str, seen_at: DateTime<Utc>) -> Result<(), AppError> {
        sqlx::query("UPDATE profiles SET last_seen = ? WHERE id = ?")
            .bind(seen_at)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    // =========================================================================
    // Credentials
    // =========================================================================

    /// Insert login credentials for a new member
    pub async fn insert_credential(&self, credential: &Credential) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO credentials (user_id, username, password_hash, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&credential.user_id)
        .bind(&credential.username)
        .bind(&credential.password_hash)
        .bind(credential.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Look up credentials by username
    pub async fn get_credential(&self, username: &str) -> Result<Option<Credential>, AppError> {
        let credential =
            sqlx::query_as::<_, Credential>("SELECT * FROM credentials WHERE username = ?")
                .bind(username)
                .fetch_optional(&self.pool)
                .await?;

        Ok(credential)
    }

    // =========================================================================
    // Conversations
    // =========================================================================

    /// Conversation ids the user participates in
    pub async fn get_participations(&self, user_id: &str) -> Result<Vec<String>, AppError> {
        let ids = sqlx::query_scalar::<_, String>(
            "SELECT conversation_id FROM conversation_participants WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    /// Conversation rows for an id set, each with its latest message,
    /// ordered by last activity descending
    pub async fn get_conversations_by_ids(
        &self,
        ids: &[String],
    ) -> Result<Vec<ConversationRow>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder = QueryBuilder::<Sqlite>::new(
            r#"
            SELECT c.id, c.is_pinned, c.is_archived, c.created_at, c.updated_at,
                   (SELECT m.content FROM messages m
                    WHERE m.conversation_id = c.id
                    ORDER BY m.created_at DESC LIMIT 1) AS latest_message,
                   (SELECT m.created_at FROM messages m
                    WHERE m.conversation_id = c.id
                    ORDER BY m.created_at DESC LIMIT 1) AS latest_message_at
            FROM conversations c
            WHERE c.id IN (
            "#,
        );
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(id);
        }
        separated.push_unseparated(") ORDER BY c.updated_at DESC");

        let rows = builder
            .build_query_as::<ConversationRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    /// Get a single conversation
    pub async fn get_conversation(&self, id: &str) -> Result<Option<Conversation>, AppError> {
        let conversation =
            sqlx::query_as::<_, Conversation>("SELECT * FROM conversations WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(conversation)
    }

    /// Insert a conversation row
    pub async fn insert_conversation(&self, conversation: &Conversation) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO conversations (id, is_pinned, is_archived, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&conversation.id)
        .bind(conversation.is_pinned)
        .bind(conversation.is_archived)
        .bind(conversation.created_at)
        .bind(conversation.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Add a participant to a conversation
    pub async fn insert_participant(
        &self,
        conversation_id: &str,
        user_id: &str,
        created_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO conversation_participants (conversation_id, user_id, created_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(conversation_id)
        .bind(user_id)
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Whether the user belongs to the conversation
    pub async fn is_participant(
        &self,
        conversation_id: &str,
        user_id: &str,
    ) -> Result<bool, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM conversation_participants WHERE conversation_id = ? AND user_id = ?",
        )
        .bind(conversation_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    /// Participants of a conversation with their profiles LEFT-joined
    pub async fn get_participants_with_profiles(
        &self,
        conversation_id: &str,
    ) -> Result<Vec<ParticipantRow>, AppError> {
        let rows = sqlx::query_as::<_, ParticipantRow>(
            r#"
            SELECT cp.user_id,
                   p.id AS profile_id,
                   p.name AS profile_name,
                   p.avatar_url AS profile_avatar_url,
                   p.last_seen AS profile_last_seen
            FROM conversation_participants cp
            LEFT JOIN profiles p ON p.id = cp.user_id
            WHERE cp.conversation_id = ?
            "#,
        )
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Bump the conversation's last-activity timestamp
    ///
    /// # Returns
    /// `true` if a row was updated
    pub async fn touch_conversation(
        &self,
        conversation_id: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE conversations SET updated_at = ? WHERE id = ?")
            .bind(updated_at)
            .bind(conversation_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Pending conversations
    // =========================================================================

    /// Stash (or replace) the user's conversation draft
    pub async fn upsert_pending_conversation(
        &self,
        pending: &PendingConversation,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO pending_conversations (id, user_id, other_user_id, created_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                id = excluded.id,
                other_user_id = excluded.other_user_id,
                created_at = excluded.created_at
            "#,
        )
        .bind(&pending.id)
        .bind(&pending.user_id)
        .bind(&pending.other_user_id)
        .bind(pending.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// The user's conversation draft, if any
    pub async fn get_pending_conversation(
        &self,
        user_id: &str,
    ) -> Result<Option<PendingConversation>, AppError> {
        let pending = sqlx::query_as::<_, PendingConversation>(
            "SELECT * FROM pending_conversations WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(pending)
    }

    /// Look up a draft by its id
    pub async fn get_pending_conversation_by_id(
        &self,
        id: &str,
    ) -> Result<Option<PendingConversation>, AppError> {
        let pending = sqlx::query_as::<_, PendingConversation>(
            "SELECT * FROM pending_conversations WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(pending)
    }

    /// Drop a draft once it has materialized (or is abandoned)
    pub async fn delete_pending_conversation(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM pending_conversations WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Messages
    // =========================================================================

    /// Messages of a conversation in creation order, sender joined
    pub async fn get_messages_with_sender(
        &self,
        conversation_id: &str,
    ) -> Result<Vec<MessageRow>, AppError> {
        let rows = sqlx::query_as::<_, MessageRow>(
            r#"
            SELECT m.id, m.conversation_id, m.sender_id, m.content, m.created_at,
                   p.id AS sender_profile_id,
                   p.name AS sender_name,
                   p.avatar_url AS sender_avatar_url
            FROM messages m
            LEFT JOIN profiles p ON p.id = m.sender_id
            WHERE m.conversation_id = ?
            ORDER BY m.created_at ASC
            "#,
        )
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Insert a message row
    pub async fn insert_message(&self, message: &Message) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO messages (id, conversation_id, sender_id, content, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&message.id)
        .bind(&message.conversation_id)
        .bind(&message.sender_id)
        .bind(&message.content)
        .bind(message.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // =========================================================================
    // Posts
    // =========================================================================

    /// Insert a post row
    pub async fn insert_post(&self, post: &Post) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO posts (id, user_id, content, image_url, likes_count, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&post.id)
        .bind(&post.user_id)
        .bind(&post.content)
        .bind(&post.image_url)
        .bind(post.likes_count)
        .bind(post.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get a single post
    pub async fn get_post(&self, id: &str) -> Result<Option<Post>, AppError> {
        let post = sqlx::query_as::<_, Post>("SELECT * FROM posts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(post)
    }

    /// A profile's posts, newest first, author joined
    pub async fn get_posts_with_author(&self, user_id: &str) -> Result<Vec<PostRow>, AppError> {
        let rows = sqlx::query_as::<_, PostRow>(
            r#"
            SELECT po.id, po.user_id, po.content, po.image_url, po.likes_count, po.created_at,
                   p.id AS author_profile_id,
                   p.name AS author_name,
                   p.username AS author_username,
                   p.avatar_url AS author_avatar_url
            FROM posts po
            LEFT JOIN profiles p ON p.id = po.user_id
            WHERE po.user_id = ?
            ORDER BY po.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    // =========================================================================
    // Comments
    // =========================================================================

    /// Insert a comment row
    pub async fn insert_comment(&self, comment: &Comment) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO comments (id, user_id, content, photo_url, post_id, likes_count, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&comment.id)
        .bind(&comment.user_id)
        .bind(&comment.content)
        .bind(&comment.photo_url)
        .bind(&comment.post_id)
        .bind(comment.likes_count)
        .bind(comment.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Comments on a photo in creation order, author joined
    pub async fn get_comments_for_photo(
        &self,
        photo_url: &str,
    ) -> Result<Vec<CommentRow>, AppError> {
        let rows = sqlx::query_as::<_, CommentRow>(
            r#"
            SELECT c.id, c.user_id, c.content, c.photo_url, c.post_id, c.likes_count, c.created_at,
                   p.id AS author_profile_id,
                   p.name AS author_name,
                   p.username AS author_username,
                   p.avatar_url AS author_avatar_url
            FROM comments c
            LEFT JOIN profiles p ON p.id = c.user_id
            WHERE c.photo_url = ?
            ORDER BY c.created_at ASC
            "#,
        )
        .bind(photo_url)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Comments on a post in creation order, author joined
    pub async fn get_comments_for_post(&self, post_id: &str) -> Result<Vec<CommentRow>, AppError> {
        let rows = sqlx::query_as::<_, CommentRow>(
            r#"
            SELECT c.id, c.user_id, c.content, c.photo_url, c.post_id, c.likes_count, c.created_at,
                   p.id AS author_profile_id,
                   p.name AS author_name,
                   p.username AS author_username,
                   p.avatar_url AS author_avatar_url
            FROM comments c
            LEFT JOIN profiles p ON p.id = c.user_id
            WHERE c.post_id = ?
            ORDER BY c.created_at ASC
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Fetch a comment back with its author joined
    pub async fn get_comment_with_author(
        &self,
        id: &str,
    ) -> Result<Option<CommentRow>, AppError> {
        let row = sqlx::query_as::<_, CommentRow>(
            r#"
            SELECT c.id, c.user_id, c.content, c.photo_url, c.post_id, c.likes_count, c.created_at,
                   p.id AS author_profile_id,
                   p.name AS author_name,
                   p.username AS author_username,
                   p.avatar_url AS author_avatar_url
            FROM comments c
            LEFT JOIN profiles p ON p.id = c.user_id
            WHERE c.id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    // =========================================================================
    // Post likes
    // =========================================================================

    /// Post ids the user has liked
    pub async fn get_liked_post_ids(&self, user_id: &str) -> Result<Vec<String>, AppError> {
        let ids =
            sqlx::query_scalar::<_, String>("SELECT post_id FROM post_likes WHERE user_id = ?")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?;

        Ok(ids)
    }

    /// Like a post; idempotent
    ///
    /// # Returns
    /// `true` if the like was newly recorded
    pub async fn like_post(
        &self,
        post_id: &str,
        user_id: &str,
        created_at: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO post_likes (post_id, user_id, created_at) VALUES (?, ?, ?)",
        )
        .bind(post_id)
        .bind(user_id)
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        let inserted = result.rows_affected() == 1;
        if inserted {
            sqlx::query("UPDATE posts SET likes_count = likes_count + 1 WHERE id = ?")
                .bind(post_id)
                .execute(&self.pool)
                .await?;
        }

        Ok(inserted)
    }

    /// Remove a like; idempotent
    ///
    /// # Returns
    /// `true` if a like was removed
    pub async fn unlike_post(&self, post_id: &str, user_id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM post_likes WHERE post_id = ? AND user_id = ?")
            .bind(post_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        let removed = result.rows_affected() == 1;
        if removed {
            sqlx::query(
                "UPDATE posts SET likes_count = MAX(likes_count - 1, 0) WHERE id = ?",
            )
            .bind(post_id)
            .execute(&self.pool)
            .await?;
        }

        Ok(removed)
    }
}
