//! Feed service
//!
//! Profile wall posts with their comments and like state, and the
//! photo comment threads shown in the photo viewer.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future;
use serde::Serialize;

use crate::data::{Comment, CommentRow, Database, EntityId, Joined, Post, ProfileCard};
use crate::error::AppError;

/// A comment annotated with its author's public identity
#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    pub id: String,
    pub content: String,
    pub photo_url: Option<String>,
    pub post_id: Option<String>,
    pub likes_count: i64,
    pub author: ProfileCard,
    pub created_at: DateTime<Utc>,
}

/// A wall post with author, comments, and the viewer's like state
#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    pub id: String,
    pub user_id: String,
    pub content: String,
    pub image_url: Option<String>,
    pub likes_count: i64,
    pub is_liked: bool,
    pub author: ProfileCard,
    pub comments: Vec<CommentView>,
    pub created_at: DateTime<Utc>,
}

/// Feed service
pub struct FeedService {
    db: Arc<Database>,
}

impl FeedService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Comment thread for a photo, oldest first
    pub async fn photo_comments(&self, photo_url: &str) -> Result<Vec<CommentView>, AppError> {
        let rows = self.db.get_comments_for_photo(photo_url).await?;
        Ok(rows.into_iter().map(map_comment).collect())
    }

    /// Add a comment to a photo and return it with its author joined
    pub async fn add_photo_comment(
        &self,
        user_id: &str,
        photo_url: &str,
        content: &str,
    ) -> Result<CommentView, AppError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(AppError::Validation("comment cannot be empty".to_string()));
        }
        if photo_url.trim().is_empty() {
            return Err(AppError::Validation("photo_url cannot be empty".to_string()));
        }

        let comment = Comment {
            id: EntityId::new().0,
            user_id: user_id.to_string(),
            content: content.to_string(),
            photo_url: Some(photo_url.to_string()),
            post_id: None,
            likes_count: 0,
            created_at: Utc::now(),
        };
        self.db.insert_comment(&comment).await?;

        let row = self
            .db
            .get_comment_with_author(&comment.id)
            .await?
            .ok_or(AppError::NotFound)?;
        Ok(map_comment(row))
    }

    /// Add a comment to a post and return it with its author joined
    pub async fn add_post_comment(
        &self,
        user_id: &str,
        post_id: &str,
        content: &str,
    ) -> Result<CommentView, AppError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(AppError::Validation("comment cannot be empty".to_string()));
        }
        if self.db.get_post(post_id).await?.is_none() {
            return Err(AppError::NotFound);
        }

        let comment = Comment {
            id: EntityId::new().0,
            user_id: user_id.to_string(),
            content: content.to_string(),
            photo_url: None,
            post_id: Some(post_id.to_string()),
            likes_count: 0,
            created_at: Utc::now(),
        };
        self.db.insert_comment(&comment).await?;

        let row = self
            .db
            .get_comment_with_author(&comment.id)
            .await?
            .ok_or(AppError::NotFound)?;
        Ok(map_comment(row))
    }

    /// A profile's posts, newest first, each with author, comment
    /// thread, and whether `viewer` has liked it.
    pub async fn posts_for_profile(
        &self,
        profile_id: &str,
        viewer: Option<&str>,
    ) -> Result<Vec<PostView>, AppError> {
        let rows = self.db.get_posts_with_author(profile_id).await?;

        let liked: HashSet<String> = match viewer {
            Some(viewer) => self.db.get_liked_post_ids(viewer).await?.into_iter().collect(),
            None => HashSet::new(),
        };

        let comment_sets = future::try_join_all(
            rows.iter().map(|row| self.db.get_comments_for_post(&row.id)),
        )
        .await?;

        let views = rows
            .into_iter()
            .zip(comment_sets)
            .map(|(row, comments)| {
                let author = Joined::from_columns(
                    row.author_profile_id,
                    row.author_name.or(row.author_username),
                    row.author_avatar_url,
                )
                .unwrap_or_else(|| ProfileCard::bare(&row.user_id));
                PostView {
                    is_liked: liked.contains(&row.id),
                    id: row.id,
                    user_id: row.user_id,
                    content: row.content,
                    image_url: row.image_url,
                    likes_count: row.likes_count,
                    author,
                    comments: comments.into_iter().map(map_comment).collect(),
                    created_at: row.created_at,
                }
            })
            .collect();

        Ok(views)
    }

    /// Create a wall post
    pub async fn create_post(
        &self,
        user_id: &str,
        content: &str,
        image_url: Option<String>,
    ) -> Result<Post, AppError> {
        let content = content.trim();
        if content.is_empty() && image_url.is_none() {
            return Err(AppError::Validation(
                "post needs text or an image".to_string(),
            ));
        }

        let post = Post {
            id: EntityId::new().0,
            user_id: user_id.to_string(),
            content: content.to_string(),
            image_url,
            likes_count: 0,
            created_at: Utc::now(),
        };
        self.db.insert_post(&post).await?;
        Ok(post)
    }

    /// Like a post; idempotent
    ///
    /// # Returns
    /// The post's updated like count
    pub async fn like_post(&self, post_id: &str, user_id: &str) -> Result<i64, AppError> {
        if self.db.get_post(post_id).await?.is_none() {
            return Err(AppError::NotFound);
        }
        self.db.like_post(post_id, user_id, Utc::now()).await?;
        self.likes_count(post_id).await
    }

    /// Remove a like; idempotent
    pub async fn unlike_post(&self, post_id: &str, user_id: &str) -> Result<i64, AppError> {
        if self.db.get_post(post_id).await?.is_none() {
            return Err(AppError::NotFound);
        }
        self.db.unlike_post(post_id, user_id).await?;
        self.likes_count(post_id).await
    }

    async fn likes_count(&self, post_id: &str) -> Result<i64, AppError> {
        Ok(self
            .db
            .get_post(post_id)
            .await?
            .map(|post| post.likes_count)
            .unwrap_or(0))
    }
}

/// Resolve the joined author into a card, falling back to the bare
/// commenter id. A missing display name falls back to the username.
fn map_comment(row: CommentRow) -> CommentView {
    let author = Joined::from_columns(
        row.author_profile_id,
        row.author_name.or(row.author_username),
        row.author_avatar_url,
    )
    .unwrap_or_else(|| ProfileCard::bare(&row.user_id));

    CommentView {
        id: row.id,
        content: row.content,
        photo_url: row.photo_url,
        post_id: row.post_id,
        likes_count: row.likes_count,
        author,
        created_at: row.created_at,
    }
}
