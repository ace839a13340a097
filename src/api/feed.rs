//! Post, comment, and like endpoints

use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde::{Deserialize, Serialize};

use crate::auth::{CurrentUser, MaybeUser};
use crate::data::Post;
use crate::error::AppError;
use crate::service::{CommentView, FeedService, PostView};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct PhotoCommentsParams {
    pub photo_url: String,
}

#[derive(Debug, Deserialize)]
pub struct AddPhotoCommentRequest {
    pub photo_url: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct AddPostCommentRequest {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub content: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LikeResponse {
    pub likes_count: i64,
}

/// GET /api/photo-comments?photo_url=...
///
/// Comment thread for a photo, oldest first.
pub async fn photo_comments(
    State(state): State<AppState>,
    Query(params): Query<PhotoCommentsParams>,
) -> Result<Json<Vec<CommentView>>, AppError> {
    let service = FeedService::new(state.db.clone());
    let comments = service.photo_comments(&params.photo_url).await?;

    Ok(Json(comments))
}

/// POST /api/photo-comments
pub async fn add_photo_comment(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Json(request): Json<AddPhotoCommentRequest>,
) -> Result<Json<CommentView>, AppError> {
    let service = FeedService::new(state.db.clone());
    let comment = service
        .add_photo_comment(&session.user_id, &request.photo_url, &request.content)
        .await?;

    Ok(Json(comment))
}

/// GET /api/profiles/:id/posts
///
/// A profile's wall posts, newest first, with comment threads and the
/// caller's like state when authenticated.
pub async fn profile_posts(
    State(state): State<AppState>,
    MaybeUser(session): MaybeUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<PostView>>, AppError> {
    let service = FeedService::new(state.db.clone());
    let viewer = session.as_ref().map(|s| s.user_id.as_str());
    let posts = service.posts_for_profile(&id, viewer).await?;

    Ok(Json(posts))
}

/// POST /api/posts
pub async fn create_post(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Json(request): Json<CreatePostRequest>,
) -> Result<Json<Post>, AppError> {
    let service = FeedService::new(state.db.clone());
    let post = service
        .create_post(&session.user_id, &request.content, request.image_url)
        .await?;

    Ok(Json(post))
}

/// POST /api/posts/:id/comments
pub async fn add_post_comment(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Path(id): Path<String>,
    Json(request): Json<AddPostCommentRequest>,
) -> Result<Json<CommentView>, AppError> {
    let service = FeedService::new(state.db.clone());
    let comment = service
        .add_post_comment(&session.user_id, &id, &request.content)
        .await?;

    Ok(Json(comment))
}

/// POST /api/posts/:id/like
pub async fn like_post(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<LikeResponse>, AppError> {
    let service = FeedService::new(state.db.clone());
    let likes_count = service.like_post(&id, &session.user_id).await?;

    Ok(Json(LikeResponse { likes_count }))
}

/// DELETE /api/posts/:id/like
pub async fn unlike_post(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<LikeResponse>, AppError> {
    let service = FeedService::new(state.db.clone());
    let likes_count = service.unlike_post(&id, &session.user_id).await?;

    Ok(Json(LikeResponse { likes_count }))
}
