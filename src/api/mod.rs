//! API layer
//!
//! HTTP handlers for the client-facing JSON API:
//! - Conversations and messages
//! - Profiles, community grid, avatars
//! - Posts, comments, likes

mod conversations;
mod feed;
mod profiles;

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::AppState;

/// Create the client API router, mounted under /api
pub fn api_router() -> Router<AppState> {
    // Public endpoints (no authentication required)
    let public_routes = Router::new()
        .route("/community", get(profiles::community_grid))
        .route("/profiles/:id", get(profiles::get_public_profile))
        .route("/profiles/:id/posts", get(feed::profile_posts))
        .route("/photo-comments", get(feed::photo_comments));

    // Authenticated endpoints (require a valid session)
    let authenticated_routes = Router::new()
        .route("/conversations", get(conversations::list_conversations))
        .route("/conversations", post(conversations::create_conversation))
        .route(
            "/conversations/:id/messages",
            get(conversations::list_messages),
        )
        .route(
            "/conversations/:id/messages",
            post(conversations::send_message),
        )
        .route("/profile", get(profiles::get_own_profile))
        .route("/profile", put(profiles::update_own_profile))
        .route("/profile/avatar", post(profiles::upload_avatar))
        .route("/presence", post(profiles::presence_ping))
        .route("/cities", get(profiles::search_cities))
        .route("/photo-comments", post(feed::add_photo_comment))
        .route("/posts", post(feed::create_post))
        .route("/posts/:id/comments", post(feed::add_post_comment))
        .route("/posts/:id/like", post(feed::like_post))
        .route("/posts/:id/like", delete(feed::unlike_post));

    public_routes.merge(authenticated_routes)
}
