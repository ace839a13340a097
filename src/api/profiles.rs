//! Profile, community grid, and avatar endpoints

use axum::{
    extract::{Multipart, Path, Query, State},
    response::Json,
};
use serde::{Deserialize, Serialize};

use crate::auth::CurrentUser;
use crate::data::Profile;
use crate::error::AppError;
use crate::service::{CommunityMember, ProfileService, ProfileUpdate};
use crate::AppState;

const MAX_AVATAR_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

fn profile_service(state: &AppState) -> ProfileService {
    ProfileService::new(
        state.db.clone(),
        state.storage.clone(),
        state.http_client.clone(),
        state.config.clone(),
    )
}

/// GET /api/profile
///
/// The caller's own profile; an empty row is created on first access.
pub async fn get_own_profile(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
) -> Result<Json<Profile>, AppError> {
    let profile = profile_service(&state).get_own(&session.user_id).await?;
    Ok(Json(profile))
}

/// PUT /api/profile
///
/// Wholesale update of the editable field set.
pub async fn update_own_profile(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<Profile>, AppError> {
    let profile = profile_service(&state)
        .update(&session.user_id, update)
        .await?;
    Ok(Json(profile))
}

/// GET /api/profiles/:id
pub async fn get_public_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Profile>, AppError> {
    let profile = profile_service(&state).get_public(&id).await?;
    Ok(Json(profile))
}

/// GET /api/community
///
/// Member cards for the landing-page grid.
pub async fn community_grid(
    State(state): State<AppState>,
) -> Result<Json<Vec<CommunityMember>>, AppError> {
    let members = profile_service(&state).community_grid().await?;
    Ok(Json(members))
}

#[derive(Debug, Serialize)]
pub struct AvatarResponse {
    pub avatar_url: String,
}

/// POST /api/profile/avatar
///
/// Multipart avatar upload; images only.
pub async fn upload_avatar(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    mut multipart: Multipart,
) -> Result<Json<AvatarResponse>, AppError> {
    let mut file_data: Option<Vec<u8>> = None;
    let mut content_type: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("failed to parse multipart: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        content_type = field.content_type().map(|s| s.to_string());
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("failed to read upload: {}", e)))?;
        if bytes.len() > MAX_AVATAR_UPLOAD_BYTES {
            return Err(AppError::Validation(format!(
                "avatar exceeds {} bytes",
                MAX_AVATAR_UPLOAD_BYTES
            )));
        }
        file_data = Some(bytes.to_vec());
    }

    let data = file_data.ok_or_else(|| AppError::Validation("missing file field".to_string()))?;
    let content_type =
        content_type.ok_or_else(|| AppError::Validation("missing content type".to_string()))?;

    let avatar_url = profile_service(&state)
        .upload_avatar(&session.user_id, data, &content_type)
        .await?;

    Ok(Json(AvatarResponse { avatar_url }))
}

/// POST /api/presence
///
/// Heartbeat recording the caller's activity; online status on the
/// grid and in conversations derives from it.
pub async fn presence_ping(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
) -> Result<Json<serde_json::Value>, AppError> {
    profile_service(&state)
        .touch_last_seen(&session.user_id)
        .await?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

#[derive(Debug, Deserialize)]
pub struct CitySearchParams {
    pub query: String,
    pub country: Option<String>,
}

/// GET /api/cities
///
/// City suggestions for the profile editor. Never fails: lookup
/// errors fall back to synthesized suggestions.
pub async fn search_cities(
    State(state): State<AppState>,
    CurrentUser(_session): CurrentUser,
    Query(params): Query<CitySearchParams>,
) -> Json<Vec<String>> {
    let cities = profile_service(&state)
        .search_cities(&params.query, params.country.as_deref())
        .await;
    Json(cities)
}
