//! Authentication
//!
//! Handles:
//! - Register / login / logout with salted-hash credentials
//! - HMAC-signed cookie sessions
//! - Authentication extractors

mod middleware;
mod password;
pub mod session;

pub use middleware::{CurrentUser, MaybeUser, SESSION_COOKIE};
pub use session::{create_session_token, verify_session_token, Session};

use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{Duration, Utc};
use serde::Deserialize;

use crate::data::{Credential, EntityId};
use crate::error::AppError;
use crate::AppState;

/// Create authentication router
///
/// Routes:
/// - POST /auth/register - Create account and sign in
/// - POST /auth/login - Sign in
/// - POST /auth/logout - Sign out
/// - GET /auth/session - Current session info
pub fn auth_router() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/session", get(current_session))
}

#[derive(Debug, Deserialize)]
struct RegisterRequest {
    username: String,
    password: String,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

const MIN_PASSWORD_CHARS: usize = 8;

/// POST /auth/register
///
/// Creates the profile row and credentials, then signs the caller in.
async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<RegisterRequest>,
) -> Result<(CookieJar, Json<serde_json::Value>), AppError> {
    let username = request.username.trim().to_string();
    if username.is_empty() {
        return Err(AppError::Validation("username cannot be empty".to_string()));
    }
    if request.password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(AppError::Validation(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_CHARS
        )));
    }

    if state.db.get_credential(&username).await?.is_some() {
        return Err(AppError::Validation("username is taken".to_string()));
    }

    let user_id = EntityId::new().0;
    let mut profile = crate::data::Profile::empty(&user_id);
    profile.username = Some(username.clone());
    profile.name = request.name.clone();
    state.db.upsert_profile(&profile).await?;

    let credential = Credential {
        user_id: user_id.clone(),
        username: username.clone(),
        password_hash: password::hash_password(&request.password)?,
        created_at: Utc::now(),
    };
    state.db.insert_credential(&credential).await?;

    tracing::info!(user_id = %user_id, username = %username, "Member registered");

    let (jar, session) = issue_session(&state, jar, &user_id, &username, request.name, None)?;
    Ok((jar, Json(session_body(&session))))
}

/// POST /auth/login
async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> Result<(CookieJar, Json<serde_json::Value>), AppError> {
    let username = request.username.trim();

    let credential = state
        .db
        .get_credential(username)
        .await?
        .ok_or(AppError::Unauthorized)?;

    if !password::verify_password(&request.password, &credential.password_hash) {
        return Err(AppError::Unauthorized);
    }

    // Carry display fields into the session; absent profile is fine
    let profile = state.db.get_profile(&credential.user_id).await?;
    let (name, avatar_url) = profile
        .map(|p| (p.name, p.avatar_url))
        .unwrap_or((None, None));

    state
        .db
        .touch_last_seen(&credential.user_id, Utc::now())
        .await?;

    let (jar, session) = issue_session(
        &state,
        jar,
        &credential.user_id,
        &credential.username,
        name,
        avatar_url,
    )?;
    Ok((jar, Json(session_body(&session))))
}

/// POST /auth/logout
///
/// Clears the session cookie.
async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Json<serde_json::Value>) {
    let removal = Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .secure(state.config.should_use_secure_cookies())
        .same_site(SameSite::Lax)
        .build();

    (jar.remove(removal), Json(serde_json::json!({})))
}

/// GET /auth/session
///
/// Returns the session identity, or `null` when signed out.
async fn current_session(MaybeUser(session): MaybeUser) -> Json<serde_json::Value> {
    match session {
        Some(session) => Json(session_body(&session)),
        None => Json(serde_json::Value::Null),
    }
}

fn issue_session(
    state: &AppState,
    jar: CookieJar,
    user_id: &str,
    username: &str,
    name: Option<String>,
    avatar_url: Option<String>,
) -> Result<(CookieJar, Session), AppError> {
    let now = Utc::now();
    let session = Session {
        user_id: user_id.to_string(),
        username: username.to_string(),
        name,
        avatar_url,
        created_at: now,
        expires_at: now + Duration::seconds(state.config.auth.session_max_age),
    };

    // Expiry lives inside the signed token; the cookie itself is a
    // plain session cookie.
    let token = create_session_token(&session, &state.config.auth.session_secret)?;
    let cookie = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(state.config.should_use_secure_cookies())
        .same_site(SameSite::Lax)
        .build();

    Ok((jar.add(cookie), session))
}

fn session_body(session: &Session) -> serde_json::Value {
    serde_json::json!({
        "user_id": session.user_id,
        "username": session.username,
        "name": session.name,
        "avatar_url": session.avatar_url,
        "expires_at": session.expires_at,
    })
}
