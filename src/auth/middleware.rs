//! Authentication middleware
//!
//! Protects routes that require authentication.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, HeaderMap},
};
use axum_extra::extract::CookieJar;

use super::session::{verify_session_token, Session};
use crate::error::AppError;
use crate::AppState;

pub const SESSION_COOKIE: &str = "session";

fn extract_token_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(ToOwned::to_owned)
        .or_else(|| {
            let jar = CookieJar::from_headers(headers);
            jar.get(SESSION_COOKIE)
                .map(|cookie| cookie.value().to_owned())
        })
}

fn authenticate_token(token: &str, state: &AppState) -> Result<Session, AppError> {
    verify_session_token(token, &state.config.auth.session_secret)
}

/// Extractor for current authenticated user
///
/// Use in handlers to get the current session.
///
/// # Usage
/// ```ignore
/// async fn handler(
///     CurrentUser(session): CurrentUser,
/// ) -> impl IntoResponse {
///     format!("Hello, {}", session.username)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Session);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(session) = parts.extensions.get::<Session>().cloned() {
            return Ok(CurrentUser(session));
        }

        let state = AppState::from_ref(state);
        let token = extract_token_from_headers(&parts.headers).ok_or(AppError::Unauthorized)?;
        let session = authenticate_token(&token, &state)?;
        parts.extensions.insert(session.clone());

        Ok(CurrentUser(session))
    }
}

/// Optional current user extractor
///
/// Returns None if not authenticated, instead of error. Views that
/// tolerate an absent user render empty data rather than failing.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<Session>);

#[async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(session) = parts.extensions.get::<Session>().cloned() {
            return Ok(MaybeUser(Some(session)));
        }

        let app_state = AppState::from_ref(state);
        let session = extract_token_from_headers(&parts.headers)
            .and_then(|token| authenticate_token(&token, &app_state).ok());

        if let Some(session) = &session {
            parts.extensions.insert(session.clone());
        }

        Ok(MaybeUser(session))
    }
}
