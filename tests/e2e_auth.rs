//! E2E tests for registration, login, and sessions

mod common;

use common::TestServer;

#[tokio::test]
async fn test_register_creates_session_and_profile() {
    let server = TestServer::new().await;

    let user_id = server.register("ana", Some("Ana")).await;

    // Session cookie from registration authenticates follow-up calls
    let response = server
        .client
        .get(server.url("/auth/session"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let session: serde_json::Value = response.json().await.unwrap();
    assert_eq!(session["user_id"], user_id);
    assert_eq!(session["username"], "ana");

    // A profile row exists for the new member
    let profile = server.state.db.get_profile(&user_id).await.unwrap().unwrap();
    assert_eq!(profile.username.as_deref(), Some("ana"));
    assert_eq!(profile.name.as_deref(), Some("Ana"));
}

#[tokio::test]
async fn test_register_rejects_taken_username() {
    let server = TestServer::new().await;
    server.register("ana", None).await;

    let response = server
        .client
        .post(server.url("/auth/register"))
        .json(&serde_json::json!({
            "username": "ana",
            "password": "password123",
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_register_rejects_short_password() {
    let server = TestServer::new().await;

    let response = server
        .client
        .post(server.url("/auth/register"))
        .json(&serde_json::json!({
            "username": "ana",
            "password": "short",
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_login_with_wrong_password_fails() {
    let server = TestServer::new().await;
    server.register("ana", None).await;

    let response = server
        .client
        .post(server.url("/auth/login"))
        .json(&serde_json::json!({
            "username": "ana",
            "password": "not-the-password",
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_login_round_trip() {
    let server = TestServer::new().await;
    let user_id = server.register("ana", Some("Ana")).await;

    let response = server
        .client
        .post(server.url("/auth/login"))
        .json(&serde_json::json!({
            "username": "ana",
            "password": "password123",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["user_id"], user_id);
    assert_eq!(body["name"], "Ana");

    // Login records activity for online-status derivation
    let profile = server.state.db.get_profile(&user_id).await.unwrap().unwrap();
    assert!(profile.last_seen.is_some());
}

#[tokio::test]
async fn test_logout_clears_session() {
    let server = TestServer::new().await;
    server.register("ana", None).await;

    let response = server
        .client
        .post(server.url("/auth/logout"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let session: serde_json::Value = server
        .client
        .get(server.url("/auth/session"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(session.is_null());
}

#[tokio::test]
async fn test_bearer_token_authenticates() {
    let server = TestServer::new().await;
    server.seed_profile("u1", Some("Ana")).await;
    let token = server.bearer_token("u1", "ana");

    // Separate client without the cookie store
    let bare = reqwest::Client::new();
    let response = bare
        .get(server.url("/api/conversations"))
        .header("Authorization", format!("Bearer {token}"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
}
