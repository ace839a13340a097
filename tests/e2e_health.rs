//! E2E tests for health check and basic server functionality

mod common;

use common::TestServer;

#[tokio::test]
async fn test_health_check() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(server.url("/health"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body = response.text().await.unwrap();
    assert_eq!(body, "OK");
}

#[tokio::test]
async fn test_cors_headers() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(server.url("/health"))
        .header("Origin", "https://test.example.com")
        .send()
        .await
        .unwrap();

    assert!(
        response
            .headers()
            .contains_key("access-control-allow-origin")
    );
}

#[tokio::test]
async fn test_404_for_unknown_routes() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(server.url("/unknown/route"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_protected_route_requires_session() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(server.url("/api/conversations"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 401);
}
