//! E2E tests for profiles, the community grid, and the feed

mod common;

use common::TestServer;

#[tokio::test]
async fn test_own_profile_created_on_first_access() {
    let server = TestServer::new().await;
    let token = server.bearer_token("u1", "ana");

    let profile: serde_json::Value = server
        .client
        .get(server.url("/api/profile"))
        .header("Authorization", format!("Bearer {token}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(profile["id"], "u1");
    assert!(profile["name"].is_null());
    assert_eq!(profile["native_languages"], serde_json::json!([]));
}

#[tokio::test]
async fn test_profile_update_round_trip() {
    let server = TestServer::new().await;
    server.seed_profile("u1", None).await;
    let token = server.bearer_token("u1", "ana");

    let update = serde_json::json!({
        "name": "Ana",
        "age": 29,
        "city": "Lyon",
        "country": "France",
        "bio": "Practicing German",
        "gender": "female",
        "native_languages": ["French"],
        "language_levels": [{ "language": "German", "level": "intermediate" }],
        "interested_in": ["everyone"],
        "looking_for": ["language exchange"],
    });

    let response = server
        .client
        .put(server.url("/api/profile"))
        .header("Authorization", format!("Bearer {token}"))
        .json(&update)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let profile: serde_json::Value = server
        .client
        .get(server.url("/api/profile"))
        .header("Authorization", format!("Bearer {token}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(profile["name"], "Ana");
    assert_eq!(profile["age"], 29);
    assert_eq!(profile["city"], "Lyon");
    assert_eq!(profile["native_languages"], serde_json::json!(["French"]));
    assert_eq!(
        profile["language_levels"],
        serde_json::json!([{ "language": "German", "level": "intermediate" }])
    );
}

#[tokio::test]
async fn test_public_profile_and_404() {
    let server = TestServer::new().await;
    server.seed_profile("u1", Some("Ana")).await;

    let response = server
        .client
        .get(server.url("/api/profiles/u1"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let response = server
        .client
        .get(server.url("/api/profiles/nope"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_community_grid_defaults() {
    let server = TestServer::new().await;
    server.seed_profile("u1", None).await;

    let mut named = tandem::data::Profile::empty("u2");
    named.name = Some("Ben".to_string());
    named.city = Some("Berlin".to_string());
    named.country = Some("Germany".to_string());
    named.last_seen = Some(chrono::Utc::now());
    server.state.db.upsert_profile(&named).await.unwrap();

    let members: Vec<serde_json::Value> = server
        .client
        .get(server.url("/api/community"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(members.len(), 2);
    let anonymous = members.iter().find(|m| m["id"] == "u1").unwrap();
    assert_eq!(anonymous["name"], "Anonymous");
    assert!(anonymous["location"].is_null());
    assert_eq!(anonymous["is_online"], false);

    let ben = members.iter().find(|m| m["id"] == "u2").unwrap();
    assert_eq!(ben["name"], "Ben");
    assert_eq!(ben["location"], "Berlin, Germany");
    assert_eq!(ben["is_online"], true);
}

#[tokio::test]
async fn test_presence_ping_marks_member_online() {
    let server = TestServer::new().await;
    server.seed_profile("u1", Some("Ana")).await;
    let token = server.bearer_token("u1", "ana");

    let response = server
        .client
        .post(server.url("/api/presence"))
        .header("Authorization", format!("Bearer {token}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let members: Vec<serde_json::Value> = server
        .client
        .get(server.url("/api/community"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(members[0]["is_online"], true);
}

#[tokio::test]
async fn test_city_search_falls_back_without_api_key() {
    let server = TestServer::new().await;
    server.seed_profile("u1", Some("Ana")).await;
    let token = server.bearer_token("u1", "ana");

    let cities: Vec<String> = server
        .client
        .get(server.url("/api/cities"))
        .header("Authorization", format!("Bearer {token}"))
        .query(&[("query", "Spring"), ("country", "US")])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(cities.len(), 4);
    assert!(cities.contains(&"Spring City, US".to_string()));

    // Short queries yield nothing
    let cities: Vec<String> = server
        .client
        .get(server.url("/api/cities"))
        .header("Authorization", format!("Bearer {token}"))
        .query(&[("query", "Sp")])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(cities.is_empty());
}

#[tokio::test]
async fn test_posts_with_comments_and_likes() {
    let server = TestServer::new().await;
    server.seed_profile("u1", Some("Ana")).await;
    server.seed_profile("u2", Some("Ben")).await;
    let ana = server.bearer_token("u1", "ana");
    let ben = server.bearer_token("u2", "ben");

    let post: serde_json::Value = server
        .client
        .post(server.url("/api/posts"))
        .header("Authorization", format!("Bearer {ana}"))
        .json(&serde_json::json!({ "content": "Finally visited the old town!" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let post_id = post["id"].as_str().unwrap().to_string();

    // Ben comments and likes
    let comment: serde_json::Value = server
        .client
        .post(server.url(&format!("/api/posts/{post_id}/comments")))
        .header("Authorization", format!("Bearer {ben}"))
        .json(&serde_json::json!({ "content": "Looks great" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(comment["author"]["name"], "Ben");

    let like: serde_json::Value = server
        .client
        .post(server.url(&format!("/api/posts/{post_id}/like")))
        .header("Authorization", format!("Bearer {ben}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(like["likes_count"], 1);

    // Liking twice stays at one
    let like: serde_json::Value = server
        .client
        .post(server.url(&format!("/api/posts/{post_id}/like")))
        .header("Authorization", format!("Bearer {ben}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(like["likes_count"], 1);

    // Ben sees his like state; anonymous viewers do not
    let posts: Vec<serde_json::Value> = server
        .client
        .get(server.url("/api/profiles/u1/posts"))
        .header("Authorization", format!("Bearer {ben}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0]["is_liked"], true);
    assert_eq!(posts[0]["author"]["name"], "Ana");
    assert_eq!(posts[0]["comments"][0]["content"], "Looks great");

    let bare = reqwest::Client::new();
    let posts: Vec<serde_json::Value> = bare
        .get(server.url("/api/profiles/u1/posts"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(posts[0]["is_liked"], false);

    // Unlike drops the count back
    let unlike: serde_json::Value = server
        .client
        .delete(server.url(&format!("/api/posts/{post_id}/like")))
        .header("Authorization", format!("Bearer {ben}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(unlike["likes_count"], 0);
}

#[tokio::test]
async fn test_photo_comment_thread() {
    let server = TestServer::new().await;
    server.seed_profile("u1", Some("Ana")).await;
    let token = server.bearer_token("u1", "ana");
    let photo_url = "https://media.test.example.com/photos/p1.webp";

    for content in ["Nice shot", "Where is this?"] {
        let response = server
            .client
            .post(server.url("/api/photo-comments"))
            .header("Authorization", format!("Bearer {token}"))
            .json(&serde_json::json!({ "photo_url": photo_url, "content": content }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;
    }

    let comments: Vec<serde_json::Value> = server
        .client
        .get(server.url("/api/photo-comments"))
        .query(&[("photo_url", photo_url)])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0]["content"], "Nice shot");
    assert_eq!(comments[1]["content"], "Where is this?");
    assert_eq!(comments[0]["author"]["name"], "Ana");
}
