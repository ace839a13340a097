//! Common test utilities for E2E tests

use tandem::{config, AppState};
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Test server instance
pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    pub _temp_dir: TempDir,
    pub client: reqwest::Client,
}

impl TestServer {
    /// Create a new test server instance
    pub async fn new() -> Self {
        // Create temporary directory for test database
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        // Create test configuration
        let config = config::AppConfig {
            server: config::ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Let OS assign port
                domain: "localhost".to_string(),
                protocol: "http".to_string(),
            },
            database: config::DatabaseConfig {
                path: db_path.clone(),
            },
            storage: config::StorageConfig {
                media: config::MediaStorageConfig {
                    bucket: "test-media".to_string(),
                    public_url: "https://media.test.example.com".to_string(),
                },
                s3: config::S3Config {
                    endpoint: "https://test-account.r2.cloudflarestorage.com".to_string(),
                    access_key_id: "test-key".to_string(),
                    secret_access_key: "test-secret".to_string(),
                },
            },
            auth: config::AuthConfig {
                session_secret: "test-secret-key-32-bytes-long!!!".to_string(),
                session_max_age: 604800,
            },
            community: config::CommunityConfig {
                grid_limit: 60,
                online_window_seconds: 300,
            },
            city_search: config::CitySearchConfig {
                endpoint: "https://api.api-ninjas.com/v1/city".to_string(),
                api_key: None,
            },
            logging: config::LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        };

        // Initialize app state
        let state = AppState::new(config).await.unwrap();

        // Create HTTP client with a cookie store so sessions stick
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap();

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let addr_str = format!("http://{}", addr);

        // Build router
        let app = tandem::build_router(state.clone());

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait a bit for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        Self {
            addr: addr_str,
            state,
            _temp_dir: temp_dir,
            client,
        }
    }

    /// Get base URL for API requests
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    /// Seed a member profile directly in the database
    pub async fn seed_profile(&self, id: &str, name: Option<&str>) {
        use tandem::data::Profile;

        let mut profile = Profile::empty(id);
        profile.name = name.map(str::to_string);
        self.state.db.upsert_profile(&profile).await.unwrap();
    }

    /// Create a bearer token for a seeded member
    pub fn bearer_token(&self, user_id: &str, username: &str) -> String {
        use chrono::{Duration, Utc};
        use tandem::auth::session::{create_session_token, Session};

        let session = Session {
            user_id: user_id.to_string(),
            username: username.to_string(),
            name: None,
            avatar_url: None,
            created_at: Utc::now(),
            expires_at: Utc::now() + Duration::days(7),
        };

        create_session_token(&session, &self.state.config.auth.session_secret)
            .expect("Failed to create test token")
    }

    /// Register a member through the API and return their user id
    pub async fn register(&self, username: &str, name: Option<&str>) -> String {
        let response = self
            .client
            .post(self.url("/auth/register"))
            .json(&serde_json::json!({
                "username": username,
                "password": "password123",
                "name": name,
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);

        let body: serde_json::Value = response.json().await.unwrap();
        body["user_id"].as_str().unwrap().to_string()
    }
}
