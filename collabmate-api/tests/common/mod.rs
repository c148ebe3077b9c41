/// Shared test harness for API integration tests
///
/// Builds the full router over an in-memory datastore and a mock issue
/// source, then drives it request-by-request through tower's `Service`
/// interface, no sockets involved.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use collabmate_api::app::{build_router, AppState};
use collabmate_api::config::{ApiConfig, Config, GitlabConfig, JwtConfig, StorageConfig};
use collabmate_shared::gitlab::source::MockIssueSource;
use collabmate_shared::store::Datastore;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::Service;

/// JWT secret used by every test context
pub const TEST_SECRET: &str = "integration-test-secret-key-32-bytes";

pub struct TestContext {
    pub app: Router,
    pub store: Arc<Datastore>,
}

impl TestContext {
    /// Context with an empty mock remote
    pub fn new() -> Self {
        Self::with_source(MockIssueSource::default())
    }

    /// Context over specific remote fixtures
    pub fn with_source(source: MockIssueSource) -> Self {
        let config = Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors_origins: vec!["*".to_string()],
            },
            storage: StorageConfig {
                data_dir: "./unused".into(),
            },
            jwt: JwtConfig {
                secret: TEST_SECRET.to_string(),
            },
            gitlab: GitlabConfig {
                api_url: "http://127.0.0.1:0".to_string(),
            },
        };

        let store = Arc::new(Datastore::in_memory());
        let state = AppState::new(store.clone(), config, Arc::new(source));

        Self {
            app: build_router(state),
            store,
        }
    }

    /// Sends one request and returns (status, parsed JSON body)
    pub async fn request(
        &mut self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.call(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        (status, body)
    }

    /// Registers a user and returns (user id, token)
    pub async fn register(&mut self, username: &str, email: &str, password: &str) -> (String, String) {
        let (status, body) = self
            .request(
                "POST",
                "/v1/auth/register",
                None,
                Some(json!({
                    "username": username,
                    "email": email,
                    "password": password,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);

        (
            body["userId"].as_str().expect("userId in response").to_string(),
            body["token"].as_str().expect("token in response").to_string(),
        )
    }

    /// Logs a user in and returns the fresh token
    pub async fn login(&mut self, email: &str, password: &str) -> String {
        let (status, body) = self
            .request(
                "POST",
                "/v1/auth/login",
                None,
                Some(json!({ "email": email, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);
        body["token"].as_str().expect("token in response").to_string()
    }
}
