//! Shared fixture for in-process API tests.
//!
//! Builds the real router over file-backed SQLite stores in a temp
//! directory, with the audit writer running in the background.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use servicedesk_core::{
    create_audit_system, AuditFilter, AuditStore, AuthConfig, AuthMethod, Authenticator, Config,
    DatabaseConfig, JwtAuthenticator, NewUser, Role, ServerConfig, SqliteAuditStore,
    SqliteTicketStore, SqliteUserStore, TicketStore, UserStore,
};
use servicedesk_server::{api::create_router, state::AppState};

pub const JWT_SECRET: &str = "integration-test-secret";

/// In-process server plus direct handles on its stores.
pub struct TestFixture {
    pub router: Router,
    pub audit_store: Arc<dyn AuditStore>,
    pub ticket_store: Arc<dyn TicketStore>,
    pub user_store: Arc<dyn UserStore>,
    pub jwt: JwtAuthenticator,
    /// Keeps the database alive for the fixture's lifetime
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// A user created directly in the store, with a token ready to use.
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: String,
    pub username: String,
    pub token: String,
}

impl TestFixture {
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");

        let config = Config {
            auth: AuthConfig {
                method: AuthMethod::Jwt,
                jwt_secret: Some(JWT_SECRET.to_string()),
                token_ttl_hours: 1,
                bootstrap_admin: None,
            },
            server: ServerConfig {
                host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
                port: 5009,
                web_dir: None,
            },
            database: DatabaseConfig {
                path: db_path.clone(),
            },
        };

        let audit_store: Arc<dyn AuditStore> =
            Arc::new(SqliteAuditStore::new(&db_path).expect("Failed to create audit store"));
        let ticket_store: Arc<dyn TicketStore> =
            Arc::new(SqliteTicketStore::new(&db_path).expect("Failed to create ticket store"));
        let user_store: Arc<dyn UserStore> =
            Arc::new(SqliteUserStore::new(&db_path).expect("Failed to create user store"));

        let (audit_handle, audit_writer) = create_audit_system(Arc::clone(&audit_store), 100);
        tokio::spawn(audit_writer.run());

        let state = Arc::new(AppState::new(
            config,
            Arc::new(JwtAuthenticator::new(JWT_SECRET, 1)) as Arc<dyn Authenticator>,
            audit_handle,
            Arc::clone(&audit_store),
            Arc::clone(&ticket_store),
            Arc::clone(&user_store),
        ));

        Self {
            router: create_router(state),
            audit_store,
            ticket_store,
            user_store,
            jwt: JwtAuthenticator::new(JWT_SECRET, 1),
            temp_dir,
        }
    }

    /// Create an account with the given role and mint a token for it.
    ///
    /// The stored password hash is a placeholder; use the register endpoint
    /// when a test needs to log in with a password.
    pub fn create_user(&self, username: &str, role: Role) -> TestUser {
        let user = self
            .user_store
            .create(NewUser {
                username: username.to_string(),
                email: None,
                password_hash: "not-a-real-hash".to_string(),
                role,
            })
            .expect("Failed to create user");
        let token = self
            .jwt
            .issue_credential(&user)
            .expect("Failed to issue token")
            .token;

        TestUser {
            id: user.id,
            username: user.username,
            token,
        }
    }

    pub fn admin(&self) -> TestUser {
        self.create_user("admin", Role::Admin)
    }

    pub fn support(&self) -> TestUser {
        self.create_user("support", Role::Support)
    }

    /// Register through the API and return the token response body.
    pub async fn register(&self, username: &str, password: &str) -> TestResponse {
        self.post(
            "/api/auth/register",
            None,
            json!({ "username": username, "password": password }),
        )
        .await
    }

    /// Create a ticket as `user` and return its JSON.
    pub async fn create_ticket(&self, user: &TestUser, title: &str) -> Value {
        let response = self
            .post(
                "/api/tickets",
                Some(&user.token),
                json!({
                    "title": title,
                    "description": "Details",
                    "category": "Hardware",
                }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.body
    }

    /// Poll until at least `count` audit records match `filter`.
    pub async fn wait_for_audit(&self, filter: &AuditFilter, count: i64) -> bool {
        for _ in 0..50 {
            if self.audit_store.count(filter).unwrap_or(0) >= count {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> TestResponse {
        self.request("GET", path, token, None).await
    }

    pub async fn post(&self, path: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request("POST", path, token, Some(body)).await
    }

    pub async fn put(&self, path: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request("PUT", path, token, Some(body)).await
    }

    pub async fn patch(&self, path: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request("PATCH", path, token, Some(body)).await
    }

    pub async fn delete(&self, path: &str, token: Option<&str>) -> TestResponse {
        self.request("DELETE", path, token, None).await
    }

    /// Send a request and return the raw body as text.
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    async fn request(
        &self,
        method: &str,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        if let Some(token) = token {
            request_builder = request_builder.header("Authorization", format!("Bearer {}", token));
        }

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}
