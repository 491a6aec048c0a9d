//! Authentication and metrics middleware for API routes.

use axum::{
    body::Body,
    extract::{ConnectInfo, FromRequestParts, State},
    http::{request::Parts, Request},
    middleware::Next,
    response::Response,
};
use std::collections::HashMap;
use std::future::Future;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Instant;
use servicedesk_core::{AuthError, AuthRequest, Identity};

use super::error::ApiError;
use crate::metrics::{
    normalize_path, AUTH_FAILURES_TOTAL, HTTP_REQUESTS_IN_FLIGHT, HTTP_REQUESTS_TOTAL,
    HTTP_REQUEST_DURATION,
};
use crate::state::AppState;

/// Records request duration, request count and requests in flight.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = normalize_path(request.uri().path());

    HTTP_REQUESTS_IN_FLIGHT.inc();
    let response = next.run(request).await;
    HTTP_REQUESTS_IN_FLIGHT.dec();

    let duration = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    HTTP_REQUEST_DURATION
        .with_label_values(&[&method, &path, &status])
        .observe(duration);
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[&method, &path, &status])
        .inc();

    response
}

/// Rejects requests without a valid bearer token.
///
/// On success the caller's [`Identity`] is inserted into the request
/// extensions. The role carried by the token is replaced with the role
/// currently stored for the user, so role changes apply without a new login.
/// A token for a user that no longer exists is rejected.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let headers: HashMap<String, String> = request
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_lowercase(), v.to_string()))
        })
        .collect();

    let source_ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST));

    let auth_request = AuthRequest { headers, source_ip };

    let mut identity = match state.authenticator().authenticate(&auth_request).await {
        Ok(identity) => identity,
        Err(e) => {
            AUTH_FAILURES_TOTAL.with_label_values(&[e.reason()]).inc();
            tracing::debug!(reason = e.reason(), %source_ip, "Authentication failed");
            return Err(match e {
                AuthError::NotAuthenticated => ApiError::unauthorized("No token, authorization denied"),
                AuthError::InvalidCredentials(_) => ApiError::unauthorized("Token is not valid"),
                other => ApiError::from(other),
            });
        }
    };

    match state.user_store().get(&identity.user_id)? {
        Some(user) => identity.role = user.role,
        None => {
            AUTH_FAILURES_TOTAL.with_label_values(&["unknown_user"]).inc();
            return Err(ApiError::unauthorized("Token is not valid"));
        }
    }

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

/// Extractor for the authenticated caller.
///
/// Only valid on routes behind [`auth_middleware`]; rejects with 401 otherwise.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Identity);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl Future<Output = Result<Self, Self::Rejection>> + Send {
        let identity = parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| ApiError::unauthorized("Authentication required"));
        std::future::ready(identity)
    }
}

/// 403 unless the caller is an admin.
pub fn require_admin(identity: &Identity) -> Result<(), ApiError> {
    if identity.is_admin() {
        Ok(())
    } else {
        Err(ApiError::forbidden())
    }
}

/// 403 unless the caller is an admin or support agent.
pub fn require_staff(identity: &Identity) -> Result<(), ApiError> {
    if identity.is_staff() {
        Ok(())
    } else {
        Err(ApiError::forbidden())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        http::{header, StatusCode},
        middleware,
        routing::get,
        Router,
    };
    use http_body_util::BodyExt;
    use servicedesk_core::{
        create_audit_system, AuditStore, AuthConfig, AuthMethod, Authenticator, Config,
        DatabaseConfig, JwtAuthenticator, NewUser, Role, SqliteAuditStore, SqliteTicketStore,
        SqliteUserStore, TicketStore, UserStore,
    };
    use servicedesk_core::config::ServerConfig;
    use tower::ServiceExt;

    const SECRET: &str = "middleware-test-secret";

    struct Harness {
        state: Arc<AppState>,
        jwt: JwtAuthenticator,
        user_store: Arc<SqliteUserStore>,
    }

    fn harness() -> Harness {
        let config = Config {
            auth: AuthConfig {
                method: AuthMethod::Jwt,
                jwt_secret: Some(SECRET.to_string()),
                token_ttl_hours: 1,
                bootstrap_admin: None,
            },
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
        };

        let user_store = Arc::new(SqliteUserStore::in_memory().unwrap());
        let audit_store: Arc<dyn AuditStore> = Arc::new(SqliteAuditStore::in_memory().unwrap());
        let (audit_handle, _writer) = create_audit_system(audit_store.clone(), 16);
        let ticket_store: Arc<dyn TicketStore> = Arc::new(SqliteTicketStore::in_memory().unwrap());

        let state = Arc::new(AppState::new(
            config,
            Arc::new(JwtAuthenticator::new(SECRET, 1)) as Arc<dyn Authenticator>,
            audit_handle,
            audit_store,
            ticket_store,
            user_store.clone() as Arc<dyn UserStore>,
        ));

        Harness {
            state,
            jwt: JwtAuthenticator::new(SECRET, 1),
            user_store,
        }
    }

    async fn whoami(AuthUser(identity): AuthUser) -> String {
        format!("{}:{}", identity.username, identity.role)
    }

    fn app(state: Arc<AppState>) -> Router {
        Router::new()
            .route("/whoami", get(whoami))
            .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
            .with_state(state)
    }

    async fn call(app: Router, auth: Option<String>) -> (StatusCode, String) {
        let mut builder = Request::builder().uri("/whoami");
        if let Some(value) = auth {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        let response = app
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_valid_token_reaches_handler() {
        let h = harness();
        let user = h
            .user_store
            .create(NewUser {
                username: "alice".to_string(),
                email: None,
                password_hash: "x".to_string(),
                role: Role::User,
            })
            .unwrap();
        let token = h.jwt.issue_credential(&user).unwrap().token;

        let (status, body) = call(app(h.state), Some(format!("Bearer {}", token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "alice:user");
    }

    #[tokio::test]
    async fn test_role_is_refreshed_from_store() {
        let h = harness();
        let user = h
            .user_store
            .create(NewUser {
                username: "bob".to_string(),
                email: None,
                password_hash: "x".to_string(),
                role: Role::User,
            })
            .unwrap();
        let token = h.jwt.issue_credential(&user).unwrap().token;
        h.user_store.update_role(&user.id, Role::Support).unwrap();

        let (status, body) = call(app(h.state), Some(format!("Bearer {}", token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "bob:support");
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let h = harness();
        let (status, body) = call(app(h.state), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains("\"error\""));
    }

    #[tokio::test]
    async fn test_invalid_token_is_unauthorized() {
        let h = harness();
        let (status, _) = call(app(h.state), Some("Bearer garbage".to_string())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_token_for_deleted_user_is_unauthorized() {
        let h = harness();
        let now = chrono::Utc::now();
        let ghost = servicedesk_core::User {
            id: "ghost".to_string(),
            username: "ghost".to_string(),
            email: None,
            password_hash: String::new(),
            role: Role::Admin,
            created_at: now,
            updated_at: now,
        };
        let token = h.jwt.issue_credential(&ghost).unwrap().token;

        let (status, _) = call(app(h.state), Some(format!("Bearer {}", token))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_extractor_without_middleware_rejects() {
        let router: Router = Router::new().route("/whoami", get(whoami));
        let (status, _) = call(router, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
