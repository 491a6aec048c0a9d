//! Registration, login and current-user handlers.

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use servicedesk_core::{
    hash_password, verify_password, AuditEvent, NewUser, Role, User, UserError,
};

use super::error::ApiError;
use super::middleware::AuthUser;
use crate::metrics::AUTH_FAILURES_TOTAL;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginBody {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub token: String,
    pub user_id: String,
    pub role: Role,
    pub expires_at: DateTime<Utc>,
}

fn token_response(state: &AppState, user: &User) -> Result<TokenResponse, ApiError> {
    let issued = state.authenticator().issue_credential(user)?;
    Ok(TokenResponse {
        token: issued.token,
        user_id: user.id.clone(),
        role: user.role,
        expires_at: issued.expires_at,
    })
}

/// Create an account with the default `user` role and log it in.
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterBody>,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
    if body.username.trim().is_empty() || body.password.is_empty() {
        return Err(ApiError::bad_request("username and password are required"));
    }

    let password_hash = hash_password(&body.password)?;
    let user = state
        .user_store()
        .create(NewUser {
            username: body.username,
            email: body.email,
            password_hash,
            role: Role::default(),
        })
        .map_err(|e| match e {
            UserError::DuplicateUsername(_) => {
                ApiError::new(StatusCode::CONFLICT, "User already exists")
            }
            other => ApiError::from(other),
        })?;

    tracing::info!(user_id = %user.id, username = %user.username, "User registered");
    state.audit().try_emit(AuditEvent::UserRegistered {
        user_id: user.id.clone(),
        username: user.username.clone(),
        role: user.role,
    });

    Ok((StatusCode::CREATED, Json(token_response(&state, &user)?)))
}

/// Exchange username and password for a bearer token.
///
/// Unknown usernames and wrong passwords get the same response.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginBody>,
) -> Result<Json<TokenResponse>, ApiError> {
    let username = body.username.trim();
    let user = state.user_store().find_by_username(username)?;

    let user = match user {
        Some(user) if verify_password(&body.password, &user.password_hash) => user,
        _ => {
            AUTH_FAILURES_TOTAL.with_label_values(&["bad_password"]).inc();
            tracing::warn!(%username, "Login failed");
            return Err(ApiError::unauthorized("Invalid credentials"));
        }
    };

    tracing::info!(user_id = %user.id, "User logged in");
    state.audit().try_emit(AuditEvent::UserLoggedIn {
        user_id: user.id.clone(),
        username: user.username.clone(),
    });

    Ok(Json(token_response(&state, &user)?))
}

/// The authenticated caller's account.
pub async fn me(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
) -> Result<Json<User>, ApiError> {
    state
        .user_store()
        .get(&identity.user_id)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("User not found"))
}
