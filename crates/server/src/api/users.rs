//! User account handlers.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use servicedesk_core::{AuditEvent, Role, User};

use super::error::ApiError;
use super::middleware::{require_admin, require_staff, AuthUser};
use crate::state::AppState;

const MAX_LIMIT: i64 = 1000;
const DEFAULT_LIMIT: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct ListUsersParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ListUsersResponse {
    pub users: Vec<User>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleBody {
    #[serde(default)]
    pub role: String,
}

/// All accounts, ordered by username. Admin and support.
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Query(params): Query<ListUsersParams>,
) -> Result<Json<ListUsersResponse>, ApiError> {
    require_staff(&identity)?;

    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = params.offset.unwrap_or(0).max(0);

    Ok(Json(ListUsersResponse {
        users: state.user_store().list(limit, offset)?,
        total: state.user_store().count()?,
        limit,
        offset,
    }))
}

/// A single account. Staff may read anyone; others only themselves.
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<User>, ApiError> {
    if !identity.is_staff() && identity.user_id != id {
        return Err(ApiError::forbidden());
    }

    state
        .user_store()
        .get(&id)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("User not found"))
}

/// Change an account's role. Admin only.
pub async fn update_role(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Path(id): Path<String>,
    Json(body): Json<UpdateRoleBody>,
) -> Result<Json<User>, ApiError> {
    require_admin(&identity)?;

    let role: Role = body.role.parse()?;
    let previous = state
        .user_store()
        .get(&id)?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let updated = state.user_store().update_role(&id, role)?;

    if previous.role != updated.role {
        tracing::info!(
            user_id = %updated.id,
            from = %previous.role,
            to = %updated.role,
            changed_by = %identity.user_id,
            "User role changed"
        );
        state.audit().try_emit(AuditEvent::UserRoleChanged {
            target_user_id: updated.id.clone(),
            changed_by: identity.user_id.clone(),
            from_role: previous.role,
            to_role: updated.role,
        });
    }

    Ok(Json(updated))
}
