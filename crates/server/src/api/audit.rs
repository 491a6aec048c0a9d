use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use servicedesk_core::{AuditFilter, AuditRecord};

use super::error::ApiError;
use super::middleware::{require_admin, AuthUser};
use crate::state::AppState;

/// Maximum allowed limit for audit queries
const MAX_LIMIT: i64 = 1000;

/// Default limit for audit queries
const DEFAULT_LIMIT: i64 = 100;

/// Query parameters for audit endpoint
#[derive(Debug, Deserialize)]
pub struct AuditQueryParams {
    /// Filter by ticket ID
    pub ticket_id: Option<String>,
    /// Filter by event type (e.g. `ticket_status_changed`)
    pub event_type: Option<String>,
    /// Filter by acting user
    pub user_id: Option<String>,
    /// Events at or after this timestamp (RFC 3339)
    pub from: Option<DateTime<Utc>>,
    /// Events at or before this timestamp (RFC 3339)
    pub to: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct AuditQueryResponse {
    pub events: Vec<AuditRecord>,
    /// Matching events ignoring paging
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Query the audit trail. Admin only.
pub async fn query_audit(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Query(params): Query<AuditQueryParams>,
) -> Result<Json<AuditQueryResponse>, ApiError> {
    require_admin(&identity)?;

    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = params.offset.unwrap_or(0).max(0);

    let mut base_filter = AuditFilter::new();

    if let Some(ticket_id) = params.ticket_id {
        base_filter = base_filter.with_ticket_id(ticket_id);
    }
    if let Some(event_type) = params.event_type {
        base_filter = base_filter.with_event_type(event_type);
    }
    if let Some(user_id) = params.user_id {
        base_filter = base_filter.with_user_id(user_id);
    }
    if params.from.is_some() || params.to.is_some() {
        base_filter = base_filter.with_time_range(params.from, params.to);
    }

    let query_filter = base_filter.clone().with_limit(limit).with_offset(offset);

    let events = state.audit_store().query(&query_filter)?;
    let total = state.audit_store().count(&base_filter)?;

    Ok(Json(AuditQueryResponse {
        events,
        total,
        limit,
        offset,
    }))
}
