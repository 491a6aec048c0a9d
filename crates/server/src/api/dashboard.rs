//! Aggregates for the staff dashboard.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use servicedesk_core::{AuditFilter, AuditRecord, Ticket, TicketFilter, TicketPriority, TicketStatus};

use super::error::ApiError;
use super::middleware::{require_admin, require_staff, AuthUser};
use crate::state::AppState;

const MAX_LIMIT: i64 = 100;
const DEFAULT_RECENT_LIMIT: i64 = 5;
const DEFAULT_ACTIVITY_LIMIT: i64 = 10;

#[derive(Debug, Deserialize)]
pub struct LimitParams {
    pub limit: Option<i64>,
}

/// Ticket counts. Every status and priority appears, zero if unused.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total: i64,
    pub by_status: BTreeMap<&'static str, i64>,
    pub by_priority: BTreeMap<&'static str, i64>,
}

fn count_by_status(state: &AppState) -> Result<BTreeMap<&'static str, i64>, ApiError> {
    let mut counts = BTreeMap::new();
    for status in TicketStatus::ALL {
        let count = state
            .ticket_store()
            .count(&TicketFilter::new().with_status(status))?;
        counts.insert(status.as_str(), count);
    }
    Ok(counts)
}

fn count_by_priority(state: &AppState) -> Result<BTreeMap<&'static str, i64>, ApiError> {
    let mut counts = BTreeMap::new();
    for priority in TicketPriority::ALL {
        let count = state
            .ticket_store()
            .count(&TicketFilter::new().with_priority(priority))?;
        counts.insert(priority.as_str(), count);
    }
    Ok(counts)
}

pub async fn stats(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
) -> Result<Json<DashboardStats>, ApiError> {
    require_staff(&identity)?;

    Ok(Json(DashboardStats {
        total: state.ticket_store().count(&TicketFilter::new())?,
        by_status: count_by_status(&state)?,
        by_priority: count_by_priority(&state)?,
    }))
}

/// Ticket count per status.
pub async fn ticket_status(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
) -> Result<Json<BTreeMap<&'static str, i64>>, ApiError> {
    require_staff(&identity)?;
    Ok(Json(count_by_status(&state)?))
}

/// Ticket count per priority.
pub async fn ticket_priority(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
) -> Result<Json<BTreeMap<&'static str, i64>>, ApiError> {
    require_staff(&identity)?;
    Ok(Json(count_by_priority(&state)?))
}

/// Newest tickets across all users.
pub async fn recent_tickets(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Query(params): Query<LimitParams>,
) -> Result<Json<Vec<Ticket>>, ApiError> {
    require_staff(&identity)?;

    let limit = params.limit.unwrap_or(DEFAULT_RECENT_LIMIT).clamp(1, MAX_LIMIT);
    let tickets = state
        .ticket_store()
        .list(&TicketFilter::new().with_limit(limit))?;
    Ok(Json(tickets))
}

/// Latest audit records. Admin only.
pub async fn activity_log(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Query(params): Query<LimitParams>,
) -> Result<Json<Vec<AuditRecord>>, ApiError> {
    require_admin(&identity)?;

    let limit = params
        .limit
        .unwrap_or(DEFAULT_ACTIVITY_LIMIT)
        .clamp(1, MAX_LIMIT);
    let records = state
        .audit_store()
        .query(&AuditFilter::new().with_limit(limit))?;
    Ok(Json(records))
}
