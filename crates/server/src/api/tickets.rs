//! Ticket API handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use servicedesk_core::{
    apply_requested_status, AuditEvent, CreateTicketRequest, Identity, NewComment, Ticket,
    TicketComment, TicketDetailsUpdate, TicketFilter, TicketPriority, TicketStatus,
};

use super::error::ApiError;
use super::middleware::{require_admin, require_staff, AuthUser};
use crate::metrics::{TICKETS_CREATED_TOTAL, TICKET_STATUS_TRANSITIONS};
use crate::state::AppState;

/// Maximum allowed limit for ticket queries
pub const MAX_LIMIT: i64 = 1000;

/// Default limit for ticket queries
pub const DEFAULT_LIMIT: i64 = 100;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateTicketBody {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    /// Defaults to `Medium`
    pub priority: Option<String>,
}

/// Query parameters for the admin ticket listing
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTicketsParams {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub category: Option<String>,
    pub created_by: Option<String>,
    pub assigned_to: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Paging for the per-user listings
#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Descriptive fields of a ticket. Omitted fields are left unchanged.
#[derive(Debug, Deserialize)]
pub struct UpdateTicketBody {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub priority: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusBody {
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignBody {
    /// `null` clears the assignee
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CommentBody {
    #[serde(default)]
    pub comment: String,
}

#[derive(Debug, Serialize)]
pub struct ListTicketsResponse {
    pub tickets: Vec<Ticket>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

// ============================================================================
// Helpers
// ============================================================================

fn paged(filter: TicketFilter, limit: Option<i64>, offset: Option<i64>) -> TicketFilter {
    filter
        .with_limit(limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT))
        .with_offset(offset.unwrap_or(0).max(0))
}

fn list_page(state: &AppState, filter: TicketFilter) -> Result<ListTicketsResponse, ApiError> {
    let tickets = state.ticket_store().list(&filter)?;
    let total = state.ticket_store().count(&filter)?;
    Ok(ListTicketsResponse {
        tickets,
        total,
        limit: filter.limit,
        offset: filter.offset,
    })
}

fn load_ticket(state: &AppState, id: &str) -> Result<Ticket, ApiError> {
    state
        .ticket_store()
        .get(id)?
        .ok_or_else(|| ApiError::not_found("Ticket not found"))
}

/// Load a ticket the caller is allowed to read.
fn load_visible_ticket(
    state: &AppState,
    identity: &Identity,
    id: &str,
) -> Result<Ticket, ApiError> {
    let ticket = load_ticket(state, id)?;
    if !identity.can_view(&ticket) {
        return Err(ApiError::forbidden());
    }
    Ok(ticket)
}

// ============================================================================
// Handlers
// ============================================================================

/// Open a ticket on behalf of the caller.
pub async fn create_ticket(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Json(body): Json<CreateTicketBody>,
) -> Result<(StatusCode, Json<Ticket>), ApiError> {
    let priority = match body.priority.as_deref() {
        Some(raw) => raw.parse::<TicketPriority>()?,
        None => TicketPriority::default(),
    };

    let ticket = state.ticket_store().create(CreateTicketRequest {
        created_by: identity.user_id.clone(),
        title: body.title,
        description: body.description,
        category: body.category,
        priority,
    })?;

    TICKETS_CREATED_TOTAL.inc();
    tracing::info!(ticket_id = %ticket.id, created_by = %ticket.created_by, priority = %ticket.priority, "Ticket created");
    state.audit().try_emit(AuditEvent::TicketCreated {
        ticket_id: ticket.id.clone(),
        created_by: ticket.created_by.clone(),
        title: ticket.title.clone(),
        priority: ticket.priority,
        category: ticket.category.clone(),
    });

    Ok((StatusCode::CREATED, Json(ticket)))
}

/// List every ticket, with optional filters. Admin only.
pub async fn list_tickets(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Query(params): Query<ListTicketsParams>,
) -> Result<Json<ListTicketsResponse>, ApiError> {
    require_admin(&identity)?;

    let mut filter = paged(TicketFilter::new(), params.limit, params.offset);

    if let Some(ref status) = params.status {
        filter = filter.with_status(status.parse::<TicketStatus>()?);
    }
    if let Some(ref priority) = params.priority {
        filter = filter.with_priority(priority.parse::<TicketPriority>()?);
    }
    if let Some(category) = params.category {
        filter = filter.with_category(category);
    }
    if let Some(created_by) = params.created_by {
        filter = filter.with_created_by(created_by);
    }
    if let Some(assigned_to) = params.assigned_to {
        filter = filter.with_assigned_to(assigned_to);
    }

    Ok(Json(list_page(&state, filter)?))
}

/// Tickets created by the caller.
pub async fn my_tickets(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Query(params): Query<PageParams>,
) -> Result<Json<ListTicketsResponse>, ApiError> {
    let filter = paged(
        TicketFilter::new().with_created_by(identity.user_id),
        params.limit,
        params.offset,
    );
    Ok(Json(list_page(&state, filter)?))
}

/// Tickets assigned to the caller.
pub async fn assigned_tickets(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Query(params): Query<PageParams>,
) -> Result<Json<ListTicketsResponse>, ApiError> {
    let filter = paged(
        TicketFilter::new().with_assigned_to(identity.user_id),
        params.limit,
        params.offset,
    );
    Ok(Json(list_page(&state, filter)?))
}

pub async fn get_ticket(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Ticket>, ApiError> {
    Ok(Json(load_visible_ticket(&state, &identity, &id)?))
}

/// Move a ticket to a new status. Admin only.
///
/// Entering `Closed` stamps the resolution time with the server clock.
pub async fn update_status(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Path(id): Path<String>,
    Json(body): Json<UpdateStatusBody>,
) -> Result<Json<Ticket>, ApiError> {
    require_admin(&identity)?;

    let mut ticket = load_ticket(&state, &id)?;
    let change = apply_requested_status(&mut ticket, &body.status, Utc::now())?;
    let saved = state.ticket_store().save_status(&ticket)?;

    if !change.is_noop() {
        TICKET_STATUS_TRANSITIONS
            .with_label_values(&[change.from.as_str(), change.to.as_str()])
            .inc();
        tracing::info!(
            ticket_id = %saved.id,
            from = %change.from,
            to = %change.to,
            resolution_time = ?change.resolved_at,
            "Ticket status changed"
        );
        state.audit().try_emit(AuditEvent::TicketStatusChanged {
            ticket_id: saved.id.clone(),
            changed_by: identity.user_id.clone(),
            from_status: change.from,
            to_status: change.to,
            resolution_time: change.resolved_at,
        });
    }

    Ok(Json(saved))
}

/// Set or clear the assignee. Admin and support.
pub async fn assign_ticket(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Path(id): Path<String>,
    Json(body): Json<AssignBody>,
) -> Result<Json<Ticket>, ApiError> {
    require_staff(&identity)?;

    let ticket = load_ticket(&state, &id)?;

    if let Some(ref assignee) = body.user_id {
        if state.user_store().get(assignee)?.is_none() {
            return Err(ApiError::bad_request(format!("Unknown user: {}", assignee)));
        }
    }

    let saved = state
        .ticket_store()
        .assign(&id, body.user_id.as_deref())?;

    tracing::info!(ticket_id = %saved.id, assignee = ?saved.assigned_to, "Ticket assigned");
    state.audit().try_emit(AuditEvent::TicketAssigned {
        ticket_id: saved.id.clone(),
        assigned_by: identity.user_id.clone(),
        previous_assignee: ticket.assigned_to,
        assignee: saved.assigned_to.clone(),
    });

    Ok(Json(saved))
}

/// Edit title, description, category or priority. Admin and support.
///
/// Status and resolution time can only change through [`update_status`].
pub async fn update_ticket(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Path(id): Path<String>,
    Json(body): Json<UpdateTicketBody>,
) -> Result<Json<Ticket>, ApiError> {
    require_staff(&identity)?;

    let update = TicketDetailsUpdate {
        title: body.title,
        description: body.description,
        category: body.category,
        priority: body
            .priority
            .as_deref()
            .map(str::parse::<TicketPriority>)
            .transpose()?,
    };
    if update.is_empty() {
        return Err(ApiError::bad_request("No fields to update"));
    }

    let fields: Vec<String> = [
        ("title", update.title.is_some()),
        ("description", update.description.is_some()),
        ("category", update.category.is_some()),
        ("priority", update.priority.is_some()),
    ]
    .into_iter()
    .filter(|(_, present)| *present)
    .map(|(name, _)| name.to_string())
    .collect();

    let saved = state.ticket_store().update_details(&id, &update)?;

    tracing::info!(ticket_id = %saved.id, fields = ?fields, "Ticket updated");
    state.audit().try_emit(AuditEvent::TicketUpdated {
        ticket_id: saved.id.clone(),
        updated_by: identity.user_id.clone(),
        fields,
    });

    Ok(Json(saved))
}

/// Permanently delete a ticket and its comments. Admin only.
pub async fn delete_ticket(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    require_admin(&identity)?;

    let ticket = load_ticket(&state, &id)?;
    if !state.ticket_store().delete(&id)? {
        return Err(ApiError::not_found("Ticket not found"));
    }

    tracing::info!(ticket_id = %id, deleted_by = %identity.user_id, "Ticket deleted");
    state.audit().try_emit(AuditEvent::TicketDeleted {
        ticket_id: id,
        deleted_by: identity.user_id.clone(),
        previous_status: ticket.status,
    });

    Ok(StatusCode::NO_CONTENT)
}

/// Comment on a ticket the caller can see.
pub async fn add_comment(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Path(id): Path<String>,
    Json(body): Json<CommentBody>,
) -> Result<(StatusCode, Json<TicketComment>), ApiError> {
    load_visible_ticket(&state, &identity, &id)?;

    let comment = state.ticket_store().add_comment(NewComment {
        ticket_id: id,
        author_id: identity.user_id.clone(),
        body: body.comment,
    })?;

    state.audit().try_emit(AuditEvent::CommentAdded {
        ticket_id: comment.ticket_id.clone(),
        comment_id: comment.id.clone(),
        author_id: comment.author_id.clone(),
    });

    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn list_comments(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<TicketComment>>, ApiError> {
    load_visible_ticket(&state, &identity, &id)?;
    Ok(Json(state.ticket_store().list_comments(&id)?))
}
