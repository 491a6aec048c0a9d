use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ticket::{TicketPriority, TicketStatus};
use crate::user::Role;

/// Audit event types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditEvent {
    // System events
    ServiceStarted {
        version: String,
        config_hash: String,
    },
    ServiceStopped {
        reason: String,
    },

    // Account events
    UserRegistered {
        user_id: String,
        username: String,
        role: Role,
    },
    UserLoggedIn {
        user_id: String,
        username: String,
    },
    UserRoleChanged {
        /// Account whose role changed
        target_user_id: String,
        changed_by: String,
        from_role: Role,
        to_role: Role,
    },

    // Ticket lifecycle
    TicketCreated {
        ticket_id: String,
        created_by: String,
        title: String,
        priority: TicketPriority,
        category: String,
    },
    TicketStatusChanged {
        ticket_id: String,
        changed_by: String,
        from_status: TicketStatus,
        to_status: TicketStatus,
        /// Resolution time stamped by this change, if any
        #[serde(default, skip_serializing_if = "Option::is_none")]
        resolution_time: Option<DateTime<Utc>>,
    },
    TicketAssigned {
        ticket_id: String,
        assigned_by: String,
        previous_assignee: Option<String>,
        assignee: Option<String>,
    },
    /// Descriptive fields edited; lists the field names that were sent.
    TicketUpdated {
        ticket_id: String,
        updated_by: String,
        fields: Vec<String>,
    },
    /// Ticket was permanently deleted (hard delete).
    TicketDeleted {
        ticket_id: String,
        deleted_by: String,
        previous_status: TicketStatus,
    },
    CommentAdded {
        ticket_id: String,
        comment_id: String,
        author_id: String,
    },
}

impl AuditEvent {
    /// Returns the event type as a string for storage
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::ServiceStarted { .. } => "service_started",
            Self::ServiceStopped { .. } => "service_stopped",
            Self::UserRegistered { .. } => "user_registered",
            Self::UserLoggedIn { .. } => "user_logged_in",
            Self::UserRoleChanged { .. } => "user_role_changed",
            Self::TicketCreated { .. } => "ticket_created",
            Self::TicketStatusChanged { .. } => "ticket_status_changed",
            Self::TicketAssigned { .. } => "ticket_assigned",
            Self::TicketUpdated { .. } => "ticket_updated",
            Self::TicketDeleted { .. } => "ticket_deleted",
            Self::CommentAdded { .. } => "comment_added",
        }
    }

    /// Ticket this event concerns, if any
    pub fn ticket_id(&self) -> Option<&str> {
        match self {
            Self::TicketCreated { ticket_id, .. }
            | Self::TicketStatusChanged { ticket_id, .. }
            | Self::TicketAssigned { ticket_id, .. }
            | Self::TicketUpdated { ticket_id, .. }
            | Self::TicketDeleted { ticket_id, .. }
            | Self::CommentAdded { ticket_id, .. } => Some(ticket_id),
            Self::ServiceStarted { .. }
            | Self::ServiceStopped { .. }
            | Self::UserRegistered { .. }
            | Self::UserLoggedIn { .. }
            | Self::UserRoleChanged { .. } => None,
        }
    }

    /// User who performed the action, if any
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Self::ServiceStarted { .. } | Self::ServiceStopped { .. } => None,
            Self::UserRegistered { user_id, .. } | Self::UserLoggedIn { user_id, .. } => {
                Some(user_id)
            }
            Self::UserRoleChanged { changed_by, .. } => Some(changed_by),
            Self::TicketCreated { created_by, .. } => Some(created_by),
            Self::TicketStatusChanged { changed_by, .. } => Some(changed_by),
            Self::TicketAssigned { assigned_by, .. } => Some(assigned_by),
            Self::TicketUpdated { updated_by, .. } => Some(updated_by),
            Self::TicketDeleted { deleted_by, .. } => Some(deleted_by),
            Self::CommentAdded { author_id, .. } => Some(author_id),
        }
    }
}

/// Stored audit record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub ticket_id: Option<String>,
    pub user_id: Option<String>,
    pub data: AuditEvent,
}
