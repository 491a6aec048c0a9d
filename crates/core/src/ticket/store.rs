//! Ticket storage trait and types.

use thiserror::Error;

use crate::ticket::{Ticket, TicketComment, TicketPriority, TicketStatus};

/// Error type for ticket operations.
#[derive(Debug, Error)]
pub enum TicketError {
    /// Ticket not found.
    #[error("Ticket not found: {0}")]
    NotFound(String),

    /// Request is missing a required field or carries a blank one.
    #[error("{0}")]
    Validation(String),

    /// Status value outside the known set.
    #[error("Invalid status value: {0}")]
    InvalidStatusValue(String),

    /// Priority value outside the known set.
    #[error("Invalid priority value: {0}")]
    InvalidPriorityValue(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

/// Request to create a new ticket.
#[derive(Debug, Clone)]
pub struct CreateTicketRequest {
    /// User creating the ticket.
    pub created_by: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub priority: TicketPriority,
}

impl CreateTicketRequest {
    /// Check that every required text field is present and not blank.
    pub fn validate(&self) -> Result<(), TicketError> {
        let required = [
            ("title", &self.title),
            ("description", &self.description),
            ("category", &self.category),
            ("createdBy", &self.created_by),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(TicketError::Validation(format!("{} is required", field)));
            }
        }
        Ok(())
    }
}

/// Edit of a ticket's descriptive fields. `None` leaves a field as stored.
#[derive(Debug, Clone, Default)]
pub struct TicketDetailsUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub priority: Option<TicketPriority>,
}

impl TicketDetailsUpdate {
    /// Fields that are present must not be blank.
    pub fn validate(&self) -> Result<(), TicketError> {
        let provided = [
            ("title", &self.title),
            ("description", &self.description),
            ("category", &self.category),
        ];
        for (field, value) in provided {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                return Err(TicketError::Validation(format!("{} cannot be blank", field)));
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.priority.is_none()
    }
}

/// A comment about to be attached to a ticket.
#[derive(Debug, Clone)]
pub struct NewComment {
    pub ticket_id: String,
    pub author_id: String,
    pub body: String,
}

/// Filter for querying tickets.
#[derive(Debug, Clone)]
pub struct TicketFilter {
    pub status: Option<TicketStatus>,
    pub priority: Option<TicketPriority>,
    pub category: Option<String>,
    /// Filter by creator.
    pub created_by: Option<String>,
    /// Filter by assignee.
    pub assigned_to: Option<String>,
    /// Maximum number of results.
    pub limit: i64,
    /// Offset for pagination.
    pub offset: i64,
}

impl Default for TicketFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl TicketFilter {
    /// Create a new filter with defaults.
    pub fn new() -> Self {
        Self {
            status: None,
            priority: None,
            category: None,
            created_by: None,
            assigned_to: None,
            limit: 100,
            offset: 0,
        }
    }

    pub fn with_status(mut self, status: TicketStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_priority(mut self, priority: TicketPriority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Filter by creator.
    pub fn with_created_by(mut self, created_by: impl Into<String>) -> Self {
        self.created_by = Some(created_by.into());
        self
    }

    /// Filter by assignee.
    pub fn with_assigned_to(mut self, assigned_to: impl Into<String>) -> Self {
        self.assigned_to = Some(assigned_to.into());
        self
    }

    /// Set limit.
    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    /// Set offset.
    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }
}

/// Trait for ticket storage backends.
///
/// Writes are last-write-wins; there is no version check. Handlers use the
/// targeted writes (`save_status`, `assign`, `update_details`) so that
/// concurrent edits of different fields do not overwrite each other.
pub trait TicketStore: Send + Sync {
    /// Create a new ticket in status `New`.
    fn create(&self, request: CreateTicketRequest) -> Result<Ticket, TicketError>;

    /// Get a ticket by ID.
    fn get(&self, id: &str) -> Result<Option<Ticket>, TicketError>;

    /// Persist the mutable fields of `ticket` and stamp `updated_at`.
    ///
    /// A stored resolution time is never cleared. Returns the ticket as stored.
    fn save(&self, ticket: &Ticket) -> Result<Ticket, TicketError>;

    /// Persist only `status` and `resolution_time` of `ticket`.
    ///
    /// A stored resolution time is never cleared.
    fn save_status(&self, ticket: &Ticket) -> Result<Ticket, TicketError>;

    /// Set or clear the assignee, leaving every other field as stored.
    fn assign(&self, id: &str, assignee: Option<&str>) -> Result<Ticket, TicketError>;

    /// Apply a details edit. Status and resolution time are never touched.
    fn update_details(
        &self,
        id: &str,
        update: &TicketDetailsUpdate,
    ) -> Result<Ticket, TicketError>;

    /// List tickets matching the filter, newest first.
    fn list(&self, filter: &TicketFilter) -> Result<Vec<Ticket>, TicketError>;

    /// Count tickets matching the filter (ignores limit/offset).
    fn count(&self, filter: &TicketFilter) -> Result<i64, TicketError>;

    /// Permanently delete a ticket and its comments.
    /// Returns false if no such ticket existed.
    fn delete(&self, id: &str) -> Result<bool, TicketError>;

    /// Attach a comment to an existing ticket.
    fn add_comment(&self, comment: NewComment) -> Result<TicketComment, TicketError>;

    /// Comments on a ticket, oldest first.
    fn list_comments(&self, ticket_id: &str) -> Result<Vec<TicketComment>, TicketError>;
}
