//! Ticket status transitions.
//!
//! The only stateful rule of the domain lives here: a ticket captures its
//! resolution time at the moment it is moved into `Closed`. The functions are
//! pure. Callers supply the clock, authorize the change and persist the
//! result through a [`TicketStore`](super::TicketStore).

use chrono::{DateTime, Utc};

use super::{Ticket, TicketError, TicketStatus};

/// Record of a status transition applied to a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub from: TicketStatus,
    pub to: TicketStatus,
    /// Resolution time stamped by this transition, if it stamped one.
    pub resolved_at: Option<DateTime<Utc>>,
}

impl StatusChange {
    /// True when the status did not actually change.
    pub fn is_noop(&self) -> bool {
        self.from == self.to
    }
}

/// Move `ticket` to `new_status` at time `now`.
///
/// `resolution_time` is set to `now` only when the status changes and the
/// new status is `Closed`. Re-closing a closed ticket keeps the original
/// timestamp, and moving away from `Closed` does not clear it. No field other
/// than `status` and `resolution_time` is touched.
pub fn apply_status_transition(
    ticket: &mut Ticket,
    new_status: TicketStatus,
    now: DateTime<Utc>,
) -> StatusChange {
    let from = ticket.status;

    let resolved_at = if new_status != from && new_status == TicketStatus::Closed {
        ticket.resolution_time = Some(now);
        Some(now)
    } else {
        None
    };

    ticket.status = new_status;

    StatusChange {
        from,
        to: new_status,
        resolved_at,
    }
}

/// Parse a client-supplied status and apply it.
///
/// Fails with [`TicketError::InvalidStatusValue`] before touching the ticket
/// if `requested` is not one of the known statuses.
pub fn apply_requested_status(
    ticket: &mut Ticket,
    requested: &str,
    now: DateTime<Utc>,
) -> Result<StatusChange, TicketError> {
    let new_status: TicketStatus = requested.parse()?;
    Ok(apply_status_transition(ticket, new_status, now))
}
