//! Tickets: data model, status lifecycle and storage.

mod lifecycle;
mod sqlite_store;
mod store;
mod types;

pub use lifecycle::{apply_requested_status, apply_status_transition, StatusChange};
pub use sqlite_store::SqliteTicketStore;
pub use store::{
    CreateTicketRequest, NewComment, TicketDetailsUpdate, TicketError, TicketFilter, TicketStore,
};
pub use types::{Ticket, TicketComment, TicketPriority, TicketStatus};
