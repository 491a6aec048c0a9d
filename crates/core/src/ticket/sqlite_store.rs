//! SQLite-backed ticket store implementation.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::{
    CreateTicketRequest, NewComment, Ticket, TicketComment, TicketDetailsUpdate, TicketError,
    TicketFilter, TicketPriority, TicketStatus, TicketStore,
};

const TICKET_COLUMNS: &str = "id, title, description, status, priority, category, created_by, assigned_to, resolution_time, created_at, updated_at";

/// SQLite-backed ticket store.
pub struct SqliteTicketStore {
    conn: Mutex<Connection>,
}

/// Fixed-width RFC 3339 so stored timestamps sort lexicographically.
fn encode_time(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn decode_time(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

impl SqliteTicketStore {
    /// Create a new SQLite ticket store, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, TicketError> {
        let conn = Connection::open(path).map_err(|e| TicketError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite ticket store (useful for testing).
    pub fn in_memory() -> Result<Self, TicketError> {
        let conn =
            Connection::open_in_memory().map_err(|e| TicketError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), TicketError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS tickets (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'New',
                priority TEXT NOT NULL DEFAULT 'Medium',
                category TEXT NOT NULL,
                created_by TEXT NOT NULL,
                assigned_to TEXT,
                resolution_time TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_tickets_created_by ON tickets(created_by);
            CREATE INDEX IF NOT EXISTS idx_tickets_assigned_to ON tickets(assigned_to);
            CREATE INDEX IF NOT EXISTS idx_tickets_status ON tickets(status);
            CREATE INDEX IF NOT EXISTS idx_tickets_created_at ON tickets(created_at DESC);

            CREATE TABLE IF NOT EXISTS ticket_comments (
                id TEXT PRIMARY KEY,
                ticket_id TEXT NOT NULL,
                author_id TEXT NOT NULL,
                body TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_ticket_comments_ticket ON ticket_comments(ticket_id, created_at);
            "#,
        )
        .map_err(|e| TicketError::Database(e.to_string()))?;

        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, TicketError> {
        self.conn
            .lock()
            .map_err(|_| TicketError::Database("ticket store lock poisoned".to_string()))
    }

    fn build_where_clause(filter: &TicketFilter) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
        let mut conditions = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(status) = filter.status {
            conditions.push("status = ?");
            params.push(Box::new(status.as_str()));
        }

        if let Some(priority) = filter.priority {
            conditions.push("priority = ?");
            params.push(Box::new(priority.as_str()));
        }

        if let Some(ref category) = filter.category {
            conditions.push("category = ?");
            params.push(Box::new(category.clone()));
        }

        if let Some(ref created_by) = filter.created_by {
            conditions.push("created_by = ?");
            params.push(Box::new(created_by.clone()));
        }

        if let Some(ref assigned_to) = filter.assigned_to {
            conditions.push("assigned_to = ?");
            params.push(Box::new(assigned_to.clone()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        (where_clause, params)
    }

    fn row_to_ticket(row: &rusqlite::Row) -> rusqlite::Result<Ticket> {
        let status_str: String = row.get(3)?;
        let priority_str: String = row.get(4)?;
        let resolution_str: Option<String> = row.get(8)?;
        let created_at_str: String = row.get(9)?;
        let updated_at_str: String = row.get(10)?;

        let status: TicketStatus = status_str.parse().map_err(|e: TicketError| {
            rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
        })?;
        let priority: TicketPriority = priority_str.parse().map_err(|e: TicketError| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
        })?;

        Ok(Ticket {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            status,
            priority,
            category: row.get(5)?,
            created_by: row.get(6)?,
            assigned_to: row.get(7)?,
            resolution_time: resolution_str
                .as_deref()
                .map(|raw| decode_time(8, raw))
                .transpose()?,
            created_at: decode_time(9, &created_at_str)?,
            updated_at: decode_time(10, &updated_at_str)?,
        })
    }

    fn row_to_comment(row: &rusqlite::Row) -> rusqlite::Result<TicketComment> {
        let created_at_str: String = row.get(4)?;
        Ok(TicketComment {
            id: row.get(0)?,
            ticket_id: row.get(1)?,
            author_id: row.get(2)?,
            body: row.get(3)?,
            created_at: decode_time(4, &created_at_str)?,
        })
    }

    /// Run a single-row UPDATE and return the ticket as stored afterwards.
    fn update_row(
        conn: &Connection,
        id: &str,
        sql: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> Result<Ticket, TicketError> {
        let updated = conn
            .execute(sql, params)
            .map_err(|e| TicketError::Database(e.to_string()))?;

        if updated == 0 {
            return Err(TicketError::NotFound(id.to_string()));
        }

        Self::fetch(conn, id)?.ok_or_else(|| TicketError::NotFound(id.to_string()))
    }

    fn fetch(conn: &Connection, id: &str) -> Result<Option<Ticket>, TicketError> {
        conn.query_row(
            &format!("SELECT {} FROM tickets WHERE id = ?", TICKET_COLUMNS),
            params![id],
            Self::row_to_ticket,
        )
        .optional()
        .map_err(|e| TicketError::Database(e.to_string()))
    }
}

impl TicketStore for SqliteTicketStore {
    fn create(&self, request: CreateTicketRequest) -> Result<Ticket, TicketError> {
        request.validate()?;
        let conn = self.lock()?;

        let now = Utc::now();
        let ticket = Ticket {
            id: uuid::Uuid::new_v4().to_string(),
            title: request.title,
            description: request.description,
            status: TicketStatus::New,
            priority: request.priority,
            category: request.category,
            created_by: request.created_by,
            assigned_to: None,
            resolution_time: None,
            created_at: now,
            updated_at: now,
        };

        conn.execute(
            &format!(
                "INSERT INTO tickets ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                TICKET_COLUMNS
            ),
            params![
                ticket.id,
                ticket.title,
                ticket.description,
                ticket.status.as_str(),
                ticket.priority.as_str(),
                ticket.category,
                ticket.created_by,
                ticket.assigned_to,
                Option::<String>::None,
                encode_time(&now),
                encode_time(&now),
            ],
        )
        .map_err(|e| TicketError::Database(e.to_string()))?;

        Ok(ticket)
    }

    fn get(&self, id: &str) -> Result<Option<Ticket>, TicketError> {
        let conn = self.lock()?;
        Self::fetch(&conn, id)
    }

    fn save(&self, ticket: &Ticket) -> Result<Ticket, TicketError> {
        let conn = self.lock()?;
        let now = encode_time(&Utc::now());
        let resolution_time = ticket.resolution_time.as_ref().map(encode_time);

        // id, created_by and created_at are immutable and never written here.
        Self::update_row(
            &conn,
            &ticket.id,
            "UPDATE tickets SET title = ?, description = ?, status = ?, priority = ?, category = ?, assigned_to = ?, resolution_time = COALESCE(?, resolution_time), updated_at = ? WHERE id = ?",
            &[
                &ticket.title,
                &ticket.description,
                &ticket.status.as_str(),
                &ticket.priority.as_str(),
                &ticket.category,
                &ticket.assigned_to,
                &resolution_time,
                &now,
                &ticket.id,
            ],
        )
    }

    fn save_status(&self, ticket: &Ticket) -> Result<Ticket, TicketError> {
        let conn = self.lock()?;
        let now = encode_time(&Utc::now());
        let resolution_time = ticket.resolution_time.as_ref().map(encode_time);

        Self::update_row(
            &conn,
            &ticket.id,
            "UPDATE tickets SET status = ?, resolution_time = COALESCE(?, resolution_time), updated_at = ? WHERE id = ?",
            &[&ticket.status.as_str(), &resolution_time, &now, &ticket.id],
        )
    }

    fn assign(&self, id: &str, assignee: Option<&str>) -> Result<Ticket, TicketError> {
        let conn = self.lock()?;
        let now = encode_time(&Utc::now());

        Self::update_row(
            &conn,
            id,
            "UPDATE tickets SET assigned_to = ?, updated_at = ? WHERE id = ?",
            &[&assignee, &now, &id],
        )
    }

    fn update_details(
        &self,
        id: &str,
        update: &TicketDetailsUpdate,
    ) -> Result<Ticket, TicketError> {
        update.validate()?;
        let conn = self.lock()?;
        let now = encode_time(&Utc::now());
        let priority = update.priority.map(|p| p.as_str());

        Self::update_row(
            &conn,
            id,
            "UPDATE tickets SET title = COALESCE(?, title), description = COALESCE(?, description), category = COALESCE(?, category), priority = COALESCE(?, priority), updated_at = ? WHERE id = ?",
            &[
                &update.title,
                &update.description,
                &update.category,
                &priority,
                &now,
                &id,
            ],
        )
    }

    fn list(&self, filter: &TicketFilter) -> Result<Vec<Ticket>, TicketError> {
        let conn = self.lock()?;

        let (where_clause, params) = Self::build_where_clause(filter);

        let sql = format!(
            "SELECT {} FROM tickets {} ORDER BY created_at DESC, rowid DESC LIMIT ? OFFSET ?",
            TICKET_COLUMNS, where_clause
        );

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| TicketError::Database(e.to_string()))?;

        let mut all_params: Vec<Box<dyn rusqlite::ToSql>> = params;
        all_params.push(Box::new(filter.limit));
        all_params.push(Box::new(filter.offset));

        let param_refs: Vec<&dyn rusqlite::ToSql> = all_params.iter().map(|p| p.as_ref()).collect();

        let rows = stmt
            .query_map(param_refs.as_slice(), Self::row_to_ticket)
            .map_err(|e| TicketError::Database(e.to_string()))?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| TicketError::Database(e.to_string()))
    }

    fn count(&self, filter: &TicketFilter) -> Result<i64, TicketError> {
        let conn = self.lock()?;

        let (where_clause, params) = Self::build_where_clause(filter);

        let sql = format!("SELECT COUNT(*) FROM tickets {}", where_clause);

        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        conn.query_row(&sql, param_refs.as_slice(), |row| row.get(0))
            .map_err(|e| TicketError::Database(e.to_string()))
    }

    fn delete(&self, id: &str) -> Result<bool, TicketError> {
        let mut conn = self.lock()?;

        let tx = conn
            .transaction()
            .map_err(|e| TicketError::Database(e.to_string()))?;

        tx.execute("DELETE FROM ticket_comments WHERE ticket_id = ?", params![id])
            .map_err(|e| TicketError::Database(e.to_string()))?;
        let deleted = tx
            .execute("DELETE FROM tickets WHERE id = ?", params![id])
            .map_err(|e| TicketError::Database(e.to_string()))?;

        tx.commit()
            .map_err(|e| TicketError::Database(e.to_string()))?;

        Ok(deleted > 0)
    }

    fn add_comment(&self, comment: NewComment) -> Result<TicketComment, TicketError> {
        if comment.body.trim().is_empty() {
            return Err(TicketError::Validation("comment is required".to_string()));
        }

        let conn = self.lock()?;

        let exists: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM tickets WHERE id = ?)",
                params![comment.ticket_id],
                |row| row.get(0),
            )
            .map_err(|e| TicketError::Database(e.to_string()))?;
        if !exists {
            return Err(TicketError::NotFound(comment.ticket_id));
        }

        let stored = TicketComment {
            id: uuid::Uuid::new_v4().to_string(),
            ticket_id: comment.ticket_id,
            author_id: comment.author_id,
            body: comment.body,
            created_at: Utc::now(),
        };

        conn.execute(
            "INSERT INTO ticket_comments (id, ticket_id, author_id, body, created_at) VALUES (?, ?, ?, ?, ?)",
            params![
                stored.id,
                stored.ticket_id,
                stored.author_id,
                stored.body,
                encode_time(&stored.created_at),
            ],
        )
        .map_err(|e| TicketError::Database(e.to_string()))?;

        Ok(stored)
    }

    fn list_comments(&self, ticket_id: &str) -> Result<Vec<TicketComment>, TicketError> {
        let conn = self.lock()?;

        let mut stmt = conn
            .prepare(
                "SELECT id, ticket_id, author_id, body, created_at FROM ticket_comments WHERE ticket_id = ? ORDER BY created_at ASC, rowid ASC",
            )
            .map_err(|e| TicketError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params![ticket_id], Self::row_to_comment)
            .map_err(|e| TicketError::Database(e.to_string()))?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| TicketError::Database(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ticket::apply_status_transition;

    fn create_test_store() -> SqliteTicketStore {
        SqliteTicketStore::in_memory().unwrap()
    }

    fn create_test_request() -> CreateTicketRequest {
        CreateTicketRequest {
            created_by: "test-user".to_string(),
            title: "Laptop will not boot".to_string(),
            description: "Black screen after the BIOS logo".to_string(),
            category: "Hardware".to_string(),
            priority: TicketPriority::High,
        }
    }

    #[test]
    fn test_create_ticket() {
        let store = create_test_store();
        let request = create_test_request();

        let ticket = store.create(request.clone()).unwrap();

        assert!(!ticket.id.is_empty());
        assert_eq!(ticket.created_by, request.created_by);
        assert_eq!(ticket.title, request.title);
        assert_eq!(ticket.priority, TicketPriority::High);
        assert_eq!(ticket.status, TicketStatus::New);
        assert!(ticket.assigned_to.is_none());
        assert!(ticket.resolution_time.is_none());
        assert_eq!(ticket.created_at, ticket.updated_at);
    }

    #[test]
    fn test_create_rejects_blank_title() {
        let store = create_test_store();
        let mut request = create_test_request();
        request.title = "   ".to_string();

        let result = store.create(request);
        assert!(matches!(result, Err(TicketError::Validation(_))));
        assert_eq!(store.count(&TicketFilter::new()).unwrap(), 0);
    }

    #[test]
    fn test_get_ticket_round_trips_fields() {
        let store = create_test_store();
        let created = store.create(create_test_request()).unwrap();

        let fetched = store.get(&created.id).unwrap().unwrap();
        assert_eq!(fetched, created);
    }

    #[test]
    fn test_get_nonexistent_ticket() {
        let store = create_test_store();
        let result = store.get("nonexistent-id").unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_save_persists_transition_and_stamps_updated_at() {
        let store = create_test_store();
        let mut ticket = store.create(create_test_request()).unwrap();

        let closed_at = Utc::now();
        apply_status_transition(&mut ticket, TicketStatus::Closed, closed_at);
        let saved = store.save(&ticket).unwrap();

        assert_eq!(saved.status, TicketStatus::Closed);
        assert_eq!(saved.resolution_time, Some(closed_at));
        assert!(saved.updated_at >= ticket.updated_at);
        assert_eq!(saved.created_at, ticket.created_at);

        let fetched = store.get(&ticket.id).unwrap().unwrap();
        assert_eq!(fetched.status, TicketStatus::Closed);
        assert_eq!(fetched.resolution_time, Some(closed_at));
    }

    #[test]
    fn test_save_does_not_rewrite_creator() {
        let store = create_test_store();
        let mut ticket = store.create(create_test_request()).unwrap();

        ticket.created_by = "someone-else".to_string();
        ticket.assigned_to = Some("agent-7".to_string());
        let saved = store.save(&ticket).unwrap();

        assert_eq!(saved.created_by, "test-user");
        assert_eq!(saved.assigned_to.as_deref(), Some("agent-7"));
    }

    #[test]
    fn test_save_nonexistent_ticket() {
        let store = create_test_store();
        let mut ticket = store.create(create_test_request()).unwrap();
        ticket.id = "missing".to_string();

        let result = store.save(&ticket);
        assert!(matches!(result, Err(TicketError::NotFound(ref id)) if id == "missing"));
    }

    #[test]
    fn test_save_never_clears_resolution_time() {
        let store = create_test_store();
        let mut ticket = store.create(create_test_request()).unwrap();
        let stale = ticket.clone();

        apply_status_transition(&mut ticket, TicketStatus::Closed, Utc::now());
        store.save(&ticket).unwrap();

        let saved = store.save(&stale).unwrap();
        assert!(saved.resolution_time.is_some());
    }

    #[test]
    fn test_assign_after_concurrent_close_keeps_status() {
        let store = create_test_store();
        let created = store.create(create_test_request()).unwrap();

        // Two requests load the same ticket before either writes.
        let mut closing = store.get(&created.id).unwrap().unwrap();
        let assigning = store.get(&created.id).unwrap().unwrap();

        let closed_at = Utc::now();
        apply_status_transition(&mut closing, TicketStatus::Closed, closed_at);
        store.save_status(&closing).unwrap();

        let saved = store.assign(&assigning.id, Some("agent")).unwrap();
        assert_eq!(saved.status, TicketStatus::Closed);
        assert_eq!(saved.resolution_time, Some(closed_at));
        assert_eq!(saved.assigned_to.as_deref(), Some("agent"));

        let fetched = store.get(&created.id).unwrap().unwrap();
        assert_eq!(fetched, saved);
    }

    #[test]
    fn test_status_after_concurrent_assign_keeps_assignee() {
        let store = create_test_store();
        let created = store.create(create_test_request()).unwrap();

        let mut closing = store.get(&created.id).unwrap().unwrap();
        store.assign(&created.id, Some("agent")).unwrap();

        apply_status_transition(&mut closing, TicketStatus::Resolved, Utc::now());
        let saved = store.save_status(&closing).unwrap();
        assert_eq!(saved.status, TicketStatus::Resolved);
        assert_eq!(saved.assigned_to.as_deref(), Some("agent"));
    }

    #[test]
    fn test_save_status_does_not_clear_stamp_from_stale_copy() {
        let store = create_test_store();
        let created = store.create(create_test_request()).unwrap();

        let mut closing = store.get(&created.id).unwrap().unwrap();
        let mut reopening = store.get(&created.id).unwrap().unwrap();

        apply_status_transition(&mut closing, TicketStatus::Closed, Utc::now());
        store.save_status(&closing).unwrap();

        apply_status_transition(&mut reopening, TicketStatus::InProgress, Utc::now());
        let saved = store.save_status(&reopening).unwrap();
        assert_eq!(saved.status, TicketStatus::InProgress);
        assert_eq!(saved.resolution_time, closing.resolution_time);
    }

    #[test]
    fn test_assign_clear_and_missing() {
        let store = create_test_store();
        let ticket = store.create(create_test_request()).unwrap();

        store.assign(&ticket.id, Some("agent")).unwrap();
        let cleared = store.assign(&ticket.id, None).unwrap();
        assert!(cleared.assigned_to.is_none());

        let result = store.assign("missing", Some("agent"));
        assert!(matches!(result, Err(TicketError::NotFound(_))));
    }

    #[test]
    fn test_update_details_leaves_status_alone() {
        let store = create_test_store();
        let mut ticket = store.create(create_test_request()).unwrap();
        let closed_at = Utc::now();
        apply_status_transition(&mut ticket, TicketStatus::Closed, closed_at);
        store.save_status(&ticket).unwrap();

        let update = TicketDetailsUpdate {
            priority: Some(TicketPriority::Critical),
            category: Some("Network".to_string()),
            ..Default::default()
        };
        let updated = store.update_details(&ticket.id, &update).unwrap();

        assert_eq!(updated.priority, TicketPriority::Critical);
        assert_eq!(updated.category, "Network");
        assert_eq!(updated.title, ticket.title);
        assert_eq!(updated.status, TicketStatus::Closed);
        assert_eq!(updated.resolution_time, Some(closed_at));
    }

    #[test]
    fn test_update_details_validation_and_missing() {
        let store = create_test_store();
        let ticket = store.create(create_test_request()).unwrap();

        let blank = TicketDetailsUpdate {
            title: Some(" ".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            store.update_details(&ticket.id, &blank),
            Err(TicketError::Validation(_))
        ));
        assert_eq!(store.get(&ticket.id).unwrap().unwrap().title, ticket.title);

        let result = store.update_details("missing", &TicketDetailsUpdate::default());
        assert!(matches!(result, Err(TicketError::NotFound(_))));
    }

    #[test]
    fn test_list_tickets_newest_first() {
        let store = create_test_store();

        let mut ids = Vec::new();
        for i in 0..3 {
            let mut request = create_test_request();
            request.title = format!("ticket {}", i);
            ids.push(store.create(request).unwrap().id);
        }

        let tickets = store.list(&TicketFilter::new()).unwrap();
        let listed: Vec<_> = tickets.iter().map(|t| t.id.clone()).collect();
        ids.reverse();
        assert_eq!(listed, ids);
    }

    #[test]
    fn test_list_with_status_filter() {
        let store = create_test_store();

        store.create(create_test_request()).unwrap();
        let mut second = store.create(create_test_request()).unwrap();
        apply_status_transition(&mut second, TicketStatus::InProgress, Utc::now());
        store.save(&second).unwrap();

        let filter = TicketFilter::new().with_status(TicketStatus::New);
        assert_eq!(store.list(&filter).unwrap().len(), 1);

        let filter = TicketFilter::new().with_status(TicketStatus::InProgress);
        let tickets = store.list(&filter).unwrap();
        assert_eq!(tickets.len(), 1);
        assert_eq!(tickets[0].id, second.id);
    }

    #[test]
    fn test_list_with_created_by_and_assignee_filters() {
        let store = create_test_store();

        let mut request1 = create_test_request();
        request1.created_by = "alice".to_string();
        let mut alice_ticket = store.create(request1).unwrap();

        let mut request2 = create_test_request();
        request2.created_by = "bob".to_string();
        store.create(request2).unwrap();

        alice_ticket.assigned_to = Some("carol".to_string());
        store.save(&alice_ticket).unwrap();

        let filter = TicketFilter::new().with_created_by("alice");
        let tickets = store.list(&filter).unwrap();
        assert_eq!(tickets.len(), 1);
        assert_eq!(tickets[0].created_by, "alice");

        let filter = TicketFilter::new().with_assigned_to("carol");
        let tickets = store.list(&filter).unwrap();
        assert_eq!(tickets.len(), 1);
        assert_eq!(tickets[0].id, alice_ticket.id);
    }

    #[test]
    fn test_list_with_priority_and_category_filters() {
        let store = create_test_store();

        let mut low = create_test_request();
        low.priority = TicketPriority::Low;
        low.category = "Software".to_string();
        store.create(low).unwrap();
        store.create(create_test_request()).unwrap();

        let filter = TicketFilter::new().with_priority(TicketPriority::Low);
        assert_eq!(store.count(&filter).unwrap(), 1);

        let filter = TicketFilter::new().with_category("Hardware");
        assert_eq!(store.count(&filter).unwrap(), 1);
    }

    #[test]
    fn test_list_pagination() {
        let store = create_test_store();

        for _ in 0..5 {
            store.create(create_test_request()).unwrap();
        }

        let filter = TicketFilter::new().with_limit(2).with_offset(0);
        assert_eq!(store.list(&filter).unwrap().len(), 2);

        let filter = TicketFilter::new().with_limit(2).with_offset(2);
        assert_eq!(store.list(&filter).unwrap().len(), 2);

        let filter = TicketFilter::new().with_limit(2).with_offset(4);
        assert_eq!(store.list(&filter).unwrap().len(), 1);

        // count ignores paging
        assert_eq!(store.count(&filter).unwrap(), 5);
    }

    #[test]
    fn test_delete_ticket_removes_comments() {
        let store = create_test_store();
        let ticket = store.create(create_test_request()).unwrap();
        store
            .add_comment(NewComment {
                ticket_id: ticket.id.clone(),
                author_id: "agent".to_string(),
                body: "Looking into it".to_string(),
            })
            .unwrap();

        assert!(store.delete(&ticket.id).unwrap());
        assert!(store.get(&ticket.id).unwrap().is_none());
        assert!(store.list_comments(&ticket.id).unwrap().is_empty());

        assert!(!store.delete(&ticket.id).unwrap());
    }

    #[test]
    fn test_comments_oldest_first() {
        let store = create_test_store();
        let ticket = store.create(create_test_request()).unwrap();

        for body in ["first", "second", "third"] {
            store
                .add_comment(NewComment {
                    ticket_id: ticket.id.clone(),
                    author_id: "agent".to_string(),
                    body: body.to_string(),
                })
                .unwrap();
        }

        let bodies: Vec<_> = store
            .list_comments(&ticket.id)
            .unwrap()
            .into_iter()
            .map(|c| c.body)
            .collect();
        assert_eq!(bodies, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_comment_on_missing_ticket() {
        let store = create_test_store();
        let result = store.add_comment(NewComment {
            ticket_id: "nope".to_string(),
            author_id: "agent".to_string(),
            body: "hello".to_string(),
        });
        assert!(matches!(result, Err(TicketError::NotFound(_))));
    }

    #[test]
    fn test_blank_comment_rejected() {
        let store = create_test_store();
        let ticket = store.create(create_test_request()).unwrap();
        let result = store.add_comment(NewComment {
            ticket_id: ticket.id,
            author_id: "agent".to_string(),
            body: "  ".to_string(),
        });
        assert!(matches!(result, Err(TicketError::Validation(_))));
    }

    #[test]
    fn test_file_based_store() {
        let temp_dir = tempfile::tempdir().unwrap();
        let db_path = temp_dir.path().join("tickets.db");

        let ticket_id = {
            let store = SqliteTicketStore::new(&db_path).unwrap();
            store.create(create_test_request()).unwrap().id
        };

        assert!(db_path.exists());

        let reopened = SqliteTicketStore::new(&db_path).unwrap();
        assert!(reopened.get(&ticket_id).unwrap().is_some());
    }
}
