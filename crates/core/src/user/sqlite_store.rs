//! SQLite-backed user store implementation.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::{NewUser, Role, User, UserError, UserStore};

const USER_COLUMNS: &str = "id, username, email, password_hash, role, created_at, updated_at";

/// SQLite-backed user store.
pub struct SqliteUserStore {
    conn: Mutex<Connection>,
}

fn parse_time(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

impl SqliteUserStore {
    pub fn new(path: &Path) -> Result<Self, UserError> {
        let conn = Connection::open(path).map_err(|e| UserError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn in_memory() -> Result<Self, UserError> {
        let conn = Connection::open_in_memory().map_err(|e| UserError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), UserError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                username TEXT NOT NULL UNIQUE COLLATE NOCASE,
                email TEXT,
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL DEFAULT 'user',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )
        .map_err(|e| UserError::Database(e.to_string()))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, UserError> {
        self.conn
            .lock()
            .map_err(|_| UserError::Database("user store lock poisoned".to_string()))
    }

    fn row_to_user(row: &rusqlite::Row) -> rusqlite::Result<User> {
        let role_str: String = row.get(4)?;
        let created_at_str: String = row.get(5)?;
        let updated_at_str: String = row.get(6)?;

        let role: Role = role_str.parse().map_err(|e: UserError| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
        })?;

        Ok(User {
            id: row.get(0)?,
            username: row.get(1)?,
            email: row.get(2)?,
            password_hash: row.get(3)?,
            role,
            created_at: parse_time(5, &created_at_str)?,
            updated_at: parse_time(6, &updated_at_str)?,
        })
    }

    fn query_one(
        conn: &Connection,
        column: &str,
        value: &str,
    ) -> Result<Option<User>, UserError> {
        conn.query_row(
            &format!("SELECT {} FROM users WHERE {} = ?", USER_COLUMNS, column),
            params![value],
            Self::row_to_user,
        )
        .optional()
        .map_err(|e| UserError::Database(e.to_string()))
    }
}

impl UserStore for SqliteUserStore {
    fn create(&self, user: NewUser) -> Result<User, UserError> {
        let username = user.username.trim().to_string();
        if username.is_empty() {
            return Err(UserError::Validation("username is required".to_string()));
        }

        let conn = self.lock()?;
        let now = Utc::now();
        let stored = User {
            id: uuid::Uuid::new_v4().to_string(),
            username,
            email: user.email.filter(|e| !e.trim().is_empty()),
            password_hash: user.password_hash,
            role: user.role,
            created_at: now,
            updated_at: now,
        };

        let timestamp = now.to_rfc3339_opts(SecondsFormat::Nanos, true);
        let result = conn.execute(
            &format!(
                "INSERT INTO users ({}) VALUES (?, ?, ?, ?, ?, ?, ?)",
                USER_COLUMNS
            ),
            params![
                stored.id,
                stored.username,
                stored.email,
                stored.password_hash,
                stored.role.as_str(),
                timestamp,
                timestamp,
            ],
        );

        match result {
            Ok(_) => Ok(stored),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(UserError::DuplicateUsername(stored.username))
            }
            Err(e) => Err(UserError::Database(e.to_string())),
        }
    }

    fn get(&self, id: &str) -> Result<Option<User>, UserError> {
        let conn = self.lock()?;
        Self::query_one(&conn, "id", id)
    }

    fn find_by_username(&self, username: &str) -> Result<Option<User>, UserError> {
        let conn = self.lock()?;
        Self::query_one(&conn, "username", username.trim())
    }

    fn list(&self, limit: i64, offset: i64) -> Result<Vec<User>, UserError> {
        let conn = self.lock()?;

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM users ORDER BY username ASC LIMIT ? OFFSET ?",
                USER_COLUMNS
            ))
            .map_err(|e| UserError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params![limit, offset], Self::row_to_user)
            .map_err(|e| UserError::Database(e.to_string()))?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| UserError::Database(e.to_string()))
    }

    fn count(&self) -> Result<i64, UserError> {
        let conn = self.lock()?;
        conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
            .map_err(|e| UserError::Database(e.to_string()))
    }

    fn update_role(&self, id: &str, role: Role) -> Result<User, UserError> {
        let conn = self.lock()?;
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true);

        let updated = conn
            .execute(
                "UPDATE users SET role = ?, updated_at = ? WHERE id = ?",
                params![role.as_str(), now, id],
            )
            .map_err(|e| UserError::Database(e.to_string()))?;

        if updated == 0 {
            return Err(UserError::NotFound(id.to_string()));
        }

        Self::query_one(&conn, "id", id)?.ok_or_else(|| UserError::NotFound(id.to_string()))
    }
}
