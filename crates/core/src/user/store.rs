//! User storage trait and types.

use thiserror::Error;

use super::{Role, User};

#[derive(Debug, Error)]
pub enum UserError {
    #[error("User not found: {0}")]
    NotFound(String),

    #[error("Username already taken: {0}")]
    DuplicateUsername(String),

    #[error("Invalid role: {0}")]
    InvalidRole(String),

    #[error("{0}")]
    Validation(String),

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    #[error("Database error: {0}")]
    Database(String),
}

/// A user about to be inserted. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: Option<String>,
    pub password_hash: String,
    pub role: Role,
}

/// Trait for user storage backends.
pub trait UserStore: Send + Sync {
    /// Insert a new user. Usernames are unique, case-insensitively.
    fn create(&self, user: NewUser) -> Result<User, UserError>;

    fn get(&self, id: &str) -> Result<Option<User>, UserError>;

    fn find_by_username(&self, username: &str) -> Result<Option<User>, UserError>;

    /// Users ordered by username.
    fn list(&self, limit: i64, offset: i64) -> Result<Vec<User>, UserError>;

    fn count(&self) -> Result<i64, UserError>;

    /// Change a user's role and return the updated user.
    fn update_role(&self, id: &str, role: Role) -> Result<User, UserError>;
}
