//! User accounts, roles and password hashing.

mod password;
mod sqlite_store;
mod store;
mod types;

pub use password::{hash_password, verify_password};
pub use sqlite_store::SqliteUserStore;
pub use store::{NewUser, UserError, UserStore};
pub use types::{Role, User};
