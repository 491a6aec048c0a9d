use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::IpAddr;

use crate::ticket::Ticket;
use crate::user::Role;

/// Request information for authentication
#[derive(Debug, Clone)]
pub struct AuthRequest {
    /// Header names are lowercase.
    pub headers: HashMap<String, String>,
    pub source_ip: IpAddr,
}

impl AuthRequest {
    /// Token from an `Authorization: Bearer <token>` header.
    /// The scheme name is matched case-insensitively.
    pub fn bearer_token(&self) -> Option<&str> {
        let header = self.headers.get("authorization")?;
        let (scheme, token) = header.trim().split_once(' ')?;
        let token = token.trim();
        if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
            Some(token)
        } else {
            None
        }
    }
}

/// Authenticated identity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Identity {
    pub user_id: String,
    pub username: String,
    pub role: Role,
    pub method: String,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_staff(&self) -> bool {
        self.role.is_staff()
    }

    /// Creator, assignee and staff may read a ticket.
    pub fn can_view(&self, ticket: &Ticket) -> bool {
        self.is_staff() || ticket.involves(&self.user_id)
    }
}

/// A freshly minted bearer credential.
#[derive(Debug, Clone)]
pub struct IssuedCredential {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}
