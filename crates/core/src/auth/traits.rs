use async_trait::async_trait;
use thiserror::Error;

use super::types::{AuthRequest, Identity, IssuedCredential};
use crate::user::User;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Authentication required")]
    NotAuthenticated,

    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("Authentication service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl AuthError {
    /// Short label used for metrics and logs.
    pub fn reason(&self) -> &'static str {
        match self {
            AuthError::NotAuthenticated => "missing",
            AuthError::InvalidCredentials(_) => "invalid",
            AuthError::ServiceUnavailable(_) => "unavailable",
            AuthError::ConfigurationError(_) => "configuration",
        }
    }
}

#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Authenticate a request and return the identity
    async fn authenticate(&self, request: &AuthRequest) -> Result<Identity, AuthError>;

    /// Mint a bearer credential for `user`.
    fn issue_credential(&self, user: &User) -> Result<IssuedCredential, AuthError>;

    /// Name of this authentication method
    fn method_name(&self) -> &'static str;
}
