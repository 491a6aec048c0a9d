//! JSON error responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use servicedesk_core::{AuditError, AuthError, TicketError, UserError};

/// Error body returned by every API route.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// An HTTP status plus the message sent to the client.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden() -> Self {
        Self::new(StatusCode::FORBIDDEN, "Access denied")
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, "{}", self.message);
        }
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}

impl From<TicketError> for ApiError {
    fn from(err: TicketError) -> Self {
        match err {
            TicketError::NotFound(_) => Self::not_found("Ticket not found"),
            TicketError::Validation(_)
            | TicketError::InvalidStatusValue(_)
            | TicketError::InvalidPriorityValue(_) => Self::bad_request(err.to_string()),
            TicketError::Database(_) => Self::internal(err.to_string()),
        }
    }
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound(_) => Self::not_found("User not found"),
            UserError::DuplicateUsername(_) => Self::new(StatusCode::CONFLICT, err.to_string()),
            UserError::InvalidRole(_) | UserError::Validation(_) => {
                Self::bad_request(err.to_string())
            }
            UserError::PasswordHash(_) | UserError::Database(_) => Self::internal(err.to_string()),
        }
    }
}

impl From<AuditError> for ApiError {
    fn from(err: AuditError) -> Self {
        Self::internal(format!("Failed to query audit events: {}", err))
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::NotAuthenticated | AuthError::InvalidCredentials(_) => {
                Self::unauthorized(err.to_string())
            }
            AuthError::ServiceUnavailable(_) | AuthError::ConfigurationError(_) => {
                Self::internal(err.to_string())
            }
        }
    }
}
