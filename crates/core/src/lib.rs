pub mod audit;
pub mod auth;
pub mod config;
pub mod ticket;
pub mod user;

pub use audit::{
    create_audit_system, AuditError, AuditEvent, AuditFilter, AuditHandle, AuditRecord,
    AuditStore, AuditWriter, SqliteAuditStore,
};
pub use auth::{
    create_authenticator, AuthError, AuthRequest, Authenticator, Identity, IssuedCredential,
    JwtAuthenticator,
};
pub use config::{
    load_config, load_config_from_str, validate_config, AuthConfig, AuthMethod,
    BootstrapAdminConfig, Config, ConfigError, DatabaseConfig, SanitizedConfig, ServerConfig,
};
pub use ticket::{
    apply_requested_status, apply_status_transition, CreateTicketRequest, NewComment,
    SqliteTicketStore, StatusChange, Ticket, TicketComment, TicketDetailsUpdate, TicketError, TicketFilter,
    TicketPriority, TicketStatus, TicketStore,
};
pub use user::{
    hash_password, verify_password, NewUser, Role, SqliteUserStore, User, UserError, UserStore,
};
