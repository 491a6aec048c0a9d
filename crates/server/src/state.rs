use std::sync::Arc;

use servicedesk_core::{
    AuditHandle, AuditStore, Authenticator, Config, SanitizedConfig, TicketStore, UserStore,
};

/// Shared application state
pub struct AppState {
    config: Config,
    authenticator: Arc<dyn Authenticator>,
    audit: AuditHandle,
    audit_store: Arc<dyn AuditStore>,
    ticket_store: Arc<dyn TicketStore>,
    user_store: Arc<dyn UserStore>,
}

impl AppState {
    pub fn new(
        config: Config,
        authenticator: Arc<dyn Authenticator>,
        audit: AuditHandle,
        audit_store: Arc<dyn AuditStore>,
        ticket_store: Arc<dyn TicketStore>,
        user_store: Arc<dyn UserStore>,
    ) -> Self {
        Self {
            config,
            authenticator,
            audit,
            audit_store,
            ticket_store,
            user_store,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn authenticator(&self) -> &dyn Authenticator {
        self.authenticator.as_ref()
    }

    pub fn audit(&self) -> &AuditHandle {
        &self.audit
    }

    pub fn audit_store(&self) -> &dyn AuditStore {
        self.audit_store.as_ref()
    }

    pub fn ticket_store(&self) -> &dyn TicketStore {
        self.ticket_store.as_ref()
    }

    pub fn user_store(&self) -> &dyn UserStore {
        self.user_store.as_ref()
    }
}
