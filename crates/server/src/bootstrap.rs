//! Startup seeding of the administrator account.

use servicedesk_core::{
    hash_password, AuditEvent, AuditHandle, BootstrapAdminConfig, NewUser, Role, User, UserError,
    UserStore,
};

/// Create the configured administrator unless the username is already taken.
///
/// An existing account is left untouched, including its role and password.
/// Returns the created user, or `None` when nothing was seeded.
pub fn seed_admin(
    user_store: &dyn UserStore,
    admin: &BootstrapAdminConfig,
    audit: &AuditHandle,
) -> Result<Option<User>, UserError> {
    if user_store.find_by_username(&admin.username)?.is_some() {
        tracing::debug!(username = %admin.username, "Bootstrap admin already exists");
        return Ok(None);
    }

    let user = user_store.create(NewUser {
        username: admin.username.clone(),
        email: admin.email.clone(),
        password_hash: hash_password(&admin.password)?,
        role: Role::Admin,
    })?;

    tracing::info!(user_id = %user.id, username = %user.username, "Seeded bootstrap admin");
    audit.try_emit(AuditEvent::UserRegistered {
        user_id: user.id.clone(),
        username: user.username.clone(),
        role: user.role,
    });

    Ok(Some(user))
}
