use super::{
    types::{AuthMethod, Config},
    ConfigError,
};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - JWT auth has a non-empty signing secret and a positive token lifetime
/// - Bootstrap admin (if any) has a username and password
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    match config.auth.method {
        AuthMethod::Jwt => {
            let secret = config.auth.jwt_secret.as_deref().unwrap_or_default();
            if secret.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "auth.jwt_secret must be set when using jwt auth".to_string(),
                ));
            }
        }
    }

    if config.auth.token_ttl_hours == 0 {
        return Err(ConfigError::ValidationError(
            "auth.token_ttl_hours must be greater than 0".to_string(),
        ));
    }

    if let Some(ref admin) = config.auth.bootstrap_admin {
        if admin.username.trim().is_empty() || admin.password.is_empty() {
            return Err(ConfigError::ValidationError(
                "auth.bootstrap_admin requires a username and password".to_string(),
            ));
        }
    }

    Ok(())
}
