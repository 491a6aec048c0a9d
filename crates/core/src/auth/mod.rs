mod jwt;
mod traits;
mod types;

pub use jwt::*;
pub use traits::*;
pub use types::*;

use crate::config::AuthConfig;

/// Factory function to create authenticator from config
pub fn create_authenticator(config: &AuthConfig) -> Result<Box<dyn Authenticator>, AuthError> {
    use crate::config::AuthMethod;

    match config.method {
        AuthMethod::Jwt => {
            let secret = config
                .jwt_secret
                .as_deref()
                .filter(|s| !s.trim().is_empty())
                .ok_or_else(|| {
                    AuthError::ConfigurationError(
                        "jwt_secret must be set when using jwt auth method".to_string(),
                    )
                })?;
            Ok(Box::new(JwtAuthenticator::new(
                secret,
                config.token_ttl_hours,
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthMethod;

    fn jwt_config(secret: Option<&str>) -> AuthConfig {
        AuthConfig {
            method: AuthMethod::Jwt,
            jwt_secret: secret.map(str::to_string),
            token_ttl_hours: 24,
            bootstrap_admin: None,
        }
    }

    #[test]
    fn test_create_authenticator_jwt() {
        let auth = create_authenticator(&jwt_config(Some("secret"))).unwrap();
        assert_eq!(auth.method_name(), "jwt");
    }

    #[test]
    fn test_create_authenticator_jwt_missing_secret() {
        let result = create_authenticator(&jwt_config(None));
        assert!(matches!(result, Err(AuthError::ConfigurationError(_))));

        let result = create_authenticator(&jwt_config(Some("")));
        assert!(matches!(result, Err(AuthError::ConfigurationError(_))));
    }
}
