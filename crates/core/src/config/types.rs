use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub auth: AuthConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory holding the built single-page front-end (index.html + assets).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            web_dir: None,
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    5009
}

/// Authentication configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    pub method: AuthMethod,
    /// HMAC secret used to sign bearer tokens (required for jwt).
    #[serde(default)]
    pub jwt_secret: Option<String>,
    /// Lifetime of issued tokens.
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: u32,
    /// Administrator account created at startup when its username is unknown.
    #[serde(default)]
    pub bootstrap_admin: Option<BootstrapAdminConfig>,
}

fn default_token_ttl_hours() -> u32 {
    24
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    Jwt,
}

/// Credentials for the seeded administrator account
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BootstrapAdminConfig {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("servicedesk.db")
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub auth: SanitizedAuthConfig,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedAuthConfig {
    pub method: String,
    pub jwt_secret_configured: bool,
    pub token_ttl_hours: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bootstrap_admin: Option<SanitizedBootstrapAdmin>,
}

/// Bootstrap admin with the password hidden
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedBootstrapAdmin {
    pub username: String,
    pub password_configured: bool,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            auth: SanitizedAuthConfig {
                method: match config.auth.method {
                    AuthMethod::Jwt => "jwt".to_string(),
                },
                jwt_secret_configured: config
                    .auth
                    .jwt_secret
                    .as_deref()
                    .is_some_and(|s| !s.is_empty()),
                token_ttl_hours: config.auth.token_ttl_hours,
                bootstrap_admin: config.auth.bootstrap_admin.as_ref().map(|admin| {
                    SanitizedBootstrapAdmin {
                        username: admin.username.clone(),
                        password_configured: !admin.password.is_empty(),
                    }
                }),
            },
            server: config.server.clone(),
            database: config.database.clone(),
        }
    }
}
