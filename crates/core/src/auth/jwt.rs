//! JWT bearer authentication.

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::{AuthError, AuthRequest, Authenticator, Identity, IssuedCredential};
use crate::user::{Role, User};

/// Token payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// User id.
    pub sub: String,
    pub username: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// Authenticator that issues and verifies HS256 tokens signed with a shared secret.
///
/// Accepts the token in an `Authorization: Bearer <jwt>` header.
pub struct JwtAuthenticator {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl JwtAuthenticator {
    pub fn new(secret: &str, ttl_hours: u32) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::hours(i64::from(ttl_hours)),
        }
    }

    /// Issue a token as if the current time were `now`.
    pub fn issue_credential_at(
        &self,
        user: &User,
        now: DateTime<Utc>,
    ) -> Result<IssuedCredential, AuthError> {
        let expires_at = now + self.ttl;
        let claims = Claims {
            sub: user.id.clone(),
            username: user.username.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::ConfigurationError(format!("Failed to sign token: {}", e)))?;

        Ok(IssuedCredential {
            token,
            expires_at: Utc
                .timestamp_opt(claims.exp, 0)
                .single()
                .unwrap_or(expires_at),
        })
    }

    /// Verify signature and expiry, returning the claims.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| AuthError::InvalidCredentials(format!("Invalid token: {}", e)))
    }
}

#[async_trait]
impl Authenticator for JwtAuthenticator {
    async fn authenticate(&self, request: &AuthRequest) -> Result<Identity, AuthError> {
        let token = request.bearer_token().ok_or(AuthError::NotAuthenticated)?;
        let claims = self.verify(token)?;

        Ok(Identity {
            user_id: claims.sub,
            username: claims.username,
            role: claims.role,
            method: self.method_name().to_string(),
        })
    }

    fn issue_credential(&self, user: &User) -> Result<IssuedCredential, AuthError> {
        self.issue_credential_at(user, Utc::now())
    }

    fn method_name(&self) -> &'static str {
        "jwt"
    }
}
