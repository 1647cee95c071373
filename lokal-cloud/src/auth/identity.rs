//! Identity verification
//!
//! Turns an access token into an [`AuthUser`]. Two providers:
//! - [`JwtIdentityProvider`]: local HS256 verification with the shared secret
//! - [`RemoteIdentityProvider`]: asks the identity service who the token belongs to

use std::time::Duration;

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Verified external user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    /// Opaque id issued by the identity service
    pub id: String,
    pub email: Option<String>,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// `None` when the token does not identify a user
    async fn verify(&self, token: &str) -> Option<AuthUser>;
}

/// JWT claims of a session access token
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User ID
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Expiration (Unix timestamp seconds)
    pub exp: usize,
    /// Issued at (Unix timestamp seconds)
    #[serde(default)]
    pub iat: usize,
}

pub struct JwtIdentityProvider {
    key: DecodingKey,
    validation: Validation,
}

impl JwtIdentityProvider {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Session tokens carry an `aud` we do not pin
        validation.validate_aud = false;
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }
}

#[async_trait]
impl IdentityProvider for JwtIdentityProvider {
    async fn verify(&self, token: &str) -> Option<AuthUser> {
        match jsonwebtoken::decode::<SessionClaims>(token, &self.key, &self.validation) {
            Ok(data) if !data.claims.sub.is_empty() => Some(AuthUser {
                id: data.claims.sub,
                email: data.claims.email,
            }),
            Ok(_) => None,
            Err(e) => {
                tracing::debug!("JWT validation failed: {e}");
                None
            }
        }
    }
}

/// Issue an HS256 session token (local development and tests)
pub fn create_token(
    user_id: &str,
    email: Option<&str>,
    secret: &str,
    ttl: chrono::Duration,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now();
    let claims = SessionClaims {
        sub: user_id.to_string(),
        email: email.map(str::to_string),
        exp: (now + ttl).timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

#[derive(Deserialize)]
struct RemoteUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

/// `GET {url}/auth/v1/user` with the token and the public API key
pub struct RemoteIdentityProvider {
    http: reqwest::Client,
    url: String,
    anon_key: String,
}

impl RemoteIdentityProvider {
    pub fn new(url: &str, anon_key: &str) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            url: url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
        })
    }
}

#[async_trait]
impl IdentityProvider for RemoteIdentityProvider {
    async fn verify(&self, token: &str) -> Option<AuthUser> {
        let resp = self
            .http
            .get(format!("{}/auth/v1/user", self.url))
            .bearer_auth(token)
            .header("apikey", &self.anon_key)
            .send()
            .await
            .map_err(|e| tracing::warn!("Identity service request failed: {e}"))
            .ok()?;

        if !resp.status().is_success() {
            tracing::debug!(status = %resp.status(), "Identity service rejected token");
            return None;
        }

        let user: RemoteUser = resp
            .json()
            .await
            .map_err(|e| tracing::warn!("Identity service returned malformed user: {e}"))
            .ok()?;
        (!user.id.is_empty()).then_some(AuthUser {
            id: user.id,
            email: user.email,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[tokio::test]
    async fn round_trip_through_local_provider() {
        let token =
            create_token("user-1", Some("a@b.pl"), SECRET, chrono::Duration::hours(1)).unwrap();
        let user = JwtIdentityProvider::new(SECRET).verify(&token).await.unwrap();
        assert_eq!(user.id, "user-1");
        assert_eq!(user.email.as_deref(), Some("a@b.pl"));
    }

    #[tokio::test]
    async fn wrong_secret_is_rejected() {
        let token = create_token("user-1", None, SECRET, chrono::Duration::hours(1)).unwrap();
        assert!(JwtIdentityProvider::new("other").verify(&token).await.is_none());
    }

    #[tokio::test]
    async fn expired_token_is_rejected() {
        let token = create_token("user-1", None, SECRET, chrono::Duration::hours(-2)).unwrap();
        assert!(JwtIdentityProvider::new(SECRET).verify(&token).await.is_none());
    }
}
