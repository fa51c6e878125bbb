use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::config::SecurityConfig;
use crate::types::Document;

pub mod cookie;

pub use cookie::SessionCookie;

/// Token claims: the caller's identity object, flattened, plus timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(flatten)]
    pub identity: Document,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    /// Reserved claims supplied by the caller are replaced, not trusted.
    pub fn new(mut identity: Document, ttl: Duration) -> Self {
        identity.remove("exp");
        identity.remove("iat");

        let now = Utc::now();
        Self {
            identity,
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Token is required")]
    MissingToken,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token payload must be a JSON object")]
    InvalidPayload,

    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Invalid JWT secret")]
    InvalidSecret,

    #[error("Invalid token lifetime: {0}s")]
    InvalidTtl(i64),
}

/// Signs and verifies HS256 session tokens
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl: Duration) -> Result<Self, AuthError> {
        if secret.is_empty() {
            return Err(AuthError::InvalidSecret);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is exact; identity payloads are opaque, so no audience check
        validation.leeway = 0;
        validation.validate_aud = false;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        })
    }

    pub fn from_config(security: &SecurityConfig) -> Result<Self, AuthError> {
        let ttl = Duration::try_seconds(security.token_ttl_secs)
            .filter(|ttl| *ttl > Duration::zero())
            .ok_or(AuthError::InvalidTtl(security.token_ttl_secs))?;
        Self::new(&security.access_token_secret, ttl)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Signs an identity payload; it must be a JSON object
    pub fn issue(&self, payload: Value) -> Result<String, AuthError> {
        let Value::Object(identity) = payload else {
            return Err(AuthError::InvalidPayload);
        };
        let claims = Claims::new(identity, self.ttl);
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::TokenGeneration(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }
}
