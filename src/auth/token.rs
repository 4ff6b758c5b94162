//! JWT access tokens
//!
//! HS256 tokens whose subject is the user's email address.

use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::AuthError;

/// JWT Claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (email)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    pub fn new(email: String, ttl_seconds: i64) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub: email,
            iat: now,
            exp: now + ttl_seconds,
        }
    }

    pub fn is_expired(&self) -> bool {
        chrono::Utc::now().timestamp() > self.exp
    }
}

/// Issues and validates access tokens
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    /// Access token TTL in seconds
    pub access_token_ttl: i64,
}

impl TokenService {
    /// Default access token lifetime (30 minutes)
    pub const DEFAULT_TTL_SECONDS: i64 = 30 * 60;

    pub fn new(secret: &str) -> Self {
        Self::with_ttl(secret, Self::DEFAULT_TTL_SECONDS)
    }

    pub fn with_ttl(secret: &str, access_token_ttl: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_token_ttl,
        }
    }

    /// Issue an access token for the given email
    pub fn issue_access_token(&self, email: &str) -> Result<String, AuthError> {
        let claims = Claims::new(email.to_string(), self.access_token_ttl);
        self.encode_claims(&claims)
    }

    pub(crate) fn encode_claims(&self, claims: &Claims) -> Result<String, AuthError> {
        encode(&Header::default(), claims, &self.encoding_key)
            .map_err(|e| AuthError::TokenError(e.to_string()))
    }

    /// Check signature and expiry, returning the claims
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::default();
        validation.leeway = 0;

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::TokenError(e.to_string()),
            }
        })?;

        if token_data.claims.is_expired() {
            return Err(AuthError::TokenExpired);
        }
        if token_data.claims.sub.is_empty() {
            return Err(AuthError::InvalidPayload);
        }

        Ok(token_data.claims)
    }
}
