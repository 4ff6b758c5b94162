//! Credential/Token Service
//!
//! Verifies credentials, issues bearer tokens and resolves a token back to
//! the user it was issued for. The real-time channel and the REST layer
//! both go through [`IdentityResolver`].

pub mod password;
pub mod token;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::store::Store;
use crate::types::{User, UserIdentity};

pub use token::{Claims, TokenService};

/// Authentication errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Incorrect email or password")]
    InvalidCredentials,
    #[error("Could not validate credentials: {0}")]
    TokenError(String),
    #[error("Token has expired")]
    TokenExpired,
    #[error("Invalid token payload")]
    InvalidPayload,
    #[error("User not found")]
    UserNotFound,
    #[error("Inactive user")]
    InactiveUser,
    #[error("Missing authentication token")]
    MissingToken,
}

/// Maps a bearer token to the identity it was issued for
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve_identity(&self, token: &str) -> Result<UserIdentity, AuthError>;
}

/// Token validation backed by the store's user directory
pub struct Authenticator {
    tokens: TokenService,
    store: Arc<Store>,
}

impl Authenticator {
    pub fn new(tokens: TokenService, store: Arc<Store>) -> Self {
        Self { tokens, store }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Check email/password and issue an access token
    pub fn login(&self, email: &str, password: &str) -> Result<(String, User), AuthError> {
        let user = self
            .store
            .authenticate_user(email, password)
            .ok_or(AuthError::InvalidCredentials)?;
        let token = self.tokens.issue_access_token(&user.email)?;
        Ok((token, user))
    }

    /// Resolve a token to the full user record
    pub fn resolve_user(&self, token: &str) -> Result<User, AuthError> {
        let claims = self.tokens.validate_token(token)?;
        let user = self
            .store
            .get_user_by_email(&claims.sub)
            .ok_or(AuthError::UserNotFound)?;

        if !user.is_active {
            return Err(AuthError::InactiveUser);
        }
        Ok(user)
    }

    /// Validate an `Authorization` header value
    /// Supports: "Bearer <token>" or just "<token>"
    pub fn resolve_authorization(&self, auth_header: &str) -> Result<User, AuthError> {
        let token = auth_header
            .strip_prefix("Bearer ")
            .or_else(|| auth_header.strip_prefix("bearer "))
            .unwrap_or(auth_header)
            .trim();

        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }
        self.resolve_user(token)
    }
}

#[async_trait]
impl IdentityResolver for Authenticator {
    async fn resolve_identity(&self, token: &str) -> Result<UserIdentity, AuthError> {
        self.resolve_user(token).map(|user| user.identity())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NewUser;

    fn create_test_auth() -> (Authenticator, Arc<Store>) {
        let store = Arc::new(Store::in_memory());
        store
            .create_user(NewUser::new("alice@example.com", "password123"))
            .unwrap();
        let auth = Authenticator::new(
            TokenService::new("test-secret-key-that-is-at-least-32-characters-long"),
            store.clone(),
        );
        (auth, store)
    }

    #[test]
    fn test_login_valid_user() {
        let (auth, _) = create_test_auth();
        let (token, user) = auth.login("alice@example.com", "password123").unwrap();
        assert!(!token.is_empty());
        assert_eq!(user.username, "alice");
    }

    #[test]
    fn test_login_invalid_password() {
        let (auth, _) = create_test_auth();
        let result = auth.login("alice@example.com", "wrongpassword");
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_resolve_identity() {
        let (auth, store) = create_test_auth();
        let (token, _) = auth.login("alice@example.com", "password123").unwrap();

        let identity = auth.resolve_identity(&token).await.unwrap();
        let user = store.get_user_by_email("alice@example.com").unwrap();
        assert_eq!(identity.user_id, user.id);
        assert_eq!(identity.email, "alice@example.com");
    }

    #[tokio::test]
    async fn test_resolve_unknown_user() {
        let (auth, _) = create_test_auth();
        let token = auth.tokens().issue_access_token("ghost@example.com").unwrap();

        let result = auth.resolve_identity(&token).await;
        assert_eq!(result, Err(AuthError::UserNotFound));
    }

    #[test]
    fn test_resolve_authorization_header() {
        let (auth, _) = create_test_auth();
        let (token, _) = auth.login("alice@example.com", "password123").unwrap();

        // With "Bearer " prefix
        let user = auth.resolve_authorization(&format!("Bearer {}", token)).unwrap();
        assert_eq!(user.email, "alice@example.com");

        // Without prefix
        let user = auth.resolve_authorization(&token).unwrap();
        assert_eq!(user.email, "alice@example.com");

        assert!(matches!(
            auth.resolve_authorization("Bearer "),
            Err(AuthError::MissingToken)
        ));
    }
}
