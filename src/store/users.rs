//! User directory operations

use chrono::Utc;

use super::{Store, StoreError, StoreResult};
use crate::auth::password::{hash_password, verify_password};
use crate::types::{NewUser, User};
use crate::validation::validate_new_user;

impl Store {
    /// Register a new user
    ///
    /// Fails with `Conflict` when the email is taken. A username that is
    /// already in use gets a `_<unix-seconds>` suffix instead of failing.
    pub fn create_user(&self, new_user: NewUser) -> StoreResult<User> {
        if let Some(msg) = validate_new_user(&new_user) {
            return Err(StoreError::Validation(msg));
        }

        let email = new_user.email.trim().to_string();
        // Hash outside the lock, bcrypt is slow on purpose
        let hashed_password = hash_password(&new_user.password)?;

        let mut data = self.data.write();
        if data.users.iter().any(|u| u.email == email) {
            return Err(StoreError::Conflict("Email already registered".to_string()));
        }

        let now = Utc::now();
        let mut username = new_user
            .username
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string());
        if data.users.iter().any(|u| u.username == username) {
            username = format!("{}_{}", username, now.timestamp());
        }

        let user = User {
            id: uuid::Uuid::new_v4().simple().to_string(),
            username,
            email,
            full_name: new_user.full_name,
            hashed_password,
            is_active: true,
            income: new_user.income.unwrap_or(0.0),
            created_at: now,
            updated_at: now,
        };

        let stored = user.clone();
        self.commit(&mut data, |data| data.users.push(stored))?;

        tracing::info!(user_id = %user.id, username = %user.username, "Registered user");
        Ok(user)
    }

    /// Check email/password; None when either is wrong
    pub fn authenticate_user(&self, email: &str, password: &str) -> Option<User> {
        let user = self.get_user_by_email(email)?;
        if verify_password(password, &user.hashed_password) {
            Some(user)
        } else {
            None
        }
    }

    pub fn get_user_by_email(&self, email: &str) -> Option<User> {
        let email = email.trim();
        self.data.read().users.iter().find(|u| u.email == email).cloned()
    }

    pub fn get_user_by_id(&self, user_id: &str) -> Option<User> {
        self.data.read().users.iter().find(|u| u.id == user_id).cloned()
    }

    pub fn get_user_by_username(&self, username: &str) -> Option<User> {
        self.data
            .read()
            .users
            .iter()
            .find(|u| u.username == username)
            .cloned()
    }
}
