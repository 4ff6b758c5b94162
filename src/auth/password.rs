//! Password hashing with bcrypt

use bcrypt::{hash, verify, BcryptError, DEFAULT_COST};

use crate::validation::MAX_PASSWORD_LEN;

/// bcrypt ignores everything past 72 bytes; cut on a char boundary first
fn truncate(password: &str) -> &str {
    if password.len() <= MAX_PASSWORD_LEN {
        return password;
    }
    let mut end = MAX_PASSWORD_LEN;
    while !password.is_char_boundary(end) {
        end -= 1;
    }
    &password[..end]
}

pub fn hash_password(password: &str) -> Result<String, BcryptError> {
    hash(truncate(password), DEFAULT_COST)
}

pub fn verify_password(password: &str, password_hash: &str) -> bool {
    verify(truncate(password), password_hash).unwrap_or(false)
}
