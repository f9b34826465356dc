//! Password hashing with Argon2id, plus the minimum password rules for accounts.

use argon2::{
    Argon2, PasswordHash,
    password_hash::{PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use thiserror::Error;

/// Shortest password accepted at registration or on change.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Longest password accepted. Bounds the hashing cost of a single request.
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Errors that can occur during password operations.
#[derive(Debug, Error)]
pub enum PasswordError {
    /// Password is shorter than [`MIN_PASSWORD_LENGTH`].
    #[error("password must be at least {} characters", MIN_PASSWORD_LENGTH)]
    TooShort,

    /// Password is longer than [`MAX_PASSWORD_LENGTH`].
    #[error("password must be at most {} characters", MAX_PASSWORD_LENGTH)]
    TooLong,

    /// Failed to hash password.
    #[error("failed to hash password: {0}")]
    HashError(String),

    /// Failed to verify password.
    #[error("failed to verify password: {0}")]
    VerifyError(String),

    /// Stored hash is not a PHC string.
    #[error("invalid password hash format")]
    InvalidHash,
}

/// Checks a new password against the account rules.
///
/// # Errors
///
/// Returns `TooShort` or `TooLong` when the character count is out of bounds.
pub fn check_password_policy(password: &str) -> Result<(), PasswordError> {
    let len = password.chars().count();
    if len < MIN_PASSWORD_LENGTH {
        return Err(PasswordError::TooShort);
    }
    if len > MAX_PASSWORD_LENGTH {
        return Err(PasswordError::TooLong);
    }
    Ok(())
}

/// Hashes a password into a PHC string with a fresh random salt.
///
/// # Errors
///
/// Returns `PasswordError::HashError` if hashing fails.
///
/// # Example
///
/// ```
/// use campus_core::auth::hash_password;
///
/// let hash = hash_password("correct horse battery").unwrap();
/// assert!(hash.starts_with("$argon2id$"));
/// ```
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::HashError(e.to_string()))
}

/// Checks `password` against a stored PHC hash.
///
/// A mismatch is `Ok(false)`; only a malformed hash or an internal failure is an error.
///
/// # Errors
///
/// Returns `PasswordError::InvalidHash` if the hash cannot be parsed, or
/// `PasswordError::VerifyError` if verification fails unexpectedly.
///
/// # Example
///
/// ```
/// use campus_core::auth::{hash_password, verify_password};
///
/// let hash = hash_password("lecture-notes-2024").unwrap();
/// assert!(verify_password("lecture-notes-2024", &hash).unwrap());
/// assert!(!verify_password("lecture-notes-2025", &hash).unwrap());
/// ```
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(hash).map_err(|_| PasswordError::InvalidHash)?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerifyError(e.to_string())),
    }
}
