//! Password hashing and verification utilities
//!
//! Uses Argon2id for secure password hashing (OWASP recommended). Digests are
//! PHC strings carrying their own salt and cost parameters.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use tracing::{debug, warn};

use crate::error::{AppError, AppResult};

/// Hash a password using Argon2id with a fresh random salt
///
/// # Errors
/// Returns an error if hashing fails
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Password hashing failed: {e}")))
}

/// Verify a password against a stored digest
///
/// A digest that cannot be parsed verifies as `false`, the same outcome as a
/// wrong password. The two cases are only told apart in the logs.
#[must_use]
pub fn verify_password(password: &str, digest: &str) -> bool {
    let parsed_hash = match PasswordHash::new(digest) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!(error = %e, "Stored password digest is malformed");
            return false;
        }
    };

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => true,
        Err(e) => {
            debug!(error = %e, "Password verification failed");
            false
        }
    }
}

/// Password service for dependency injection
#[derive(Debug, Clone, Copy, Default)]
pub struct PasswordService;

impl PasswordService {
    /// Create a new password service
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Hash a password
    ///
    /// # Errors
    /// Returns an error if hashing fails
    pub fn hash(&self, password: &str) -> AppResult<String> {
        hash_password(password)
    }

    /// Verify a password against a digest
    #[must_use]
    pub fn verify(&self, password: &str, digest: &str) -> bool {
        verify_password(password, digest)
    }

    /// Verify a password and return an error if invalid
    ///
    /// # Errors
    /// Returns `AppError::InvalidCredentials` if the password doesn't match
    pub fn verify_or_error(&self, password: &str, digest: &str) -> AppResult<()> {
        if self.verify(password, digest) {
            Ok(())
        } else {
            Err(AppError::InvalidCredentials)
        }
    }
}

/// Validate password strength
///
/// Returns `Ok(())` if the password meets requirements:
/// - At least 8 characters
/// - Contains at least one uppercase letter
/// - Contains at least one lowercase letter
/// - Contains at least one digit
///
/// # Errors
/// Returns a validation error if the password doesn't meet requirements
pub fn validate_password_strength(password: &str) -> AppResult<()> {
    if password.chars().count() < 8 {
        return Err(AppError::validation(
            "Password must be at least 8 characters long",
        ));
    }

    if !password.chars().any(char::is_uppercase) {
        return Err(AppError::validation(
            "Password must contain at least one uppercase letter",
        ));
    }

    if !password.chars().any(char::is_lowercase) {
        return Err(AppError::validation(
            "Password must contain at least one lowercase letter",
        ));
    }

    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(AppError::validation(
            "Password must contain at least one digit",
        ));
    }

    Ok(())
}
