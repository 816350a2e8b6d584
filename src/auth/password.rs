/// Password Hashing and Verification
///
/// Passwords are stored as salted bcrypt hashes.

use bcrypt::{hash, verify};

use crate::error::{AppError, ValidationError};

pub const MIN_BCRYPT_COST: u32 = 4;
pub const MAX_BCRYPT_COST: u32 = 31;

/// bcrypt only reads the first 72 bytes of its input
const MAX_PASSWORD_LENGTH: usize = 72;

/// Hash a password with the given bcrypt cost
///
/// # Errors
/// Returns an internal error if bcrypt rejects the cost or fails to hash.
pub fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    hash(password, cost)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

/// Check a password against a stored hash
///
/// A malformed hash is a mismatch, not an error.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match verify(password, hash) {
        Ok(valid) => valid,
        Err(e) => {
            tracing::debug!("Password hash could not be verified: {}", e);
            false
        }
    }
}

/// Reject passwords bcrypt cannot hash faithfully
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::EmptyField("password"));
    }

    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::TooLong("password", MAX_PASSWORD_LENGTH));
    }

    Ok(())
}
