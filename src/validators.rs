/// Input validators for registration and login
/// - Length limits keep oversized payloads away from bcrypt and the store
/// - Email format checks reject obviously broken addresses before lookup
/// - Profile fields are screened for control characters

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ValidationError;

const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321
const MIN_EMAIL_LENGTH: usize = 5;
const MAX_NAME_LENGTH: usize = 256;
const MAX_COMPANY_LENGTH: usize = 256;

lazy_static! {
    // RFC 5322 simplified
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    ).unwrap();
}

/// Validates and normalizes an email address
///
/// The returned value is trimmed and lowercased so that uniqueness in the
/// store does not depend on letter case.
pub fn is_valid_email(email: &str) -> Result<String, ValidationError> {
    let trimmed = email.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("email"));
    }

    if trimmed.len() < MIN_EMAIL_LENGTH {
        return Err(ValidationError::TooShort("email", MIN_EMAIL_LENGTH));
    }

    if trimmed.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong("email", MAX_EMAIL_LENGTH));
    }

    if !EMAIL_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat("email"));
    }

    // Local part over 64 octets is invalid per RFC 5321.
    if trimmed.split('@').next().map_or(true, |local| local.len() > 64) {
        return Err(ValidationError::SuspiciousContent("email"));
    }

    Ok(trimmed.to_lowercase())
}

/// Validates a display name
pub fn is_valid_name(name: &str) -> Result<String, ValidationError> {
    validate_profile_field("name", name, MAX_NAME_LENGTH)
}

/// Validates a company name
pub fn is_valid_company(company: &str) -> Result<String, ValidationError> {
    validate_profile_field("company", company, MAX_COMPANY_LENGTH)
}

fn validate_profile_field(
    field: &'static str,
    value: &str,
    max_length: usize,
) -> Result<String, ValidationError> {
    let trimmed = value.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField(field));
    }

    if trimmed.len() > max_length {
        return Err(ValidationError::TooLong(field, max_length));
    }

    if trimmed.chars().any(|c| c.is_control()) {
        return Err(ValidationError::SuspiciousContent(field));
    }

    Ok(trimmed.to_string())
}
