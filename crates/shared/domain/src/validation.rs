//! Input checks shared by every service.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::constants::{MAX_TEXT_LENGTH, MIN_NAME_LENGTH, RATING_MAX, RATING_MIN};
use crate::error::{DomainError, DomainResult};

/// Loose "looks like an email" pattern; the identity provider does the real verification.
static EMAIL_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));

/// Check whether a string is shaped like an email address.
pub fn is_email_shaped(value: &str) -> bool {
    EMAIL_SHAPE.is_match(value.trim())
}

/// Trim, lowercase and validate an email address.
pub fn normalize_email(value: &str) -> DomainResult<String> {
    let email = value.trim().to_lowercase();
    if !is_email_shaped(&email) {
        return Err(DomainError::validation(format!(
            "'{}' is not a valid email address",
            value.trim()
        )));
    }
    Ok(email)
}

/// Trim a required name-like field.
pub fn require_name(field: &str, value: &str) -> DomainResult<String> {
    let trimmed = value.trim();
    if trimmed.chars().count() < MIN_NAME_LENGTH {
        return Err(DomainError::validation(format!("{} cannot be empty", field)));
    }
    Ok(trimmed.to_string())
}

/// Trim a required free-text field and enforce the length cap.
pub fn require_text(field: &str, value: &str) -> DomainResult<String> {
    let trimmed = require_name(field, value)?;
    if trimmed.chars().count() > MAX_TEXT_LENGTH {
        return Err(DomainError::validation(format!(
            "{} must be at most {} characters",
            field, MAX_TEXT_LENGTH
        )));
    }
    Ok(trimmed)
}

/// Check a value against the rating scale.
pub fn check_rating(rating: i32) -> DomainResult<i32> {
    if (RATING_MIN..=RATING_MAX).contains(&rating) {
        Ok(rating)
    } else {
        Err(DomainError::validation(format!(
            "Rating must be between {} and {}",
            RATING_MIN, RATING_MAX
        )))
    }
}
