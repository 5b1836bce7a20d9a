//! Slug generation and validation.
//!
//! Generated slugs draw from an alphabet without look-alike characters
//! (`0 O o 1 l I`), so they survive being read aloud or printed under a QR code.

use crate::error::AppError;
use rand::Rng;
use serde_json::json;

/// Characters used for generated slugs.
pub const SLUG_ALPHABET: &[u8] = b"23456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnpqrstuvwxyz";

/// Length of slugs generated for links with an owner.
pub const OWNED_SLUG_LENGTH: usize = 7;

/// Length of slugs generated for anonymous links.
pub const ANONYMOUS_SLUG_LENGTH: usize = 5;

const CUSTOM_SLUG_MIN: usize = 3;
const CUSTOM_SLUG_MAX: usize = 32;

/// Slugs that would shadow application routes.
const RESERVED_SLUGS: &[&str] = &[
    "api", "r", "admin", "health", "uploads", "login", "logout", "static",
];

/// Generates a random slug of `length` characters.
///
/// Uniqueness is not guaranteed; the caller retries on collision.
pub fn generate(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| SLUG_ALPHABET[rng.random_range(0..SLUG_ALPHABET.len())] as char)
        .collect()
}

/// Slug length for a new link depending on whether it has an owner.
pub fn length_for(owned: bool) -> usize {
    if owned {
        OWNED_SLUG_LENGTH
    } else {
        ANONYMOUS_SLUG_LENGTH
    }
}

/// Validates a user-provided custom slug.
///
/// # Rules
///
/// - Length: 3-32 characters
/// - Allowed characters: ASCII letters, digits, `-`, `_`
/// - Cannot start or end with `-` or `_`
/// - Cannot be a reserved route name (compared case-insensitively)
///
/// # Errors
///
/// Returns [`AppError::Validation`] if any rule is violated.
pub fn validate_custom_slug(slug: &str) -> Result<(), AppError> {
    if slug.len() < CUSTOM_SLUG_MIN || slug.len() > CUSTOM_SLUG_MAX {
        return Err(AppError::bad_request(
            format!("Custom slug must be {CUSTOM_SLUG_MIN}-{CUSTOM_SLUG_MAX} characters"),
            json!({ "provided_length": slug.len() }),
        ));
    }

    if !slug
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(AppError::bad_request(
            "Custom slug can only contain letters, digits, hyphens and underscores",
            json!({ "slug": slug }),
        ));
    }

    let edge = |c: char| c == '-' || c == '_';
    if slug.starts_with(edge) || slug.ends_with(edge) {
        return Err(AppError::bad_request(
            "Custom slug cannot start or end with a hyphen or underscore",
            json!({ "slug": slug }),
        ));
    }

    if RESERVED_SLUGS
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(slug))
    {
        return Err(AppError::bad_request(
            "This slug is reserved",
            json!({ "slug": slug }),
        ));
    }

    Ok(())
}
