//! API key shape validation.
//!
//! This is a client-side sanity check only: it catches pasted garbage
//! before it is stored or sent, not revoked or mistyped keys.

use crate::core::error::DomainError;

/// Every Gemini API key starts with this prefix.
pub const API_KEY_PREFIX: &str = "AIza";

/// Minimum accepted key length, prefix included.
pub const API_KEY_MIN_LEN: usize = 35;

/// Whether `key` has the expected prefix and length.
pub fn is_valid_api_key(key: &str) -> bool {
    key.starts_with(API_KEY_PREFIX) && key.chars().count() >= API_KEY_MIN_LEN
}

/// Validate `key`, returning [`DomainError::InvalidApiKey`] on a shape mismatch.
pub fn validate_api_key(key: &str) -> Result<(), DomainError> {
    if is_valid_api_key(key) {
        Ok(())
    } else {
        Err(DomainError::InvalidApiKey {
            prefix: API_KEY_PREFIX,
            min_len: API_KEY_MIN_LEN,
        })
    }
}

/// Masked form for display: prefix plus the last four characters.
pub fn mask_api_key(key: &str) -> String {
    if key.is_empty() {
        return "(not set)".to_string();
    }
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    let head: String = chars[..4].iter().collect();
    format!("{}…{}", head, tail)
}
