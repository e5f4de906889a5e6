//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("API key must start with \"{prefix}\" and be at least {min_len} characters")]
    InvalidApiKey {
        prefix: &'static str,
        min_len: usize,
    },

    #[error("Message is empty")]
    EmptyMessage,
}

impl DomainError {
    /// Check if this error is an API key shape violation
    pub fn is_invalid_api_key(&self) -> bool {
        matches!(self, DomainError::InvalidApiKey { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_api_key_display() {
        let error = DomainError::InvalidApiKey {
            prefix: "AIza",
            min_len: 35,
        };
        assert_eq!(
            error.to_string(),
            "API key must start with \"AIza\" and be at least 35 characters"
        );
    }

    #[test]
    fn test_is_invalid_api_key_check() {
        assert!(
            DomainError::InvalidApiKey {
                prefix: "AIza",
                min_len: 35
            }
            .is_invalid_api_key()
        );
        assert!(!DomainError::EmptyMessage.is_invalid_api_key());
    }
}
