//! Error types for push data validation.

use thiserror::Error;

/// Errors raised when constructing domain values from untrusted input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Notification body was empty or whitespace
    #[error("message cannot be empty")]
    EmptyMessage,

    /// Priority outside the accepted -2..=2 range
    #[error("priority must be between -2 and 2, got {0}")]
    PriorityOutOfRange(i64),

    /// Message id must be strictly positive
    #[error("message id must be positive, got {0}")]
    InvalidMessageId(i64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ValidationError::PriorityOutOfRange(5);
        assert_eq!(err.to_string(), "priority must be between -2 and 2, got 5");
        assert_eq!(
            ValidationError::EmptyMessage.to_string(),
            "message cannot be empty"
        );
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ValidationError>();
    }
}
