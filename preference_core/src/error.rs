//! Error types for preference learning operations
//!
//! Every fallible model and session operation returns [`PreferenceResult`].
//! Concurrent training rejection is deliberately absent here: it is reported
//! as [`crate::session::RecordOutcome::Ignored`], not as an error.

use thiserror::Error;

/// Result type alias for preference learning operations
pub type PreferenceResult<T> = Result<T, PreferenceError>;

/// Error type for model training, prediction and session orchestration
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PreferenceError {
    /// The training buffer holds no examples
    #[error("Training buffer is empty: {operation} needs at least one buffered example")]
    EmptyBuffer { operation: String },

    /// Malformed or out-of-range input
    #[error("Invalid input '{field}' = '{value}': must satisfy {constraint}")]
    InvalidInput {
        field: String,
        value: String,
        constraint: String,
    },

    /// Caller broke an operation's contract; nothing was mutated
    #[error("Contract violation in {operation}: {details}")]
    ContractViolation { operation: String, details: String },

    /// Predictions are locked until enough examples were recorded
    #[error("Inference locked: {training_count} examples recorded, {required} required")]
    InferenceLocked {
        training_count: usize,
        required: usize,
    },
}

// Convenience constructors for common error patterns
impl PreferenceError {
    /// Create an empty buffer error
    pub fn empty_buffer(operation: impl Into<String>) -> Self {
        PreferenceError::EmptyBuffer {
            operation: operation.into(),
        }
    }

    /// Create an invalid input error
    pub fn invalid_input(
        field: impl Into<String>,
        value: impl ToString,
        constraint: impl Into<String>,
    ) -> Self {
        PreferenceError::InvalidInput {
            field: field.into(),
            value: value.to_string(),
            constraint: constraint.into(),
        }
    }

    /// Create a contract violation error
    pub fn contract_violation(operation: impl Into<String>, details: impl Into<String>) -> Self {
        PreferenceError::ContractViolation {
            operation: operation.into(),
            details: details.into(),
        }
    }

    /// Create an inference locked error
    pub fn inference_locked(training_count: usize, required: usize) -> Self {
        PreferenceError::InferenceLocked {
            training_count,
            required,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_buffer_display() {
        let err = PreferenceError::empty_buffer("train_step");
        let msg = err.to_string();
        assert!(msg.contains("train_step"));
        assert!(msg.contains("empty"));
    }

    #[test]
    fn test_invalid_input_display() {
        let err = PreferenceError::invalid_input("label", 2, "label in {0, 1}");
        let msg = err.to_string();
        assert!(msg.contains("label"));
        assert!(msg.contains('2'));
        assert!(msg.contains("{0, 1}"));
    }

    #[test]
    fn test_contract_violation_display() {
        let err = PreferenceError::contract_violation("submit_feedback", "missing index");
        let msg = err.to_string();
        assert!(msg.contains("submit_feedback"));
        assert!(msg.contains("missing index"));
    }

    #[test]
    fn test_inference_locked_display() {
        let err = PreferenceError::inference_locked(18, 20);
        let msg = err.to_string();
        assert!(msg.contains("18"));
        assert!(msg.contains("20"));
    }

    #[test]
    fn test_error_equality() {
        let err1 = PreferenceError::inference_locked(4, 20);
        let err2 = PreferenceError::inference_locked(4, 20);
        let err3 = PreferenceError::inference_locked(6, 20);

        assert_eq!(err1, err2);
        assert_ne!(err1, err3);
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PreferenceError>();
    }
}
