//! # Error Types
//!
//! Domain-specific error types for clinic-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  clinic-core errors (this file)                                         │
//! │  ├── CoreError        - Draft completion and backend row decoding       │
//! │  └── ValidationError  - Write-side input validation failures            │
//! │                                                                         │
//! │  clinic-db errors (separate crate)                                      │
//! │  ├── DbError          - Storage operation failures                      │
//! │  └── ConfigError      - Configuration loading failures                  │
//! │                                                                         │
//! │  Aggregations (revenue, expenses, ranking) have NO error path:          │
//! │  malformed records are skipped, never rejected as a batch.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A procedure draft was submitted before all required fields were set.
    ///
    /// ## When This Occurs
    /// - No patient selected and no new patient name typed
    /// - Procedure type or payment method not selected
    /// - Amount is zero
    #[error("Procedure draft is incomplete: {field} is missing")]
    IncompleteDraft { field: String },

    /// A JSON payload from the hosted backend could not be decoded at all.
    ///
    /// Individual malformed fields never raise this; only a payload that is not
    /// a list of rows does.
    #[error("Failed to decode backend rows: {0}")]
    Decode(#[from] serde_json::Error),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Amount must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Invalid format (e.g., invalid UUID, invalid date, invalid competency).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Expected-collection date falls before the service date.
    #[error("expected collection date {expected} is before service date {service}")]
    CollectionBeforeService { service: String, expected: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::IncompleteDraft {
            field: "payment method".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Procedure draft is incomplete: payment method is missing"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "description".to_string(),
        };
        assert_eq!(err.to_string(), "description is required");

        let err = ValidationError::CollectionBeforeService {
            service: "2024-03-10".to_string(),
            expected: "2024-03-01".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "expected collection date 2024-03-01 is before service date 2024-03-10"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Negative {
            field: "amount".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
