//! # Validation Module
//!
//! Write-side input validation for procedures, expenses, compensation and
//! the catalog.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Form (dashboard)                                              │
//! │  ├── Amount coercion: unparseable input becomes zero                    │
//! │  └── Required selections (patient, type, method)                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                   │
//! │  ├── Non-negative amounts                                               │
//! │  ├── Expected collection >= service date                                │
//! │  └── Names, competencies, identifiers                                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Storage                                                       │
//! │  ├── NOT NULL / CHECK constraints                                       │
//! │  └── Foreign key constraints                                            │
//! │                                                                         │
//! │  Reads never pass through here: aggregation skips, it does not reject.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use clinic_core::validation::{validate_amount_cents, validate_competency};
//!
//! validate_amount_cents("amount", 25000).unwrap();
//! validate_competency("2024-03").unwrap();
//! ```

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::period::{to_iso, YearMonth};
use crate::{MAX_NAME_LENGTH, MAX_NOTES_LENGTH};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a required display name or description.
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most MAX_NAME_LENGTH (200) characters
///
/// ## Returns
/// The trimmed value.
///
/// ## Example
/// ```rust
/// use clinic_core::validation::validate_required_name;
///
/// assert_eq!(validate_required_name("name", "  Consulta ").unwrap(), "Consulta");
/// assert!(validate_required_name("name", "   ").is_err());
/// ```
pub fn validate_required_name(field: &str, value: &str) -> ValidationResult<String> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LENGTH,
        });
    }

    Ok(value.to_string())
}

/// Validates free-text notes.
///
/// Blank notes normalize to `None`.
pub fn validate_notes(notes: Option<&str>) -> ValidationResult<Option<String>> {
    let Some(notes) = notes.map(str::trim).filter(|n| !n.is_empty()) else {
        return Ok(None);
    };

    if notes.chars().count() > MAX_NOTES_LENGTH {
        return Err(ValidationError::TooLong {
            field: "notes".to_string(),
            max: MAX_NOTES_LENGTH,
        });
    }

    Ok(Some(notes.to_string()))
}

/// Validates a patient search query.
///
/// ## Rules
/// - Can be empty (returns the first page of patients)
/// - Maximum 100 characters
///
/// ## Returns
/// The trimmed query string.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.chars().count() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

/// Case-insensitive substring match used by name searches.
///
/// Folds with Unicode lowercase, so accented capitals match too.
///
/// ## Example
/// ```rust
/// use clinic_core::validation::name_matches;
///
/// assert!(name_matches("Ângela Ribeiro", "ângela"));
/// assert!(name_matches("Ângela Ribeiro", ""));
/// assert!(!name_matches("Ângela Ribeiro", "angela"));
/// ```
pub fn name_matches(name: &str, query: &str) -> bool {
    name.to_lowercase().contains(&query.trim().to_lowercase())
}

/// Validates a `YYYY-MM` competency period.
///
/// ## Example
/// ```rust
/// use clinic_core::validation::validate_competency;
///
/// assert!(validate_competency("2024-12").is_ok());
/// assert!(validate_competency("2024-13").is_err());
/// assert!(validate_competency("12/2024").is_err());
/// ```
pub fn validate_competency(competency: &str) -> ValidationResult<YearMonth> {
    competency.parse()
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates an amount in centavos.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed here; forms that require a value check it themselves
///
/// ## Example
/// ```rust
/// use clinic_core::validation::validate_amount_cents;
///
/// assert!(validate_amount_cents("amount", 1099).is_ok());
/// assert!(validate_amount_cents("amount", 0).is_ok());
/// assert!(validate_amount_cents("amount", -100).is_err());
/// ```
pub fn validate_amount_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a settlement delay in days.
///
/// ## Rules
/// - Between 0 and 365
pub fn validate_days_until_collection(days: i64) -> ValidationResult<u32> {
    if !(0..=365).contains(&days) {
        return Err(ValidationError::OutOfRange {
            field: "days_until_collection".to_string(),
            min: 0,
            max: 365,
        });
    }

    Ok(days as u32)
}

// =============================================================================
// Date Validators
// =============================================================================

/// Validates that an expected collection date does not precede the service.
///
/// ## Receivable Window
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  service_date ─────────────────► expected_collection_date               │
/// │       │                                   │                             │
/// │       └──── must be <= ──────────────────-┘                             │
/// │                                                                         │
/// │  No expected date at all is fine (immediate payments).                  │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_collection_window(
    service_date: NaiveDate,
    expected_collection_date: Option<NaiveDate>,
) -> ValidationResult<()> {
    match expected_collection_date {
        Some(expected) if expected < service_date => {
            Err(ValidationError::CollectionBeforeService {
                service: to_iso(service_date),
                expected: to_iso(expected),
            })
        }
        _ => Ok(()),
    }
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string format.
///
/// ## Example
/// ```rust
/// use clinic_core::validation::validate_uuid;
///
/// assert!(validate_uuid("patient_id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("patient_id", "not-a-uuid").is_err());
/// ```
pub fn validate_uuid(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
