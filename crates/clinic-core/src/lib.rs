//! # clinic-core: Pure Business Logic for the Clinic Dashboard
//!
//! This crate holds the computational core of the clinic's financial
//! dashboard as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Clinic Dashboard Architecture                       │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Dashboard (presentation)                     │   │
//! │  │   Summary cards ──► Receivables ──► Ranking ──► Reports         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ clinic-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌────────────────┐    │   │
//! │  │   │  period  │ │ revenue  │ │ expenses │ │    ranking     │    │   │
//! │  │   │  bounds  │ │ summary  │ │ summary  │ │ by total DESC  │    │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └────────────────┘    │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌────────────────┐    │   │
//! │  │   │receivable│ │   join   │ │  forms   │ │   validation   │    │   │
//! │  │   │  draft   │ │  shapes  │ │ patches  │ │     rules      │    │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └────────────────┘    │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  clinic-db (Storage Layer)                      │   │
//! │  │        SQLite repositories, migrations, config, session         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Procedure, PaymentMethod, Expense, etc.)
//! - [`money`] - Money type in integer centavos
//! - [`period`] - Month buckets, collection projection, competency labels
//! - [`revenue`] - Revenue summary, receivables, monthly series
//! - [`expenses`] - Expense summary, monthly result, owner compensation
//! - [`ranking`] - Procedure ranking by revenue
//! - [`receivable`] - Expected-collection rule and the procedure draft
//! - [`join`] - Normalization of backend join shapes
//! - [`forms`] - Create forms and sparse patches
//! - [`validation`] - Write-side validation
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same input, same output; inputs are never mutated
//! 2. **No I/O**: storage, network and auth belong to clinic-db
//! 3. **Integer Money**: all amounts are centavos (i64)
//! 4. **Skip, Don't Fail**: aggregation has no error path
//!
//! ## Example Usage
//!
//! ```rust
//! use clinic_core::money::Money;
//! use clinic_core::revenue::{summarize_revenue, RevenueInput};
//! use clinic_core::types::{CollectionStatus, PaymentCategory};
//!
//! let records = vec![
//!     RevenueInput {
//!         amount: Money::from_centavos(25000),
//!         status: Some(CollectionStatus::Pending),
//!         payment_category: Some(PaymentCategory::Insurance),
//!         date: None,
//!     },
//! ];
//!
//! let summary = summarize_revenue(&records, None);
//! assert_eq!(summary.insurance.centavos(), 25000);
//! assert_eq!(summary.pending, summary.total);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod expenses;
pub mod forms;
pub mod join;
pub mod money;
pub mod period;
pub mod ranking;
pub mod receivable;
pub mod revenue;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use clinic_core::Money` instead of
// `use clinic_core::money::Money`

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use period::{DateRange, YearMonth};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum patients returned by a name search.
pub const DEFAULT_PATIENT_SEARCH_LIMIT: u32 = 50;

/// Entries shown in the dashboard's top-procedures breakdown.
pub const RANKING_TOP_N: usize = 5;

/// Maximum length of names and descriptions.
pub const MAX_NAME_LENGTH: usize = 200;

/// Maximum length of free-text notes.
pub const MAX_NOTES_LENGTH: usize = 2000;
