//! # Repository Module
//!
//! Database repositories for the clinic dashboard.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Dashboard screen                                                       │
//! │       │                                                                 │
//! │       │  db.procedures().revenue_inputs(&month)                         │
//! │       ▼                                                                 │
//! │  ProcedureRepository  ── rows ──►  clinic_core::summarize_revenue       │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! │                                                                         │
//! │  Repositories fetch and store. Every figure shown on screen is          │
//! │  computed by clinic-core from what they return.                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProcedureRepository`] - Procedures, receivables, aggregation inputs
//! - [`ExpenseRepository`] - Expenses and expense categories
//! - [`CompensationRepository`] - Owner compensation per competency
//! - [`CatalogRepository`] - Procedure types and payment methods
//! - [`PatientRepository`] - Patient search, history and upsert
//! - [`ProfileRepository`] - Role lookup for the session

pub mod catalog;
pub mod compensation;
pub mod expense;
pub mod patient;
pub mod procedure;
pub mod profile;

pub use catalog::CatalogRepository;
pub use compensation::CompensationRepository;
pub use expense::ExpenseRepository;
pub use patient::PatientRepository;
pub use procedure::ProcedureRepository;
pub use profile::ProfileRepository;

use uuid::Uuid;

/// Generates a new record id.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Fixed ids of the rows inserted by the default catalog migration.
pub mod defaults {
    pub const PAYMENT_PIX: &str = "00000000-0000-4000-8000-000000000101";
    pub const PAYMENT_CASH: &str = "00000000-0000-4000-8000-000000000102";
    pub const PAYMENT_DEBIT: &str = "00000000-0000-4000-8000-000000000103";
    pub const PAYMENT_CREDIT: &str = "00000000-0000-4000-8000-000000000104";
    pub const PAYMENT_INSURANCE: &str = "00000000-0000-4000-8000-000000000105";

    pub const TYPE_CONSULTATION: &str = "00000000-0000-4000-8000-000000000201";
    pub const TYPE_FOLLOW_UP: &str = "00000000-0000-4000-8000-000000000202";
    pub const TYPE_ULTRASOUND: &str = "00000000-0000-4000-8000-000000000203";
    pub const TYPE_ECG: &str = "00000000-0000-4000-8000-000000000204";

    pub const CATEGORY_RENT: &str = "00000000-0000-4000-8000-000000000301";
    pub const CATEGORY_SALARIES: &str = "00000000-0000-4000-8000-000000000302";
    pub const CATEGORY_SUPPLIES: &str = "00000000-0000-4000-8000-000000000303";
    pub const CATEGORY_LAB: &str = "00000000-0000-4000-8000-000000000304";
    pub const CATEGORY_PERSONAL: &str = "00000000-0000-4000-8000-000000000305";
}
