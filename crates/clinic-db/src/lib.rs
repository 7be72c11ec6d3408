//! # clinic-db: Storage Layer for the Clinic Dashboard
//!
//! SQLite storage, configuration and session handling around `clinic-core`.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Clinic Dashboard Data Flow                       │
//! │                                                                         │
//! │  Dashboard screen (month selector)                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │                     clinic-db (THIS CRATE)                      │    │
//! │  │                                                                 │    │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐    │    │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │    │    │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │    │    │
//! │  │   │               │    │ Procedures    │    │              │    │    │
//! │  │   │ SqlitePool    │◄───│ Expenses      │    │ 001_schema   │    │    │
//! │  │   │ WAL, FK on    │    │ Compensation  │    │ 002_catalog  │    │    │
//! │  │   │               │    │ Catalog, ...  │    │              │    │    │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘    │    │
//! │  │                                                                 │    │
//! │  │   ClinicConfig (config.rs)        Session (session.rs)          │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! │       │  aggregation inputs                                             │
//! │       ▼                                                                 │
//! │  clinic-core: summarize_revenue / summarize_expenses / rank_procedures  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database and configuration error types
//! - [`config`] - File/environment configuration
//! - [`repository`] - Repository implementations
//! - [`session`] - Signed-in identity and admin flag
//!
//! ## Usage
//!
//! ```rust,ignore
//! use clinic_core::period::month_bounds;
//! use clinic_core::revenue::summarize_revenue;
//! use clinic_db::{ClinicConfig, Database};
//!
//! let config = ClinicConfig::load(None)?;
//! let db = Database::new(config.to_db_config()).await?;
//!
//! let march = month_bounds(2024, 3)?;
//! let revenue = summarize_revenue(&db.procedures().revenue_inputs(&march).await?, None);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod session;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::ClinicConfig;
pub use error::{ConfigError, DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use session::{Identity, IdentityProvider, LocalIdentityProvider, Session, SessionSnapshot};

// Repository re-exports for convenience
pub use repository::{
    CatalogRepository, CompensationRepository, ExpenseRepository, PatientRepository,
    ProcedureRepository, ProfileRepository,
};
