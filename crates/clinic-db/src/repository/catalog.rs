//! # Catalog Repository
//!
//! Procedure types and payment methods, the two lookup tables every procedure
//! references.
//!
//! ## Soft Delete
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  deactivate_procedure_type(id)                                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  UPDATE procedure_types SET active = 0                                  │
//! │       │                                                                 │
//! │       ├── procedure_types()        no longer lists it (form dropdown)   │
//! │       ├── procedure_types_all()    still lists it (settings screen)     │
//! │       └── get_procedure_type(id)   still resolves it (history, ranking) │
//! │                                                                         │
//! │  update_procedure_type(id, { active: Some(true) }) brings it back       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! Procedures, expenses and owner compensation are hard deleted elsewhere;
//! only the catalog keeps retired rows.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use clinic_core::forms::{ProcedureTypeForm, ProcedureTypePatch};
use clinic_core::{PaymentMethod, ProcedureType};

use super::new_id;
use crate::error::{DbError, DbResult};

const PROCEDURE_TYPE_COLUMNS: &str =
    "id, name, category, default_amount_cents, description, active, created_at";

const PAYMENT_METHOD_COLUMNS: &str = "id, name, category, days_until_collection, active";

/// Repository for procedure types and payment methods.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    /// Creates a new CatalogRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    // =========================================================================
    // Procedure Types
    // =========================================================================

    /// Lists active procedure types, consultations before exams, then by name.
    pub async fn procedure_types(&self) -> DbResult<Vec<ProcedureType>> {
        self.list_procedure_types(false).await
    }

    /// Lists every procedure type, retired ones included, for the settings
    /// screen where they can be reactivated.
    pub async fn procedure_types_all(&self) -> DbResult<Vec<ProcedureType>> {
        self.list_procedure_types(true).await
    }

    async fn list_procedure_types(&self, include_inactive: bool) -> DbResult<Vec<ProcedureType>> {
        let filter = if include_inactive { "" } else { "WHERE active = 1 " };
        let sql = format!(
            "SELECT {PROCEDURE_TYPE_COLUMNS} FROM procedure_types {filter}ORDER BY category, name"
        );

        let types = sqlx::query_as::<_, ProcedureType>(&sql)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = types.len(), include_inactive = include_inactive, "Loaded procedure types");
        Ok(types)
    }

    /// Gets a procedure type by id, active or not.
    pub async fn get_procedure_type(&self, id: &str) -> DbResult<Option<ProcedureType>> {
        let sql = format!("SELECT {PROCEDURE_TYPE_COLUMNS} FROM procedure_types WHERE id = ?1");

        let procedure_type = sqlx::query_as::<_, ProcedureType>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(procedure_type)
    }

    /// Creates a procedure type from a validated form.
    pub async fn create_procedure_type(&self, form: ProcedureTypeForm) -> DbResult<ProcedureType> {
        let form = form.validate()?;

        let procedure_type = ProcedureType {
            id: new_id(),
            name: form.name,
            category: form.category,
            default_amount_cents: form.default_amount.map(|m| m.centavos()),
            description: form.description,
            active: true,
            created_at: Utc::now(),
        };

        debug!(id = %procedure_type.id, name = %procedure_type.name, "Creating procedure type");

        sqlx::query(
            r#"
            INSERT INTO procedure_types (
                id, name, category, default_amount_cents, description, active, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&procedure_type.id)
        .bind(&procedure_type.name)
        .bind(procedure_type.category)
        .bind(procedure_type.default_amount_cents)
        .bind(&procedure_type.description)
        .bind(procedure_type.active)
        .bind(procedure_type.created_at)
        .execute(&self.pool)
        .await?;

        Ok(procedure_type)
    }

    /// Applies a sparse patch to a procedure type.
    ///
    /// Fields absent from the patch keep their stored value.
    pub async fn update_procedure_type(
        &self,
        id: &str,
        patch: &ProcedureTypePatch,
    ) -> DbResult<ProcedureType> {
        let mut procedure_type = self
            .get_procedure_type(id)
            .await?
            .ok_or_else(|| DbError::not_found("ProcedureType", id))?;

        procedure_type.apply(patch)?;

        debug!(id = %id, "Updating procedure type");

        let result = sqlx::query(
            r#"
            UPDATE procedure_types SET
                name = ?2,
                category = ?3,
                default_amount_cents = ?4,
                description = ?5,
                active = ?6
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&procedure_type.name)
        .bind(procedure_type.category)
        .bind(procedure_type.default_amount_cents)
        .bind(&procedure_type.description)
        .bind(procedure_type.active)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("ProcedureType", id));
        }

        Ok(procedure_type)
    }

    /// Deactivates a procedure type (soft delete).
    pub async fn deactivate_procedure_type(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("UPDATE procedure_types SET active = 0 WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("ProcedureType", id));
        }

        info!(id = %id, "Procedure type deactivated");
        Ok(())
    }

    // =========================================================================
    // Payment Methods
    // =========================================================================

    /// Lists active payment methods by name.
    pub async fn payment_methods(&self) -> DbResult<Vec<PaymentMethod>> {
        let sql = format!(
            "SELECT {PAYMENT_METHOD_COLUMNS} FROM payment_methods WHERE active = 1 ORDER BY name"
        );

        let methods = sqlx::query_as::<_, PaymentMethod>(&sql)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = methods.len(), "Loaded payment methods");
        Ok(methods)
    }

    /// Gets a payment method by id, active or not.
    pub async fn get_payment_method(&self, id: &str) -> DbResult<Option<PaymentMethod>> {
        let sql = format!("SELECT {PAYMENT_METHOD_COLUMNS} FROM payment_methods WHERE id = ?1");

        let method = sqlx::query_as::<_, PaymentMethod>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(method)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
