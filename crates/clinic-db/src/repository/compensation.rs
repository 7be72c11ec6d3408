//! # Owner Compensation Repository
//!
//! Owner compensation ("pró-labore") records, one per competency by
//! convention. Competencies are `YYYY-MM` text, so a year is the textual
//! range `YYYY-01` ..= `YYYY-12`.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use clinic_core::forms::{CompensationPatch, NewCompensation};
use clinic_core::period::year_bounds;
use clinic_core::OwnerCompensation;

use super::new_id;
use crate::error::{DbError, DbResult};

const COMPENSATION_COLUMNS: &str =
    "id, competency, amount_cents, payment_date, notes, created_at, updated_at";

/// Repository for owner compensation database operations.
#[derive(Debug, Clone)]
pub struct CompensationRepository {
    pool: SqlitePool,
}

impl CompensationRepository {
    /// Creates a new CompensationRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CompensationRepository { pool }
    }

    /// Lists the records of a year, latest competency first.
    pub async fn list_for_year(&self, year: i32) -> DbResult<Vec<OwnerCompensation>> {
        let (first, last) = year_bounds(year);

        let sql = format!(
            "SELECT {COMPENSATION_COLUMNS} FROM owner_compensation \
             WHERE competency >= ?1 AND competency <= ?2 \
             ORDER BY competency DESC"
        );

        let records = sqlx::query_as::<_, OwnerCompensation>(&sql)
            .bind(first.to_string())
            .bind(last.to_string())
            .fetch_all(&self.pool)
            .await?;

        debug!(year = year, count = records.len(), "Owner compensation loaded");
        Ok(records)
    }

    /// Gets a record by id.
    pub async fn get(&self, id: &str) -> DbResult<Option<OwnerCompensation>> {
        let sql = format!("SELECT {COMPENSATION_COLUMNS} FROM owner_compensation WHERE id = ?1");

        let record = sqlx::query_as::<_, OwnerCompensation>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    /// Inserts a record.
    pub async fn insert(&self, new: NewCompensation) -> DbResult<OwnerCompensation> {
        let new = new.validate()?;
        let now = Utc::now();

        let record = OwnerCompensation {
            id: new_id(),
            competency: new.competency,
            amount_cents: new.amount.centavos(),
            payment_date: new.payment_date,
            notes: new.notes,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO owner_compensation (
                id, competency, amount_cents, payment_date, notes, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&record.id)
        .bind(&record.competency)
        .bind(record.amount_cents)
        .bind(record.payment_date)
        .bind(&record.notes)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;

        info!(id = %record.id, competency = %record.competency, "Owner compensation saved");
        Ok(record)
    }

    /// Applies a sparse patch to a record.
    pub async fn update(&self, id: &str, patch: &CompensationPatch) -> DbResult<OwnerCompensation> {
        let mut record = self
            .get(id)
            .await?
            .ok_or_else(|| DbError::not_found("OwnerCompensation", id))?;

        record.apply(patch)?;
        record.updated_at = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE owner_compensation SET
                competency = ?2,
                amount_cents = ?3,
                payment_date = ?4,
                notes = ?5,
                updated_at = ?6
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&record.competency)
        .bind(record.amount_cents)
        .bind(record.payment_date)
        .bind(&record.notes)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("OwnerCompensation", id));
        }

        Ok(record)
    }

    /// Deletes a record permanently.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM owner_compensation WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("OwnerCompensation", id));
        }

        info!(id = %id, "Owner compensation deleted");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
