//! # Patient Repository
//!
//! Patient search for the procedure form, patient history, and upsert.

use chrono::Utc;
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use clinic_core::revenue::{summarize_patient_history, PatientHistorySummary};
use clinic_core::validation::{
    name_matches, validate_notes, validate_required_name, validate_search_query,
};
use clinic_core::{Patient, ProcedureDetail};

use super::new_id;
use super::procedure::ProcedureRepository;
use crate::error::{DbError, DbResult};

const PATIENT_COLUMNS: &str = "id, name, phone, email, birth_date, notes, created_at, updated_at";

/// A patient with every procedure they had, newest first.
#[derive(Debug, Clone, Serialize)]
pub struct PatientHistory {
    pub patient: Patient,
    pub procedures: Vec<ProcedureDetail>,
    pub summary: PatientHistorySummary,
}

/// Inserts a patient known only by name and returns its id.
///
/// Takes a connection so the procedure insert can run it inside its
/// transaction.
pub(crate) async fn insert_patient_named(conn: &mut SqliteConnection, name: &str) -> DbResult<String> {
    let name = validate_required_name("patient_name", name)?;
    let id = new_id();
    let now = Utc::now();

    debug!(id = %id, "Creating patient from procedure form");

    sqlx::query(
        "INSERT INTO patients (id, name, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
    )
    .bind(&id)
    .bind(&name)
    .bind(now)
    .execute(conn)
    .await?;

    Ok(id)
}

/// Repository for patient database operations.
#[derive(Debug, Clone)]
pub struct PatientRepository {
    pool: SqlitePool,
}

impl PatientRepository {
    /// Creates a new PatientRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PatientRepository { pool }
    }

    /// Searches patients by name substring, ordered by name.
    ///
    /// An empty query lists patients alphabetically up to `limit`. Matching
    /// ignores case for accented letters too, which SQLite `LIKE` does not,
    /// so the filter runs here.
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Patient>> {
        let query = validate_search_query(query)?;

        debug!(query = %query, limit = %limit, "Searching patients");

        let patients = if query.is_empty() {
            let sql = format!("SELECT {PATIENT_COLUMNS} FROM patients ORDER BY name LIMIT ?1");
            sqlx::query_as::<_, Patient>(&sql)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
        } else {
            let sql = format!("SELECT {PATIENT_COLUMNS} FROM patients ORDER BY name");
            sqlx::query_as::<_, Patient>(&sql)
                .fetch_all(&self.pool)
                .await?
                .into_iter()
                .filter(|p| name_matches(&p.name, &query))
                .take(limit as usize)
                .collect()
        };

        debug!(count = patients.len(), "Patient search returned");
        Ok(patients)
    }

    /// Gets a patient by id.
    pub async fn get(&self, id: &str) -> DbResult<Option<Patient>> {
        let sql = format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE id = ?1");

        let patient = sqlx::query_as::<_, Patient>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(patient)
    }

    /// Loads a patient's procedures and their totals.
    ///
    /// The totals cover every procedure, canceled ones included.
    pub async fn history(&self, id: &str) -> DbResult<PatientHistory> {
        let patient = self
            .get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Patient", id))?;

        let procedures = ProcedureRepository::new(self.pool.clone())
            .list_for_patient(id)
            .await?;

        let plain: Vec<_> = procedures.iter().map(|d| d.procedure.clone()).collect();
        let summary = summarize_patient_history(&plain);

        Ok(PatientHistory {
            patient,
            procedures,
            summary,
        })
    }

    /// Inserts or updates a patient.
    ///
    /// An empty id creates a new patient. `created_at` of an existing row is
    /// preserved.
    pub async fn save(&self, mut patient: Patient) -> DbResult<Patient> {
        patient.name = validate_required_name("name", &patient.name)?;
        patient.notes = validate_notes(patient.notes.as_deref())?;
        if patient.id.trim().is_empty() {
            patient.id = new_id();
        }
        patient.updated_at = Utc::now();

        debug!(id = %patient.id, "Saving patient");

        sqlx::query(
            r#"
            INSERT INTO patients (
                id, name, phone, email, birth_date, notes, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT (id) DO UPDATE SET
                name = excluded.name,
                phone = excluded.phone,
                email = excluded.email,
                birth_date = excluded.birth_date,
                notes = excluded.notes,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&patient.id)
        .bind(&patient.name)
        .bind(&patient.phone)
        .bind(&patient.email)
        .bind(patient.birth_date)
        .bind(&patient.notes)
        .bind(patient.created_at)
        .bind(patient.updated_at)
        .execute(&self.pool)
        .await?;

        self.get(&patient.id)
            .await?
            .ok_or_else(|| DbError::not_found("Patient", &patient.id))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
