//! # Procedure Repository
//!
//! Database operations for procedures ("atendimentos") and the pending
//! receivables derived from them.
//!
//! ## Key Operations
//! - Aggregation inputs for the dashboard (revenue, ranking)
//! - Joined listings for the procedure and patient screens
//! - Pending receivables keyed by expected collection date
//! - Insert (creating the patient on the fly), sparse update, hard delete
//!
//! ## Joined Rows
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SELECT procedures ... (one query)                                      │
//! │       │                                                                 │
//! │       │  collect distinct patient / type / method ids                   │
//! │       ▼                                                                 │
//! │  SELECT ... FROM patients        WHERE id IN (...)                      │
//! │  SELECT ... FROM procedure_types WHERE id IN (...)                      │
//! │  SELECT ... FROM payment_methods WHERE id IN (...)                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ProcedureDetail { procedure, patient?, procedure_type?, method? }      │
//! │                                                                         │
//! │  A dangling reference yields None, never an error.                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{NaiveDate, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info};

use clinic_core::forms::{NewProcedure, ProcedureFilter, ProcedurePatch};
use clinic_core::period::today;
use clinic_core::ranking::RankingInput;
use clinic_core::revenue::RevenueInput;
use clinic_core::validation::name_matches;
use clinic_core::types::{CollectionStatus, PaymentCategory, ProcedureCategory};
use clinic_core::{
    DateRange, Money, Patient, PaymentMethod, PendingReceivable, Procedure, ProcedureDetail,
    ProcedureType,
};

use super::new_id;
use super::patient::insert_patient_named;
use crate::error::{DbError, DbResult};

const PROCEDURE_COLUMNS: &str = "p.id, p.patient_id, p.procedure_type_id, p.payment_method_id, \
     p.service_date, p.amount_cents, p.status, p.expected_collection_date, \
     p.collection_date, p.notes, p.created_at, p.updated_at";

// =============================================================================
// Row Types
// =============================================================================

/// Revenue columns of a procedure joined with its payment method.
#[derive(Debug, FromRow)]
struct RevenueRow {
    amount_cents: i64,
    status: String,
    payment_category: Option<String>,
    service_date: NaiveDate,
}

impl From<RevenueRow> for RevenueInput {
    fn from(row: RevenueRow) -> Self {
        RevenueInput {
            amount: Money::from_centavos(row.amount_cents),
            status: CollectionStatus::from_stored(&row.status),
            payment_category: row.payment_category.as_deref().and_then(PaymentCategory::from_stored),
            date: Some(row.service_date),
        }
    }
}

/// Ranking columns of a procedure joined with its procedure type.
#[derive(Debug, FromRow)]
struct RankingRow {
    amount_cents: i64,
    procedure_name: Option<String>,
    category: Option<String>,
    service_date: NaiveDate,
}

impl From<RankingRow> for RankingInput {
    fn from(row: RankingRow) -> Self {
        RankingInput {
            amount: Money::from_centavos(row.amount_cents),
            procedure_name: row.procedure_name,
            category: row.category.as_deref().and_then(ProcedureCategory::from_stored),
            date: Some(row.service_date),
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for procedure database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProcedureRepository::new(pool);
///
/// let month = month_bounds(2024, 3)?;
/// let revenue = summarize_revenue(&repo.revenue_inputs(&month).await?, None);
/// let ranking = rank_procedures(&repo.ranking_inputs(Some(&month)).await?, None);
/// ```
#[derive(Debug, Clone)]
pub struct ProcedureRepository {
    pool: SqlitePool,
}

impl ProcedureRepository {
    /// Creates a new ProcedureRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProcedureRepository { pool }
    }

    // =========================================================================
    // Aggregation Inputs
    // =========================================================================

    /// Returns revenue inputs for the procedures of a period.
    ///
    /// Canceled procedures are excluded here so the aggregation never sees
    /// them. A procedure whose payment method row is gone still contributes
    /// to the total with no category.
    pub async fn revenue_inputs(&self, range: &DateRange) -> DbResult<Vec<RevenueInput>> {
        debug!(start = %range.start, end = %range.end, "Loading revenue inputs");

        let rows = sqlx::query_as::<_, RevenueRow>(
            r#"
            SELECT
                p.amount_cents,
                p.status,
                pm.category AS payment_category,
                p.service_date
            FROM procedures p
            LEFT JOIN payment_methods pm ON pm.id = p.payment_method_id
            WHERE p.service_date >= ?1
              AND p.service_date <= ?2
              AND p.status != 'cancelado'
            "#,
        )
        .bind(&range.start)
        .bind(&range.end)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = rows.len(), "Revenue inputs loaded");
        Ok(rows.into_iter().map(RevenueInput::from).collect())
    }

    /// Returns ranking inputs, optionally restricted to a period.
    pub async fn ranking_inputs(&self, range: Option<&DateRange>) -> DbResult<Vec<RankingInput>> {
        let mut query = QueryBuilder::<Sqlite>::new(
            r#"
            SELECT
                p.amount_cents,
                pt.name AS procedure_name,
                pt.category AS category,
                p.service_date
            FROM procedures p
            LEFT JOIN procedure_types pt ON pt.id = p.procedure_type_id
            WHERE p.status != 'cancelado'
            "#,
        );

        if let Some(range) = range {
            query
                .push(" AND p.service_date >= ")
                .push_bind(range.start.clone())
                .push(" AND p.service_date <= ")
                .push_bind(range.end.clone());
        }

        let rows = query
            .build_query_as::<RankingRow>()
            .fetch_all(&self.pool)
            .await?;

        debug!(count = rows.len(), "Ranking inputs loaded");
        Ok(rows.into_iter().map(RankingInput::from).collect())
    }

    // =========================================================================
    // Listings
    // =========================================================================

    /// Gets a procedure by id.
    pub async fn get(&self, id: &str) -> DbResult<Option<Procedure>> {
        let sql = format!("SELECT {PROCEDURE_COLUMNS} FROM procedures p WHERE p.id = ?1");

        let procedure = sqlx::query_as::<_, Procedure>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(procedure)
    }

    /// Lists the procedures of a period with their joined rows, newest first.
    pub async fn list_in_range(&self, range: &DateRange) -> DbResult<Vec<ProcedureDetail>> {
        let filter = ProcedureFilter::default();
        self.list_where(&filter, Some(range)).await
    }

    /// Lists procedures matching the procedure screen filters, newest first.
    pub async fn list_filtered(&self, filter: &ProcedureFilter) -> DbResult<Vec<ProcedureDetail>> {
        self.list_where(filter, None).await
    }

    /// Lists every procedure of a patient, newest first.
    pub async fn list_for_patient(&self, patient_id: &str) -> DbResult<Vec<ProcedureDetail>> {
        let sql = format!(
            "SELECT {PROCEDURE_COLUMNS} FROM procedures p \
             WHERE p.patient_id = ?1 \
             ORDER BY p.service_date DESC, p.created_at DESC"
        );

        let procedures = sqlx::query_as::<_, Procedure>(&sql)
            .bind(patient_id)
            .fetch_all(&self.pool)
            .await?;

        self.attach_details(procedures).await
    }

    async fn list_where(
        &self,
        filter: &ProcedureFilter,
        range: Option<&DateRange>,
    ) -> DbResult<Vec<ProcedureDetail>> {
        // Patient names are matched here: SQLite LIKE only folds ASCII case.
        let patient_ids = match filter.patient_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => {
                let ids = self.patient_ids_matching(name).await?;
                if ids.is_empty() {
                    return Ok(Vec::new());
                }
                Some(ids)
            }
            _ => None,
        };

        let mut query = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {PROCEDURE_COLUMNS} FROM procedures p WHERE 1 = 1"
        ));

        if let Some(range) = range {
            query
                .push(" AND p.service_date >= ")
                .push_bind(range.start.clone())
                .push(" AND p.service_date <= ")
                .push_bind(range.end.clone());
        }
        if let Some(start) = filter.start_date {
            query.push(" AND p.service_date >= ").push_bind(start);
        }
        if let Some(end) = filter.end_date {
            query.push(" AND p.service_date <= ").push_bind(end);
        }
        if let Some(ids) = patient_ids {
            query.push(" AND p.patient_id IN (");
            let mut separated = query.separated(", ");
            for id in ids {
                separated.push_bind(id);
            }
            separated.push_unseparated(")");
        }
        if let Some(type_id) = filter.procedure_type_id.as_deref() {
            query.push(" AND p.procedure_type_id = ").push_bind(type_id.to_string());
        }
        if let Some(status) = filter.status {
            query.push(" AND p.status = ").push_bind(status);
        }

        query.push(" ORDER BY p.service_date DESC, p.created_at DESC");

        let procedures = query
            .build_query_as::<Procedure>()
            .fetch_all(&self.pool)
            .await?;

        debug!(count = procedures.len(), "Procedures listed");
        self.attach_details(procedures).await
    }

    async fn patient_ids_matching(&self, name: &str) -> DbResult<Vec<String>> {
        let patients = sqlx::query_as::<_, (String, String)>("SELECT id, name FROM patients")
            .fetch_all(&self.pool)
            .await?;

        Ok(patients
            .into_iter()
            .filter(|(_, patient_name)| name_matches(patient_name, name))
            .map(|(id, _)| id)
            .collect())
    }

    /// Resolves patient, procedure type and payment method of each procedure.
    async fn attach_details(&self, procedures: Vec<Procedure>) -> DbResult<Vec<ProcedureDetail>> {
        let patient_ids: BTreeSet<String> =
            procedures.iter().map(|p| p.patient_id.clone()).collect();
        let type_ids: BTreeSet<String> =
            procedures.iter().map(|p| p.procedure_type_id.clone()).collect();
        let method_ids: BTreeSet<String> =
            procedures.iter().map(|p| p.payment_method_id.clone()).collect();

        let patients: HashMap<String, Patient> = self
            .fetch_by_ids(
                "SELECT id, name, phone, email, birth_date, notes, created_at, updated_at \
                 FROM patients",
                patient_ids,
                |p: &Patient| p.id.clone(),
            )
            .await?;
        let types: HashMap<String, ProcedureType> = self
            .fetch_by_ids(
                "SELECT id, name, category, default_amount_cents, description, active, created_at \
                 FROM procedure_types",
                type_ids,
                |t: &ProcedureType| t.id.clone(),
            )
            .await?;
        let methods: HashMap<String, PaymentMethod> = self
            .fetch_by_ids(
                "SELECT id, name, category, days_until_collection, active FROM payment_methods",
                method_ids,
                |m: &PaymentMethod| m.id.clone(),
            )
            .await?;

        Ok(procedures
            .into_iter()
            .map(|procedure| ProcedureDetail {
                patient: patients.get(&procedure.patient_id).cloned(),
                procedure_type: types.get(&procedure.procedure_type_id).cloned(),
                payment_method: methods.get(&procedure.payment_method_id).cloned(),
                procedure,
            })
            .collect())
    }

    async fn fetch_by_ids<T>(
        &self,
        select: &str,
        ids: BTreeSet<String>,
        key: impl Fn(&T) -> String,
    ) -> DbResult<HashMap<String, T>>
    where
        T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
    {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut query = QueryBuilder::<Sqlite>::new(select);
        query.push(" WHERE id IN (");
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(id);
        }
        separated.push_unseparated(")");

        let rows = query.build_query_as::<T>().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(|row| (key(&row), row)).collect())
    }

    // =========================================================================
    // Receivables
    // =========================================================================

    /// Lists pending procedures, soonest expected collection first.
    ///
    /// A pending procedure without a projected date (paid through an
    /// immediate method) is keyed by its service date. The optional period
    /// filters on that key.
    pub async fn pending_receivables(
        &self,
        range: Option<&DateRange>,
    ) -> DbResult<Vec<PendingReceivable>> {
        let mut query = QueryBuilder::<Sqlite>::new(
            r#"
            SELECT
                p.id,
                COALESCE(pa.name, '') AS patient,
                COALESCE(pt.name, '') AS "procedure",
                COALESCE(pm.name, '') AS payment_method,
                p.amount_cents,
                p.service_date,
                COALESCE(p.expected_collection_date, p.service_date) AS expected_collection_date,
                p.notes
            FROM procedures p
            LEFT JOIN patients pa ON pa.id = p.patient_id
            LEFT JOIN procedure_types pt ON pt.id = p.procedure_type_id
            LEFT JOIN payment_methods pm ON pm.id = p.payment_method_id
            WHERE p.status = 'pendente'
            "#,
        );

        if let Some(range) = range {
            query
                .push(" AND COALESCE(p.expected_collection_date, p.service_date) >= ")
                .push_bind(range.start.clone())
                .push(" AND COALESCE(p.expected_collection_date, p.service_date) <= ")
                .push_bind(range.end.clone());
        }

        query.push(" ORDER BY expected_collection_date, p.service_date");

        let receivables = query
            .build_query_as::<PendingReceivable>()
            .fetch_all(&self.pool)
            .await?;

        debug!(count = receivables.len(), "Pending receivables loaded");
        Ok(receivables)
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Inserts a procedure.
    ///
    /// ## What This Does
    /// 1. Validates the form
    /// 2. Creates the patient when only a name was given
    /// 3. Inserts the procedure as pending
    ///
    /// Both inserts share one transaction.
    pub async fn insert(&self, new: NewProcedure) -> DbResult<Procedure> {
        let new = new.validate()?;
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        let patient_id = match (new.patient_id, new.patient_name) {
            (Some(id), _) => id,
            (None, Some(name)) => insert_patient_named(&mut *tx, &name).await?,
            (None, None) => {
                return Err(DbError::Internal("validated procedure without patient".to_string()))
            }
        };

        let procedure = Procedure {
            id: new_id(),
            patient_id,
            procedure_type_id: new.procedure_type_id,
            payment_method_id: new.payment_method_id,
            service_date: new.service_date,
            amount_cents: new.amount.centavos(),
            status: CollectionStatus::Pending,
            expected_collection_date: new.expected_collection_date,
            collection_date: None,
            notes: new.notes,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %procedure.id, patient_id = %procedure.patient_id, "Inserting procedure");

        sqlx::query(
            r#"
            INSERT INTO procedures (
                id, patient_id, procedure_type_id, payment_method_id,
                service_date, amount_cents, status,
                expected_collection_date, collection_date, notes,
                created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4,
                ?5, ?6, ?7,
                ?8, ?9, ?10,
                ?11, ?12
            )
            "#,
        )
        .bind(&procedure.id)
        .bind(&procedure.patient_id)
        .bind(&procedure.procedure_type_id)
        .bind(&procedure.payment_method_id)
        .bind(procedure.service_date)
        .bind(procedure.amount_cents)
        .bind(procedure.status)
        .bind(procedure.expected_collection_date)
        .bind(procedure.collection_date)
        .bind(&procedure.notes)
        .bind(procedure.created_at)
        .bind(procedure.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(id = %procedure.id, amount = %procedure.amount(), "Procedure saved");
        Ok(procedure)
    }

    /// Applies a sparse patch to a procedure.
    pub async fn update(&self, id: &str, patch: &ProcedurePatch) -> DbResult<Procedure> {
        let mut procedure = self
            .get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Procedure", id))?;

        if patch.is_empty() {
            return Ok(procedure);
        }

        procedure.apply(patch)?;
        procedure.updated_at = Utc::now();

        debug!(id = %id, "Updating procedure");

        let result = sqlx::query(
            r#"
            UPDATE procedures SET
                service_date = ?2,
                amount_cents = ?3,
                status = ?4,
                expected_collection_date = ?5,
                notes = ?6,
                updated_at = ?7
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(procedure.service_date)
        .bind(procedure.amount_cents)
        .bind(procedure.status)
        .bind(procedure.expected_collection_date)
        .bind(&procedure.notes)
        .bind(procedure.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Procedure", id));
        }

        Ok(procedure)
    }

    /// Marks a procedure as collected on the given date (today by default).
    pub async fn confirm_collection(&self, id: &str, date: Option<NaiveDate>) -> DbResult<()> {
        let collected_on = date.unwrap_or_else(today);

        let result = sqlx::query(
            r#"
            UPDATE procedures SET
                status = ?2,
                collection_date = ?3,
                updated_at = ?4
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(CollectionStatus::Collected)
        .bind(collected_on)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Procedure", id));
        }

        info!(id = %id, collected_on = %collected_on, "Collection confirmed");
        Ok(())
    }

    /// Deletes a procedure permanently.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM procedures WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Procedure", id));
        }

        info!(id = %id, "Procedure deleted");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::defaults;
    use clinic_core::period::month_bounds;
    use clinic_core::ranking::rank_procedures;
    use clinic_core::revenue::summarize_revenue;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn new_procedure(
        patient: &str,
        type_id: &str,
        method_id: &str,
        service: NaiveDate,
        cents: i64,
        expected: Option<NaiveDate>,
    ) -> NewProcedure {
        NewProcedure {
            patient_id: None,
            patient_name: Some(patient.to_string()),
            procedure_type_id: type_id.to_string(),
            payment_method_id: method_id.to_string(),
            service_date: service,
            amount: Money::from_centavos(cents),
            expected_collection_date: expected,
            notes: None,
        }
    }

    async fn setup() -> (Database, ProcedureRepository) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.procedures();
        (db, repo)
    }

    #[tokio::test]
    async fn test_insert_creates_patient_from_name() {
        let (db, repo) = setup().await;

        let saved = repo
            .insert(new_procedure(
                "Maria Souza",
                defaults::TYPE_CONSULTATION,
                defaults::PAYMENT_PIX,
                date(2024, 3, 5),
                25000,
                None,
            ))
            .await
            .unwrap();

        assert_eq!(saved.status, CollectionStatus::Pending);
        let patient = db.patients().get(&saved.patient_id).await.unwrap().unwrap();
        assert_eq!(patient.name, "Maria Souza");

        let stored = repo.get(&saved.id).await.unwrap().unwrap();
        assert_eq!(stored.amount_cents, 25000);
        assert_eq!(stored.service_date, date(2024, 3, 5));
    }

    #[tokio::test]
    async fn test_insert_rejects_unknown_payment_method() {
        let (_db, repo) = setup().await;

        let err = repo
            .insert(new_procedure(
                "João",
                defaults::TYPE_CONSULTATION,
                "00000000-0000-4000-8000-000000000999",
                date(2024, 3, 5),
                25000,
                None,
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn test_revenue_inputs_skip_canceled_and_other_months() {
        let (_db, repo) = setup().await;

        let pix = repo
            .insert(new_procedure("A", defaults::TYPE_CONSULTATION, defaults::PAYMENT_PIX, date(2024, 3, 1), 25000, None))
            .await
            .unwrap();
        repo.confirm_collection(&pix.id, Some(date(2024, 3, 1))).await.unwrap();

        repo.insert(new_procedure(
            "B",
            defaults::TYPE_ULTRASOUND,
            defaults::PAYMENT_INSURANCE,
            date(2024, 3, 31),
            18000,
            Some(date(2024, 4, 30)),
        ))
        .await
        .unwrap();

        let canceled = repo
            .insert(new_procedure("C", defaults::TYPE_ECG, defaults::PAYMENT_DEBIT, date(2024, 3, 10), 12000, None))
            .await
            .unwrap();
        let cancel = ProcedurePatch {
            status: Some(CollectionStatus::Canceled),
            ..Default::default()
        };
        repo.update(&canceled.id, &cancel).await.unwrap();

        repo.insert(new_procedure("D", defaults::TYPE_CONSULTATION, defaults::PAYMENT_PIX, date(2024, 4, 1), 25000, None))
            .await
            .unwrap();

        let march = month_bounds(2024, 3).unwrap();
        let summary = summarize_revenue(&repo.revenue_inputs(&march).await.unwrap(), None);

        assert_eq!(summary.count, 2);
        assert_eq!(summary.total.centavos(), 43000);
        assert_eq!(summary.immediate.centavos(), 25000);
        assert_eq!(summary.insurance.centavos(), 18000);
        assert_eq!(summary.collected.centavos(), 25000);
        assert_eq!(summary.pending.centavos(), 18000);
    }

    #[tokio::test]
    async fn test_ranking_inputs_resolve_deactivated_types() {
        let (db, repo) = setup().await;

        for cents in [12000, 13000] {
            repo.insert(new_procedure("A", defaults::TYPE_ECG, defaults::PAYMENT_PIX, date(2024, 3, 2), cents, None))
                .await
                .unwrap();
        }
        repo.insert(new_procedure("B", defaults::TYPE_CONSULTATION, defaults::PAYMENT_PIX, date(2024, 3, 3), 20000, None))
            .await
            .unwrap();

        db.catalog().deactivate_procedure_type(defaults::TYPE_ECG).await.unwrap();

        let inputs = repo.ranking_inputs(None).await.unwrap();
        let ranking = rank_procedures(&inputs, None);

        assert_eq!(ranking.len(), 2);
        assert_eq!(ranking[0].name, "Eletrocardiograma");
        assert_eq!(ranking[0].count, 2);
        assert_eq!(ranking[0].total.centavos(), 25000);
        assert_eq!(ranking[1].name, "Consulta");
    }

    #[tokio::test]
    async fn test_pending_receivables_ordered_by_expected_date() {
        let (_db, repo) = setup().await;

        repo.insert(new_procedure(
            "Late",
            defaults::TYPE_ULTRASOUND,
            defaults::PAYMENT_INSURANCE,
            date(2024, 3, 1),
            18000,
            Some(date(2024, 3, 31)),
        ))
        .await
        .unwrap();
        repo.insert(new_procedure(
            "Soon",
            defaults::TYPE_CONSULTATION,
            defaults::PAYMENT_DEBIT,
            date(2024, 3, 1),
            25000,
            Some(date(2024, 3, 2)),
        ))
        .await
        .unwrap();
        let collected = repo
            .insert(new_procedure(
                "Paid",
                defaults::TYPE_CONSULTATION,
                defaults::PAYMENT_CREDIT,
                date(2024, 3, 1),
                25000,
                Some(date(2024, 3, 31)),
            ))
            .await
            .unwrap();
        repo.confirm_collection(&collected.id, None).await.unwrap();

        let all = repo.pending_receivables(None).await.unwrap();
        let patients: Vec<&str> = all.iter().map(|r| r.patient.as_str()).collect();
        assert_eq!(patients, vec!["Soon", "Late"]);
        assert_eq!(all[1].payment_method, "Convênio");
        assert_eq!(all[1].procedure, "Ultrassom");

        let april = month_bounds(2024, 4).unwrap();
        assert!(repo.pending_receivables(Some(&april)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_filtered_and_details() {
        let (_db, repo) = setup().await;

        repo.insert(new_procedure("Ana Lima", defaults::TYPE_CONSULTATION, defaults::PAYMENT_PIX, date(2024, 3, 1), 25000, None))
            .await
            .unwrap();
        repo.insert(new_procedure("Bruno Alves", defaults::TYPE_ECG, defaults::PAYMENT_PIX, date(2024, 3, 9), 12000, None))
            .await
            .unwrap();
        repo.insert(new_procedure("Ana Lima", defaults::TYPE_ECG, defaults::PAYMENT_PIX, date(2024, 2, 9), 12000, None))
            .await
            .unwrap();

        let filter = ProcedureFilter {
            patient_name: Some("ana".to_string()),
            start_date: Some(date(2024, 3, 1)),
            ..Default::default()
        };
        let listed = repo.list_filtered(&filter).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].patient.as_ref().unwrap().name, "Ana Lima");
        assert_eq!(listed[0].procedure_type.as_ref().unwrap().name, "Consulta");
        assert_eq!(listed[0].payment_method.as_ref().unwrap().name, "Pix");

        let march = month_bounds(2024, 3).unwrap();
        let in_march = repo.list_in_range(&march).await.unwrap();
        let dates: Vec<NaiveDate> = in_march.iter().map(|d| d.procedure.service_date).collect();
        assert_eq!(dates, vec![date(2024, 3, 9), date(2024, 3, 1)]);
    }

    #[tokio::test]
    async fn test_list_filtered_by_accented_patient_name() {
        let (_db, repo) = setup().await;

        repo.insert(new_procedure("Ângela Ribeiro", defaults::TYPE_CONSULTATION, defaults::PAYMENT_PIX, date(2024, 3, 1), 25000, None))
            .await
            .unwrap();
        repo.insert(new_procedure("Angelo Reis", defaults::TYPE_ECG, defaults::PAYMENT_PIX, date(2024, 3, 2), 12000, None))
            .await
            .unwrap();

        let filter = ProcedureFilter {
            patient_name: Some("ângela".to_string()),
            ..Default::default()
        };
        let listed = repo.list_filtered(&filter).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].patient.as_ref().unwrap().name, "Ângela Ribeiro");

        let filter = ProcedureFilter {
            patient_name: Some("Zélia".to_string()),
            ..Default::default()
        };
        assert!(repo.list_filtered(&filter).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sparse_update_keeps_other_fields() {
        let (_db, repo) = setup().await;

        let mut new = new_procedure("A", defaults::TYPE_CONSULTATION, defaults::PAYMENT_CREDIT, date(2024, 3, 1), 25000, Some(date(2024, 3, 31)));
        new.notes = Some("primeira consulta".to_string());
        let saved = repo.insert(new).await.unwrap();

        let patch = ProcedurePatch {
            amount: Some(Money::from_centavos(30000)),
            ..Default::default()
        };
        let updated = repo.update(&saved.id, &patch).await.unwrap();

        assert_eq!(updated.amount_cents, 30000);
        assert_eq!(updated.notes.as_deref(), Some("primeira consulta"));
        assert_eq!(updated.expected_collection_date, Some(date(2024, 3, 31)));

        let stored = repo.get(&saved.id).await.unwrap().unwrap();
        assert_eq!(stored.amount_cents, 30000);
        assert_eq!(stored.notes.as_deref(), Some("primeira consulta"));
    }

    #[tokio::test]
    async fn test_update_rejects_collection_before_service() {
        let (_db, repo) = setup().await;

        let saved = repo
            .insert(new_procedure("A", defaults::TYPE_CONSULTATION, defaults::PAYMENT_CREDIT, date(2024, 3, 10), 25000, Some(date(2024, 4, 9))))
            .await
            .unwrap();

        let patch = ProcedurePatch {
            expected_collection_date: Some(Some(date(2024, 3, 1))),
            ..Default::default()
        };
        let err = repo.update(&saved.id, &patch).await.unwrap_err();
        assert!(matches!(err, DbError::Invalid(_)));
    }

    #[tokio::test]
    async fn test_delete_is_hard_and_missing_is_not_found() {
        let (_db, repo) = setup().await;

        let saved = repo
            .insert(new_procedure("A", defaults::TYPE_CONSULTATION, defaults::PAYMENT_PIX, date(2024, 3, 1), 25000, None))
            .await
            .unwrap();

        repo.delete(&saved.id).await.unwrap();
        assert!(repo.get(&saved.id).await.unwrap().is_none());

        let err = repo.delete(&saved.id).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));

        let err = repo.confirm_collection("missing", None).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
