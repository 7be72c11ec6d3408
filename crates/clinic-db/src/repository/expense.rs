//! # Expense Repository
//!
//! Expenses, their categories, and the inputs of the expense summary.

use chrono::{NaiveDate, Utc};
use sqlx::{FromRow, SqlitePool};
use std::collections::HashMap;
use tracing::{debug, info};

use clinic_core::expenses::ExpenseInput;
use clinic_core::forms::{ExpensePatch, NewExpense};
use clinic_core::types::{ExpenseCategoryType, ExpenseStatus};
use clinic_core::{DateRange, Expense, ExpenseCategory, ExpenseDetail, Money};

use super::new_id;
use crate::error::{DbError, DbResult};

const EXPENSE_COLUMNS: &str = "id, category_id, description, amount_cents, expense_date, \
     payment_date, recurring, status, payment_method, notes, created_at, updated_at";

/// Summary columns of an expense joined with its category.
#[derive(Debug, FromRow)]
struct ExpenseSummaryRow {
    amount_cents: i64,
    kind: Option<String>,
    expense_date: NaiveDate,
}

impl From<ExpenseSummaryRow> for ExpenseInput {
    fn from(row: ExpenseSummaryRow) -> Self {
        ExpenseInput {
            amount: Money::from_centavos(row.amount_cents),
            category_type: row.kind.as_deref().and_then(ExpenseCategoryType::from_stored),
            date: Some(row.expense_date),
        }
    }
}

/// Repository for expense database operations.
#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    pool: SqlitePool,
}

impl ExpenseRepository {
    /// Creates a new ExpenseRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ExpenseRepository { pool }
    }

    /// Returns expense summary inputs for a period, canceled expenses excluded.
    pub async fn summary_inputs(&self, range: &DateRange) -> DbResult<Vec<ExpenseInput>> {
        debug!(start = %range.start, end = %range.end, "Loading expense inputs");

        let rows = sqlx::query_as::<_, ExpenseSummaryRow>(
            r#"
            SELECT
                e.amount_cents,
                c.kind,
                e.expense_date
            FROM expenses e
            LEFT JOIN expense_categories c ON c.id = e.category_id
            WHERE e.expense_date >= ?1
              AND e.expense_date <= ?2
              AND e.status != 'cancelado'
            "#,
        )
        .bind(&range.start)
        .bind(&range.end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ExpenseInput::from).collect())
    }

    /// Lists the expenses of a period with their category, newest first.
    pub async fn list_in_range(&self, range: &DateRange) -> DbResult<Vec<ExpenseDetail>> {
        let sql = format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses \
             WHERE expense_date >= ?1 AND expense_date <= ?2 \
             ORDER BY expense_date DESC, created_at DESC"
        );

        let expenses = sqlx::query_as::<_, Expense>(&sql)
            .bind(&range.start)
            .bind(&range.end)
            .fetch_all(&self.pool)
            .await?;

        let categories: HashMap<String, ExpenseCategory> = self
            .all_categories()
            .await?
            .into_iter()
            .map(|c| (c.id.clone(), c))
            .collect();

        Ok(expenses
            .into_iter()
            .map(|expense| ExpenseDetail {
                category: categories.get(&expense.category_id).cloned(),
                expense,
            })
            .collect())
    }

    /// Gets an expense by id.
    pub async fn get(&self, id: &str) -> DbResult<Option<Expense>> {
        let sql = format!("SELECT {EXPENSE_COLUMNS} FROM expenses WHERE id = ?1");

        let expense = sqlx::query_as::<_, Expense>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(expense)
    }

    /// Inserts an expense as pending.
    pub async fn insert(&self, new: NewExpense) -> DbResult<Expense> {
        let new = new.validate()?;
        let now = Utc::now();

        let expense = Expense {
            id: new_id(),
            category_id: new.category_id,
            description: new.description,
            amount_cents: new.amount.centavos(),
            expense_date: new.expense_date,
            payment_date: None,
            recurring: new.recurring,
            status: ExpenseStatus::Pending,
            payment_method: new.payment_method,
            notes: new.notes,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %expense.id, category_id = %expense.category_id, "Inserting expense");

        sqlx::query(
            r#"
            INSERT INTO expenses (
                id, category_id, description, amount_cents, expense_date,
                payment_date, recurring, status, payment_method, notes,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&expense.id)
        .bind(&expense.category_id)
        .bind(&expense.description)
        .bind(expense.amount_cents)
        .bind(expense.expense_date)
        .bind(expense.payment_date)
        .bind(expense.recurring)
        .bind(expense.status)
        .bind(&expense.payment_method)
        .bind(&expense.notes)
        .bind(expense.created_at)
        .bind(expense.updated_at)
        .execute(&self.pool)
        .await?;

        info!(id = %expense.id, amount = %expense.amount(), "Expense saved");
        Ok(expense)
    }

    /// Applies a sparse patch to an expense.
    pub async fn update(&self, id: &str, patch: &ExpensePatch) -> DbResult<Expense> {
        let mut expense = self
            .get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Expense", id))?;

        expense.apply(patch)?;
        expense.updated_at = Utc::now();

        debug!(id = %id, "Updating expense");

        let result = sqlx::query(
            r#"
            UPDATE expenses SET
                category_id = ?2,
                description = ?3,
                amount_cents = ?4,
                expense_date = ?5,
                payment_date = ?6,
                status = ?7,
                payment_method = ?8,
                notes = ?9,
                updated_at = ?10
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&expense.category_id)
        .bind(&expense.description)
        .bind(expense.amount_cents)
        .bind(expense.expense_date)
        .bind(expense.payment_date)
        .bind(expense.status)
        .bind(&expense.payment_method)
        .bind(&expense.notes)
        .bind(expense.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Expense", id));
        }

        Ok(expense)
    }

    /// Deletes an expense permanently.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM expenses WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Expense", id));
        }

        info!(id = %id, "Expense deleted");
        Ok(())
    }

    /// Lists active expense categories, grouped by kind then by name.
    pub async fn categories(&self) -> DbResult<Vec<ExpenseCategory>> {
        let categories = sqlx::query_as::<_, ExpenseCategory>(
            "SELECT id, name, kind, active FROM expense_categories \
             WHERE active = 1 ORDER BY kind, name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    async fn all_categories(&self) -> DbResult<Vec<ExpenseCategory>> {
        let categories = sqlx::query_as::<_, ExpenseCategory>(
            "SELECT id, name, kind, active FROM expense_categories",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
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
    use clinic_core::expenses::summarize_expenses;
    use clinic_core::period::month_bounds;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn new_expense(category_id: &str, description: &str, cents: i64, day: NaiveDate) -> NewExpense {
        NewExpense {
            category_id: category_id.to_string(),
            description: description.to_string(),
            amount: Money::from_centavos(cents),
            expense_date: day,
            payment_method: Some("pix".to_string()),
            recurring: false,
            notes: None,
        }
    }

    async fn repo() -> ExpenseRepository {
        Database::new(DbConfig::in_memory()).await.unwrap().expenses()
    }

    #[tokio::test]
    async fn test_summary_inputs_bucket_by_category_kind() {
        let repo = repo().await;

        repo.insert(new_expense(defaults::CATEGORY_RENT, "Aluguel março", 400000, date(2024, 3, 5)))
            .await
            .unwrap();
        repo.insert(new_expense(defaults::CATEGORY_LAB, "Exames terceirizados", 50000, date(2024, 3, 31)))
            .await
            .unwrap();
        repo.insert(new_expense(defaults::CATEGORY_PERSONAL, "Mercado", 30000, date(2024, 3, 12)))
            .await
            .unwrap();
        let canceled = repo
            .insert(new_expense(defaults::CATEGORY_SUPPLIES, "Luvas", 9000, date(2024, 3, 12)))
            .await
            .unwrap();
        let cancel = ExpensePatch {
            status: Some(ExpenseStatus::Canceled),
            ..Default::default()
        };
        repo.update(&canceled.id, &cancel).await.unwrap();
        repo.insert(new_expense(defaults::CATEGORY_RENT, "Aluguel abril", 400000, date(2024, 4, 5)))
            .await
            .unwrap();

        let march = month_bounds(2024, 3).unwrap();
        let summary = summarize_expenses(&repo.summary_inputs(&march).await.unwrap(), None);

        assert_eq!(summary.total.centavos(), 480000);
        assert_eq!(summary.fixed.centavos(), 400000);
        assert_eq!(summary.variable.centavos(), 50000);
        assert_eq!(summary.personal.centavos(), 30000);
    }

    #[tokio::test]
    async fn test_list_in_range_includes_category() {
        let repo = repo().await;

        repo.insert(new_expense(defaults::CATEGORY_RENT, "Aluguel", 400000, date(2024, 3, 5)))
            .await
            .unwrap();
        repo.insert(new_expense(defaults::CATEGORY_LAB, "Laboratório", 50000, date(2024, 3, 20)))
            .await
            .unwrap();

        let listed = repo.list_in_range(&month_bounds(2024, 3).unwrap()).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].expense.description, "Laboratório");
        assert_eq!(
            listed[0].category.as_ref().map(|c| c.kind),
            Some(ExpenseCategoryType::Variable)
        );
    }

    #[tokio::test]
    async fn test_mark_paid_keeps_other_fields() {
        let repo = repo().await;

        let saved = repo
            .insert(new_expense(defaults::CATEGORY_SALARIES, "Secretária", 250000, date(2024, 3, 5)))
            .await
            .unwrap();

        let paid = ExpensePatch {
            status: Some(ExpenseStatus::Paid),
            payment_date: Some(Some(date(2024, 3, 6))),
            ..Default::default()
        };
        let updated = repo.update(&saved.id, &paid).await.unwrap();

        assert_eq!(updated.status, ExpenseStatus::Paid);
        assert_eq!(updated.description, "Secretária");
        assert_eq!(updated.payment_method.as_deref(), Some("pix"));

        let stored = repo.get(&saved.id).await.unwrap().unwrap();
        assert_eq!(stored.payment_date, Some(date(2024, 3, 6)));
        assert_eq!(stored.amount_cents, 250000);
    }

    #[tokio::test]
    async fn test_delete_and_categories() {
        let repo = repo().await;

        let saved = repo
            .insert(new_expense(defaults::CATEGORY_RENT, "Aluguel", 400000, date(2024, 3, 5)))
            .await
            .unwrap();
        repo.delete(&saved.id).await.unwrap();
        assert!(repo.get(&saved.id).await.unwrap().is_none());

        let err = repo.delete(&saved.id).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));

        let categories = repo.categories().await.unwrap();
        assert_eq!(categories.len(), 5);
        assert_eq!(categories[0].kind, ExpenseCategoryType::Fixed);
    }

    #[tokio::test]
    async fn test_insert_rejects_negative_amount() {
        let repo = repo().await;

        let err = repo
            .insert(new_expense(defaults::CATEGORY_RENT, "Estorno", -100, date(2024, 3, 5)))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Invalid(_)));
    }
}
