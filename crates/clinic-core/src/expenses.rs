//! # Expense Aggregation
//!
//! Monthly expense summary by category type, the monthly result, and the
//! owner compensation totals.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::period::DateRange;
use crate::revenue::{in_period, RevenueSummary};
use crate::types::{ExpenseCategoryType, OwnerCompensation};

/// One expense as seen by the aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseInput {
    pub amount: Money,
    /// Type of the joined category; `None` when the category is missing or
    /// its stored type is unrecognized.
    pub category_type: Option<ExpenseCategoryType>,
    /// Expense date. Only consulted when a period filter is given.
    pub date: Option<NaiveDate>,
}

/// Monthly expense figures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ExpenseSummary {
    pub total: Money,
    pub fixed: Money,
    pub variable: Money,
    pub personal: Money,
}

/// Sums expenses into the total and exactly one type bucket each.
///
/// An expense with no recognized type counts toward the total only. Canceled
/// expenses are expected to be filtered out by the query.
pub fn summarize_expenses(records: &[ExpenseInput], period: Option<&DateRange>) -> ExpenseSummary {
    let mut summary = ExpenseSummary::default();

    for record in in_period(records, period, |r| r.date) {
        summary.total += record.amount;

        match record.category_type {
            Some(ExpenseCategoryType::Fixed) => summary.fixed += record.amount,
            Some(ExpenseCategoryType::Variable) => summary.variable += record.amount,
            Some(ExpenseCategoryType::Personal) => summary.personal += record.amount,
            None => {}
        }
    }

    summary
}

/// Monthly result: revenue minus expenses. Negative means a loss.
pub fn monthly_result(revenue: &RevenueSummary, expenses: &ExpenseSummary) -> Money {
    revenue.total - expenses.total
}

// =============================================================================
// Owner Compensation
// =============================================================================

/// Yearly owner compensation figures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CompensationTotal {
    pub total: Money,
    pub count: usize,
}

/// Totals the compensation records of a year.
pub fn summarize_compensation(records: &[OwnerCompensation]) -> CompensationTotal {
    CompensationTotal {
        total: records.iter().map(OwnerCompensation::amount).sum(),
        count: records.len(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::period::month_bounds;
    use chrono::Utc;

    fn expense(cents: i64, kind: Option<ExpenseCategoryType>) -> ExpenseInput {
        ExpenseInput {
            amount: Money::from_centavos(cents),
            category_type: kind,
            date: None,
        }
    }

    #[test]
    fn test_empty_input_is_all_zero() {
        assert_eq!(summarize_expenses(&[], None), ExpenseSummary::default());
    }

    #[test]
    fn test_type_buckets_are_exclusive() {
        let records = vec![
            expense(300000, Some(ExpenseCategoryType::Fixed)),
            expense(45000, Some(ExpenseCategoryType::Variable)),
            expense(12000, Some(ExpenseCategoryType::Personal)),
            expense(500, None),
        ];

        let summary = summarize_expenses(&records, None);
        assert_eq!(summary.total.centavos(), 357500);
        assert_eq!(summary.fixed.centavos(), 300000);
        assert_eq!(summary.variable.centavos(), 45000);
        assert_eq!(summary.personal.centavos(), 12000);
        assert_eq!(
            summary.total,
            summary.fixed + summary.variable + summary.personal + Money::from_centavos(500)
        );
    }

    #[test]
    fn test_period_filter() {
        let mut inside = expense(1000, Some(ExpenseCategoryType::Fixed));
        inside.date = NaiveDate::from_ymd_opt(2024, 4, 30);
        let mut outside = expense(2000, Some(ExpenseCategoryType::Fixed));
        outside.date = NaiveDate::from_ymd_opt(2024, 5, 1);

        let april = month_bounds(2024, 4).unwrap();
        let summary = summarize_expenses(&[inside, outside], Some(&april));
        assert_eq!(summary.total.centavos(), 1000);
    }

    #[test]
    fn test_monthly_result_can_be_negative() {
        let revenue = RevenueSummary {
            total: Money::from_centavos(10000),
            ..RevenueSummary::default()
        };
        let expenses = ExpenseSummary {
            total: Money::from_centavos(15000),
            ..ExpenseSummary::default()
        };

        assert_eq!(monthly_result(&revenue, &expenses).centavos(), -5000);
    }

    #[test]
    fn test_summarize_compensation() {
        let record = |cents: i64, competency: &str| OwnerCompensation {
            id: competency.to_string(),
            competency: competency.to_string(),
            amount_cents: cents,
            payment_date: None,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let totals = summarize_compensation(&[record(800000, "2024-01"), record(850000, "2024-02")]);
        assert_eq!(totals.total.centavos(), 1650000);
        assert_eq!(totals.count, 2);
        assert_eq!(summarize_compensation(&[]), CompensationTotal::default());
    }
}
