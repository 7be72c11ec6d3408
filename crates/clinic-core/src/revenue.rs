//! # Revenue Aggregation
//!
//! Summarizes procedure records into the monthly revenue dashboard figures.
//!
//! ## Bucketing
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  For every record in the period:                                        │
//! │                                                                         │
//! │    total += amount                       (always)                       │
//! │                                                                         │
//! │    payment category ──┬── imediato  → immediate                         │
//! │                       ├── cartao    → card                              │
//! │                       ├── convenio  → insurance                         │
//! │                       └── missing   → (total only)                      │
//! │                                                                         │
//! │    status ────────────┬── recebido  → collected                         │
//! │                       ├── pendente  → pending                           │
//! │                       └── other     → (total only)                      │
//! │                                                                         │
//! │  Canceled procedures are filtered out by the query, not here.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use ts_rs::TS;

use crate::money::Money;
use crate::period::{DateRange, YearMonth};
use crate::types::{CollectionStatus, PaymentCategory, PendingReceivable, Procedure};

// =============================================================================
// Inputs & Outputs
// =============================================================================

/// One procedure record as seen by the revenue aggregation.
///
/// Category and status are optional: a record whose joined payment method is
/// missing, or whose stored value is unrecognized, still counts toward the
/// total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueInput {
    pub amount: Money,
    pub status: Option<CollectionStatus>,
    pub payment_category: Option<PaymentCategory>,
    /// Service date. Only consulted when a period filter is given.
    pub date: Option<NaiveDate>,
}

/// Monthly revenue figures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RevenueSummary {
    pub total: Money,
    pub immediate: Money,
    pub card: Money,
    pub insurance: Money,
    pub collected: Money,
    pub pending: Money,
    pub count: usize,
}

/// Returns the records a period filter admits.
///
/// Without a period every record passes. With one, records lacking a date are
/// left out since they cannot be placed in it.
pub(crate) fn in_period<'a, T>(
    records: &'a [T],
    period: Option<&'a DateRange>,
    date_of: impl Fn(&T) -> Option<NaiveDate> + 'a,
) -> impl Iterator<Item = &'a T> + 'a {
    records.iter().filter(move |record| match period {
        None => true,
        Some(range) => date_of(record).is_some_and(|date| range.contains(date)),
    })
}

// =============================================================================
// Summary
// =============================================================================

/// Builds the revenue summary in a single pass.
///
/// Never fails and never mutates its input; calling it twice on the same input
/// yields identical output.
///
/// ## Example
/// ```rust
/// use clinic_core::money::Money;
/// use clinic_core::revenue::{summarize_revenue, RevenueInput};
/// use clinic_core::types::{CollectionStatus, PaymentCategory};
///
/// let records = vec![RevenueInput {
///     amount: Money::from_centavos(25000),
///     status: Some(CollectionStatus::Collected),
///     payment_category: Some(PaymentCategory::Immediate),
///     date: None,
/// }];
///
/// let summary = summarize_revenue(&records, None);
/// assert_eq!(summary.total, Money::from_centavos(25000));
/// assert_eq!(summary.immediate, summary.collected);
/// assert_eq!(summary.count, 1);
/// ```
pub fn summarize_revenue(records: &[RevenueInput], period: Option<&DateRange>) -> RevenueSummary {
    let mut summary = RevenueSummary::default();

    for record in in_period(records, period, |r| r.date) {
        summary.total += record.amount;
        summary.count += 1;

        match record.payment_category {
            Some(PaymentCategory::Immediate) => summary.immediate += record.amount,
            Some(PaymentCategory::Card) => summary.card += record.amount,
            Some(PaymentCategory::Insurance) => summary.insurance += record.amount,
            None => {}
        }

        match record.status {
            Some(CollectionStatus::Collected) => summary.collected += record.amount,
            Some(CollectionStatus::Pending) => summary.pending += record.amount,
            Some(CollectionStatus::Canceled) | None => {}
        }
    }

    summary
}

// =============================================================================
// Receivables
// =============================================================================

/// Headline figures of the receivables screen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReceivablesTotal {
    pub total: Money,
    pub count: usize,
}

/// Totals the pending receivables.
pub fn summarize_pending_receivables(receivables: &[PendingReceivable]) -> ReceivablesTotal {
    ReceivablesTotal {
        total: receivables.iter().map(PendingReceivable::amount).sum(),
        count: receivables.len(),
    }
}

/// Pending receivables of one payment method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReceivableGroup {
    pub payment_method: String,
    pub items: Vec<PendingReceivable>,
    pub total: Money,
}

/// Groups receivables by payment method display name.
///
/// Groups appear in the order their method is first seen; items keep their
/// input order inside each group.
pub fn group_receivables_by_method(receivables: &[PendingReceivable]) -> Vec<ReceivableGroup> {
    let mut groups: Vec<ReceivableGroup> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for receivable in receivables {
        let slot = *index
            .entry(receivable.payment_method.as_str())
            .or_insert_with(|| {
                groups.push(ReceivableGroup {
                    payment_method: receivable.payment_method.clone(),
                    items: Vec::new(),
                    total: Money::zero(),
                });
                groups.len() - 1
            });

        let group = &mut groups[slot];
        group.total += receivable.amount();
        group.items.push(receivable.clone());
    }

    groups
}

// =============================================================================
// Monthly Series
// =============================================================================

/// Revenue of one month, for the evolution chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MonthlyRevenuePoint {
    pub period: YearMonth,
    pub total: Money,
    pub immediate: Money,
    pub card: Money,
    pub insurance: Money,
}

/// Buckets records by service month, oldest first.
///
/// Records without a date cannot be placed on the chart and are skipped.
pub fn monthly_revenue_series(records: &[RevenueInput]) -> Vec<MonthlyRevenuePoint> {
    let mut months: BTreeMap<YearMonth, MonthlyRevenuePoint> = BTreeMap::new();

    for record in records {
        let Some(date) = record.date else {
            continue;
        };
        let period = YearMonth::of(date);
        let point = months.entry(period).or_insert_with(|| MonthlyRevenuePoint {
            period,
            total: Money::zero(),
            immediate: Money::zero(),
            card: Money::zero(),
            insurance: Money::zero(),
        });

        point.total += record.amount;
        match record.payment_category {
            Some(PaymentCategory::Immediate) => point.immediate += record.amount,
            Some(PaymentCategory::Card) => point.card += record.amount,
            Some(PaymentCategory::Insurance) => point.insurance += record.amount,
            None => {}
        }
    }

    months.into_values().collect()
}

// =============================================================================
// Patient History
// =============================================================================

/// Headline figures of a patient's history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PatientHistorySummary {
    /// Sum over every procedure of the patient, whatever its status.
    pub total: Money,
    pub count: usize,
    #[ts(as = "Option<String>")]
    pub last_visit: Option<NaiveDate>,
}

/// Summarizes a patient's procedures.
pub fn summarize_patient_history(procedures: &[Procedure]) -> PatientHistorySummary {
    PatientHistorySummary {
        total: procedures.iter().map(Procedure::amount).sum(),
        count: procedures.len(),
        last_visit: procedures.iter().map(|p| p.service_date).max(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
