//! # Procedure Ranking
//!
//! Groups procedures by procedure-type name and ranks them by revenue.
//!
//! ## Algorithm
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  records ──► skip if name missing or empty                              │
//! │                 │                                                       │
//! │                 ▼                                                       │
//! │          first time seen?  ── yes ──► push {category, 1, amount}        │
//! │                 │ no                                                    │
//! │                 ▼                                                       │
//! │          count += 1, total += amount                                    │
//! │                 │                                                       │
//! │                 ▼                                                       │
//! │   average_ticket = total / count                                        │
//! │   stable sort by total DESC (ties keep first-seen order)                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use ts_rs::TS;

use crate::money::Money;
use crate::period::DateRange;
use crate::revenue::in_period;
use crate::types::ProcedureCategory;

/// One procedure record with its resolved procedure type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingInput {
    pub amount: Money,
    /// Procedure-type name; records without one (or with an empty one) are skipped.
    pub procedure_name: Option<String>,
    pub category: Option<ProcedureCategory>,
    pub date: Option<NaiveDate>,
}

/// Aggregated performance of one procedure type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RankingEntry {
    pub name: String,
    /// Category of the first record seen for this name.
    pub category: Option<ProcedureCategory>,
    pub count: u32,
    pub total: Money,
    /// `total / count`, in centavos.
    pub average_ticket_cents: f64,
}

impl RankingEntry {
    /// Average ticket rounded to the nearest centavo.
    pub fn average_ticket(&self) -> Money {
        Money::from_centavos(self.average_ticket_cents.round() as i64)
    }
}

/// Ranks procedure types by total revenue, highest first.
///
/// ## Example
/// ```rust
/// use clinic_core::money::Money;
/// use clinic_core::ranking::{rank_procedures, RankingInput};
///
/// let record = |name: &str, cents: i64| RankingInput {
///     amount: Money::from_centavos(cents),
///     procedure_name: Some(name.to_string()),
///     category: None,
///     date: None,
/// };
///
/// let ranking = rank_procedures(&[record("Exame", 5000), record("Consulta", 20000)], None);
/// assert_eq!(ranking[0].name, "Consulta");
/// ```
pub fn rank_procedures(records: &[RankingInput], period: Option<&DateRange>) -> Vec<RankingEntry> {
    let mut entries: Vec<RankingEntry> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for record in in_period(records, period, |r| r.date) {
        let Some(name) = record.procedure_name.as_deref().filter(|n| !n.is_empty()) else {
            continue;
        };

        match index.get(name).copied() {
            Some(slot) => {
                let entry = &mut entries[slot];
                entry.count += 1;
                entry.total += record.amount;
            }
            None => {
                index.insert(name, entries.len());
                entries.push(RankingEntry {
                    name: name.to_string(),
                    category: record.category,
                    count: 1,
                    total: record.amount,
                    average_ticket_cents: 0.0,
                });
            }
        }
    }

    for entry in &mut entries {
        entry.average_ticket_cents = entry.total.centavos() as f64 / f64::from(entry.count);
    }

    // Vec::sort_by is stable
    entries.sort_by(|a, b| b.total.cmp(&a.total));
    entries
}

/// Keeps the first `n` entries of a ranking (the pie chart shows five).
pub fn top_n(entries: &[RankingEntry], n: usize) -> Vec<RankingEntry> {
    entries.iter().take(n).cloned().collect()
}

/// Sums across a whole ranking.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RankingTotals {
    pub count: u32,
    pub total: Money,
}

impl RankingTotals {
    /// Totals a ranking.
    pub fn of(entries: &[RankingEntry]) -> Self {
        RankingTotals {
            count: entries.iter().map(|e| e.count).sum(),
            total: entries.iter().map(|e| e.total).sum(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: Option<&str>, cents: i64, category: ProcedureCategory) -> RankingInput {
        RankingInput {
            amount: Money::from_centavos(cents),
            procedure_name: name.map(str::to_string),
            category: Some(category),
            date: None,
        }
    }

    fn names(entries: &[RankingEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn test_empty_input() {
        assert!(rank_procedures(&[], None).is_empty());
    }

    #[test]
    fn test_orders_by_total_not_count_or_average() {
        use ProcedureCategory::*;
        let records = vec![
            record(Some("A"), 10000, Consultation),
            record(Some("B"), 10000, Exam),
            record(Some("C"), 5000, Exam),
            record(Some("A"), 10000, Consultation),
            record(Some("C"), 5000, Exam),
            record(Some("C"), 5000, Exam),
        ];

        let ranking = rank_procedures(&records, None);
        assert_eq!(names(&ranking), vec!["A", "C", "B"]);
        assert_eq!(ranking[0].total.centavos(), 20000);
        assert_eq!(ranking[1].count, 3);
        assert_eq!(ranking[2].count, 1);
    }

    #[test]
    fn test_ties_keep_first_seen_order() {
        let records = vec![
            record(Some("Retorno"), 5000, ProcedureCategory::Consultation),
            record(Some("Ultrassom"), 5000, ProcedureCategory::Exam),
            record(Some("Consulta"), 9000, ProcedureCategory::Consultation),
        ];

        let ranking = rank_procedures(&records, None);
        assert_eq!(names(&ranking), vec!["Consulta", "Retorno", "Ultrassom"]);
    }

    #[test]
    fn test_skips_records_without_name() {
        let records = vec![
            record(Some("Consulta"), 20000, ProcedureCategory::Consultation),
            record(None, 99999, ProcedureCategory::Exam),
            record(Some(""), 88888, ProcedureCategory::Exam),
            record(Some("Consulta"), 10000, ProcedureCategory::Consultation),
        ];

        let ranking = rank_procedures(&records, None);
        assert_eq!(ranking.len(), 1);
        assert_eq!(ranking[0].count, 2);
        assert_eq!(ranking[0].total.centavos(), 30000);
    }

    #[test]
    fn test_average_ticket() {
        let records = vec![
            record(Some("Exame"), 100, ProcedureCategory::Exam),
            record(Some("Exame"), 100, ProcedureCategory::Exam),
            record(Some("Exame"), 101, ProcedureCategory::Exam),
        ];

        let ranking = rank_procedures(&records, None);
        let entry = &ranking[0];
        let expected = entry.total.centavos() as f64 / f64::from(entry.count);
        assert!((entry.average_ticket_cents - expected).abs() < 1e-9);
        assert_eq!(entry.average_ticket().centavos(), 100);
    }

    #[test]
    fn test_category_comes_from_first_record() {
        let records = vec![
            record(Some("Avaliação"), 100, ProcedureCategory::Exam),
            record(Some("Avaliação"), 100, ProcedureCategory::Consultation),
        ];

        let ranking = rank_procedures(&records, None);
        assert_eq!(ranking[0].category, Some(ProcedureCategory::Exam));
    }

    #[test]
    fn test_idempotent() {
        let records = vec![
            record(Some("A"), 300, ProcedureCategory::Exam),
            record(Some("B"), 300, ProcedureCategory::Exam),
        ];
        assert_eq!(rank_procedures(&records, None), rank_procedures(&records, None));
    }

    #[test]
    fn test_top_n_and_totals() {
        let records: Vec<RankingInput> = (1..=7)
            .map(|i| record(Some(&format!("P{}", i)), i * 1000, ProcedureCategory::Exam))
            .collect();

        let ranking = rank_procedures(&records, None);
        let top = top_n(&ranking, 5);
        assert_eq!(top.len(), 5);
        assert_eq!(top[0].name, "P7");

        let totals = RankingTotals::of(&ranking);
        assert_eq!(totals.count, 7);
        assert_eq!(totals.total.centavos(), 28000);
    }
}
