//! # Join Normalization
//!
//! The hosted backend returns a joined sub-record either as a single object,
//! as a one-element array, or as `null`, depending on how the relation was
//! inferred. Everything is normalized here, at the boundary, so aggregation
//! only ever sees `Option<T>`.
//!
//! ## Shapes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  "forma_pagamento": { "tipo": "cartao" }      ──► Some(cartao)          │
//! │  "forma_pagamento": [ { "tipo": "cartao" } ]  ──► Some(cartao)          │
//! │  "forma_pagamento": []                        ──► None                  │
//! │  "forma_pagamento": null   / missing          ──► None                  │
//! │  "tipo": "boleto"          (unknown value)    ──► None                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::CoreResult;
use crate::expenses::ExpenseInput;
use crate::money::Money;
use crate::period::ISO_DATE_FORMAT;
use crate::ranking::RankingInput;
use crate::revenue::RevenueInput;
use crate::types::{CollectionStatus, ExpenseCategoryType, PaymentCategory, ProcedureCategory};

/// A joined relation in either of its wire shapes.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Joined<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> Joined<T> {
    /// The single related record; for a collection, its first element.
    pub fn into_single(self) -> Option<T> {
        match self {
            Joined::One(value) => Some(value),
            Joined::Many(values) => values.into_iter().next(),
        }
    }
}

/// Flattens an optional join into an optional record.
pub fn single<T>(joined: Option<Joined<T>>) -> Option<T> {
    joined.and_then(Joined::into_single)
}

fn lenient_date(value: Option<&str>) -> Option<NaiveDate> {
    value.and_then(|v| NaiveDate::parse_from_str(v.get(..10).unwrap_or(v), ISO_DATE_FORMAT).ok())
}

// =============================================================================
// Raw Rows
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
struct PaymentMethodRef {
    tipo: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ExpenseCategoryRef {
    tipo: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ProcedureTypeRef {
    nome: Option<String>,
    categoria: Option<String>,
}

/// Procedure row of the monthly revenue query.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRevenueRow {
    #[serde(default)]
    valor: f64,
    status: Option<String>,
    data_atendimento: Option<String>,
    forma_pagamento: Option<Joined<PaymentMethodRef>>,
}

impl From<RawRevenueRow> for RevenueInput {
    fn from(row: RawRevenueRow) -> Self {
        RevenueInput {
            amount: Money::from_reais(row.valor),
            status: row.status.as_deref().and_then(CollectionStatus::from_stored),
            payment_category: single(row.forma_pagamento)
                .and_then(|m| m.tipo)
                .as_deref()
                .and_then(PaymentCategory::from_stored),
            date: lenient_date(row.data_atendimento.as_deref()),
        }
    }
}

/// Expense row of the monthly expense query.
#[derive(Debug, Clone, Deserialize)]
pub struct RawExpenseRow {
    #[serde(default)]
    valor: f64,
    data_despesa: Option<String>,
    categoria: Option<Joined<ExpenseCategoryRef>>,
}

impl From<RawExpenseRow> for ExpenseInput {
    fn from(row: RawExpenseRow) -> Self {
        ExpenseInput {
            amount: Money::from_reais(row.valor),
            category_type: single(row.categoria)
                .and_then(|c| c.tipo)
                .as_deref()
                .and_then(ExpenseCategoryType::from_stored),
            date: lenient_date(row.data_despesa.as_deref()),
        }
    }
}

/// Procedure row of the ranking query.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRankingRow {
    #[serde(default)]
    valor: f64,
    data_atendimento: Option<String>,
    tipo_procedimento: Option<Joined<ProcedureTypeRef>>,
}

impl From<RawRankingRow> for RankingInput {
    fn from(row: RawRankingRow) -> Self {
        let procedure_type = single(row.tipo_procedimento);
        let (name, category) = match procedure_type {
            Some(t) => (
                t.nome.filter(|n| !n.is_empty()),
                t.categoria.as_deref().and_then(ProcedureCategory::from_stored),
            ),
            None => (None, None),
        };

        RankingInput {
            amount: Money::from_reais(row.valor),
            procedure_name: name,
            category,
            date: lenient_date(row.data_atendimento.as_deref()),
        }
    }
}

/// Decodes a backend JSON array into normalized aggregation inputs.
///
/// Only a payload that is not a JSON array fails. A row that does not match
/// the raw shape is skipped, like any other malformed record.
///
/// ## Example
/// ```rust
/// use clinic_core::join::{normalize_rows, RawRevenueRow};
/// use clinic_core::revenue::RevenueInput;
///
/// let json = r#"[
///     {"valor": 250.0, "status": "recebido", "forma_pagamento": {"tipo": "imediato"}},
///     {"valor": 100.0, "status": "pendente", "forma_pagamento": [{"tipo": "cartao"}]}
/// ]"#;
/// let rows: Vec<RevenueInput> = normalize_rows::<RawRevenueRow, _>(json).unwrap();
/// assert_eq!(rows.len(), 2);
/// ```
pub fn normalize_rows<R, T>(json: &str) -> CoreResult<Vec<T>>
where
    R: DeserializeOwned + Into<T>,
{
    let values: Vec<serde_json::Value> = serde_json::from_str(json)?;

    Ok(values
        .into_iter()
        .filter_map(|value| serde_json::from_value::<R>(value).ok())
        .map(Into::into)
        .collect())
}

// =============================================================================
// Unit Tests
// =============================================================================
