//! # Domain Types
//!
//! Core domain types read by the computational core.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   Procedure     │   │  PaymentMethod  │   │  ProcedureType  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  patient_id     │──►│  category       │   │  name           │       │
//! │  │  service_date   │   │  days_until_    │   │  category       │       │
//! │  │  amount_cents   │   │    collection   │   │  default_amount │       │
//! │  │  status         │   └─────────────────┘   └─────────────────┘       │
//! │  └─────────────────┘                                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Expense      │   │ ExpenseCategory │   │OwnerCompensation│       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  category_id    │──►│  kind           │   │  competency     │       │
//! │  │  amount_cents   │   │  fixa/variavel/ │   │  (YYYY-MM)      │       │
//! │  │  status         │   │  pessoal        │   │  amount_cents   │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Stored Values
//! Enum values are stored and exchanged using the backend's Portuguese strings
//! (`imediato`, `recebido`, `fixa`, ...). The Rust variants use English names.
//! Every enum offers `from_stored`, which returns `None` for an unknown string
//! instead of failing, so aggregation can skip unrecognized values.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Payment Category
// =============================================================================

/// How a payment method is collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
pub enum PaymentCategory {
    /// Cash or instant transfer (Pix). Collected the same day.
    #[serde(rename = "imediato")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "imediato"))]
    Immediate,
    /// Card payment, collected after the acquirer's settlement delay.
    #[serde(rename = "cartao")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "cartao"))]
    Card,
    /// Health insurance, collected after the insurer's payment cycle.
    #[serde(rename = "convenio")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "convenio"))]
    Insurance,
}

impl PaymentCategory {
    /// Returns the stored string value.
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentCategory::Immediate => "imediato",
            PaymentCategory::Card => "cartao",
            PaymentCategory::Insurance => "convenio",
        }
    }

    /// Parses a stored value; unknown values yield `None`.
    pub fn from_stored(value: &str) -> Option<Self> {
        match value {
            "imediato" => Some(PaymentCategory::Immediate),
            "cartao" => Some(PaymentCategory::Card),
            "convenio" => Some(PaymentCategory::Insurance),
            _ => None,
        }
    }
}

// =============================================================================
// Collection Status
// =============================================================================

/// Lifecycle of the payment expected for a procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
pub enum CollectionStatus {
    #[serde(rename = "pendente")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "pendente"))]
    Pending,
    #[serde(rename = "recebido")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "recebido"))]
    Collected,
    #[serde(rename = "cancelado")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "cancelado"))]
    Canceled,
}

impl CollectionStatus {
    /// Returns the stored string value.
    pub const fn as_str(&self) -> &'static str {
        match self {
            CollectionStatus::Pending => "pendente",
            CollectionStatus::Collected => "recebido",
            CollectionStatus::Canceled => "cancelado",
        }
    }

    /// Parses a stored value; unknown values yield `None`.
    pub fn from_stored(value: &str) -> Option<Self> {
        match value {
            "pendente" => Some(CollectionStatus::Pending),
            "recebido" => Some(CollectionStatus::Collected),
            "cancelado" => Some(CollectionStatus::Canceled),
            _ => None,
        }
    }
}

impl Default for CollectionStatus {
    fn default() -> Self {
        CollectionStatus::Pending
    }
}

// =============================================================================
// Expense Status
// =============================================================================

/// Payment status of an expense.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
pub enum ExpenseStatus {
    #[serde(rename = "pendente")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "pendente"))]
    Pending,
    #[serde(rename = "pago")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "pago"))]
    Paid,
    #[serde(rename = "cancelado")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "cancelado"))]
    Canceled,
}

impl ExpenseStatus {
    /// Returns the stored string value.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ExpenseStatus::Pending => "pendente",
            ExpenseStatus::Paid => "pago",
            ExpenseStatus::Canceled => "cancelado",
        }
    }
}

impl Default for ExpenseStatus {
    fn default() -> Self {
        ExpenseStatus::Pending
    }
}

// =============================================================================
// Expense Category Type
// =============================================================================

/// Bucket an expense category belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
pub enum ExpenseCategoryType {
    /// Rent, salaries, software subscriptions.
    #[serde(rename = "fixa")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "fixa"))]
    Fixed,
    /// Supplies, lab fees, anything that scales with volume.
    #[serde(rename = "variavel")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "variavel"))]
    Variable,
    /// Owner's personal spending paid through the clinic.
    #[serde(rename = "pessoal")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "pessoal"))]
    Personal,
}

impl ExpenseCategoryType {
    /// Returns the stored string value.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ExpenseCategoryType::Fixed => "fixa",
            ExpenseCategoryType::Variable => "variavel",
            ExpenseCategoryType::Personal => "pessoal",
        }
    }

    /// Parses a stored value; unknown values yield `None`.
    pub fn from_stored(value: &str) -> Option<Self> {
        match value {
            "fixa" => Some(ExpenseCategoryType::Fixed),
            "variavel" => Some(ExpenseCategoryType::Variable),
            "pessoal" => Some(ExpenseCategoryType::Personal),
            _ => None,
        }
    }
}

// =============================================================================
// Procedure Category
// =============================================================================

/// Kind of clinical procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
pub enum ProcedureCategory {
    #[serde(rename = "consulta")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "consulta"))]
    Consultation,
    #[serde(rename = "exame")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "exame"))]
    Exam,
}

impl ProcedureCategory {
    /// Returns the stored string value.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ProcedureCategory::Consultation => "consulta",
            ProcedureCategory::Exam => "exame",
        }
    }

    /// Parses a stored value; unknown values yield `None`.
    pub fn from_stored(value: &str) -> Option<Self> {
        match value {
            "consulta" => Some(ProcedureCategory::Consultation),
            "exame" => Some(ProcedureCategory::Exam),
            _ => None,
        }
    }
}

// =============================================================================
// Role
// =============================================================================

/// Role of a dashboard user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    Admin,
    User,
}

// =============================================================================
// Patient
// =============================================================================

/// A clinic patient. Only `id` and `name` matter to the aggregations.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Patient {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    #[ts(as = "Option<String>")]
    pub birth_date: Option<NaiveDate>,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Profile
// =============================================================================

/// Authorization profile keyed by the authenticated identity.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Profile {
    pub id: String,
    pub email: String,
    pub role: Role,
    pub name: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Procedure Type
// =============================================================================

/// A billable procedure offered by the clinic.
///
/// Deactivation is a soft delete: historical procedures keep resolving the
/// type by id after `active` flips to false.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ProcedureType {
    pub id: String,
    pub name: String,
    pub category: ProcedureCategory,
    /// Suggested amount in centavos, pre-filled on new procedures.
    pub default_amount_cents: Option<i64>,
    pub description: Option<String>,
    pub active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl ProcedureType {
    /// Returns the default amount as Money.
    #[inline]
    pub fn default_amount(&self) -> Option<Money> {
        self.default_amount_cents.map(Money::from_centavos)
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// A way patients pay: Pix, debit card, a given insurer, etc.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct PaymentMethod {
    pub id: String,
    pub name: String,
    pub category: PaymentCategory,
    /// Settlement delay. Ignored for `Immediate` methods.
    pub days_until_collection: u32,
    pub active: bool,
}

// =============================================================================
// Procedure
// =============================================================================

/// One billable clinical encounter ("atendimento").
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Procedure {
    pub id: String,
    pub patient_id: String,
    pub procedure_type_id: String,
    pub payment_method_id: String,
    #[ts(as = "String")]
    pub service_date: NaiveDate,
    pub amount_cents: i64,
    pub status: CollectionStatus,
    #[ts(as = "Option<String>")]
    pub expected_collection_date: Option<NaiveDate>,
    #[ts(as = "Option<String>")]
    pub collection_date: Option<NaiveDate>,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Procedure {
    /// Returns the amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_centavos(self.amount_cents)
    }
}

/// A procedure with its joined sub-records, each normalized to a single
/// optional value.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProcedureDetail {
    #[serde(flatten)]
    pub procedure: Procedure,
    pub patient: Option<Patient>,
    pub procedure_type: Option<ProcedureType>,
    pub payment_method: Option<PaymentMethod>,
}

/// A pending receivable as listed on the receivables screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct PendingReceivable {
    pub id: String,
    pub patient: String,
    pub procedure: String,
    pub payment_method: String,
    pub amount_cents: i64,
    #[ts(as = "String")]
    pub service_date: NaiveDate,
    #[ts(as = "String")]
    pub expected_collection_date: NaiveDate,
    pub notes: Option<String>,
}

impl PendingReceivable {
    /// Returns the amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_centavos(self.amount_cents)
    }
}

// =============================================================================
// Expense
// =============================================================================

/// An expense category.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ExpenseCategory {
    pub id: String,
    pub name: String,
    pub kind: ExpenseCategoryType,
    pub active: bool,
}

/// A clinic expense.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Expense {
    pub id: String,
    pub category_id: String,
    pub description: String,
    pub amount_cents: i64,
    #[ts(as = "String")]
    pub expense_date: NaiveDate,
    #[ts(as = "Option<String>")]
    pub payment_date: Option<NaiveDate>,
    pub recurring: bool,
    pub status: ExpenseStatus,
    /// Free-form label: pix, boleto, cartao, dinheiro.
    pub payment_method: Option<String>,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Expense {
    /// Returns the amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_centavos(self.amount_cents)
    }
}

/// An expense with its category.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ExpenseDetail {
    #[serde(flatten)]
    pub expense: Expense,
    pub category: Option<ExpenseCategory>,
}

// =============================================================================
// Owner Compensation
// =============================================================================

/// Owner compensation ("pró-labore") for one competency period.
///
/// One record per competency is the UI convention; nothing enforces it.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OwnerCompensation {
    pub id: String,
    /// Competency period, `YYYY-MM`.
    pub competency: String,
    pub amount_cents: i64,
    #[ts(as = "Option<String>")]
    pub payment_date: Option<NaiveDate>,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl OwnerCompensation {
    /// Returns the amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_centavos(self.amount_cents)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
