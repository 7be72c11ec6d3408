//! # Write Forms
//!
//! Inputs for creating and editing records, with their validation and sparse
//! patch semantics.
//!
//! ## Sparse Patches
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  stored:  { amount: 250,00  notes: "retorno"  date: 2024-03-01 }        │
//! │  patch:   { amount: Some(300,00)  notes: None  date: None }             │
//! │                              │                                          │
//! │                              ▼   apply()                                │
//! │  result:  { amount: 300,00  notes: "retorno"  date: 2024-03-01 }        │
//! │                                                                         │
//! │  `None` leaves the stored value untouched. Optional columns use a       │
//! │  nested Option: Some(None) clears them. In JSON a missing key is None   │
//! │  and an explicit null is Some(None).                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_with::rust::double_option;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{
    CollectionStatus, Expense, ExpenseStatus, OwnerCompensation, Procedure, ProcedureCategory,
    ProcedureType,
};
use crate::validation::{
    validate_amount_cents, validate_collection_window, validate_competency, validate_notes,
    validate_required_name, ValidationResult,
};

// =============================================================================
// Procedures
// =============================================================================

/// A new procedure, as submitted by the procedure form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewProcedure {
    /// Existing patient. When absent, `patient_name` creates one.
    pub patient_id: Option<String>,
    pub patient_name: Option<String>,
    pub procedure_type_id: String,
    pub payment_method_id: String,
    #[ts(as = "String")]
    pub service_date: NaiveDate,
    pub amount: Money,
    #[ts(as = "Option<String>")]
    pub expected_collection_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl NewProcedure {
    /// Validates and normalizes the form.
    pub fn validate(mut self) -> CoreResult<Self> {
        let has_patient = self.patient_id.as_deref().is_some_and(|id| !id.trim().is_empty());
        if has_patient {
            self.patient_name = None;
        } else {
            let name = self.patient_name.as_deref().unwrap_or_default();
            if name.trim().is_empty() {
                return Err(CoreError::IncompleteDraft {
                    field: "patient".to_string(),
                });
            }
            self.patient_id = None;
            self.patient_name = Some(validate_required_name("patient_name", name)?);
        }

        if self.procedure_type_id.trim().is_empty() {
            return Err(CoreError::IncompleteDraft {
                field: "procedure type".to_string(),
            });
        }
        if self.payment_method_id.trim().is_empty() {
            return Err(CoreError::IncompleteDraft {
                field: "payment method".to_string(),
            });
        }

        validate_amount_cents("amount", self.amount.centavos())?;
        validate_collection_window(self.service_date, self.expected_collection_date)?;
        self.notes = validate_notes(self.notes.as_deref())?;

        Ok(self)
    }
}

/// Sparse edit of a procedure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProcedurePatch {
    pub amount: Option<Money>,
    #[ts(as = "Option<String>")]
    pub service_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    #[ts(as = "Option<Option<String>>")]
    pub expected_collection_date: Option<Option<NaiveDate>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub notes: Option<Option<String>>,
    pub status: Option<CollectionStatus>,
}

impl ProcedurePatch {
    /// True when the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self == &ProcedurePatch::default()
    }
}

impl Procedure {
    /// Applies a sparse patch and re-validates the result.
    ///
    /// Timestamps are left to the storage layer.
    pub fn apply(&mut self, patch: &ProcedurePatch) -> ValidationResult<()> {
        if let Some(amount) = patch.amount {
            validate_amount_cents("amount", amount.centavos())?;
            self.amount_cents = amount.centavos();
        }
        if let Some(date) = patch.service_date {
            self.service_date = date;
        }
        if let Some(expected) = patch.expected_collection_date {
            self.expected_collection_date = expected;
        }
        if let Some(notes) = &patch.notes {
            self.notes = validate_notes(notes.as_deref())?;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }

        validate_collection_window(self.service_date, self.expected_collection_date)
    }
}

/// Filters of the procedure list screen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProcedureFilter {
    #[ts(as = "Option<String>")]
    pub start_date: Option<NaiveDate>,
    #[ts(as = "Option<String>")]
    pub end_date: Option<NaiveDate>,
    /// Case-insensitive substring of the patient name.
    pub patient_name: Option<String>,
    pub procedure_type_id: Option<String>,
    /// `None` means every status.
    pub status: Option<CollectionStatus>,
}

// =============================================================================
// Expenses
// =============================================================================

/// A new expense.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewExpense {
    pub category_id: String,
    pub description: String,
    pub amount: Money,
    #[ts(as = "String")]
    pub expense_date: NaiveDate,
    pub payment_method: Option<String>,
    pub recurring: bool,
    pub notes: Option<String>,
}

impl NewExpense {
    /// Validates and normalizes the form.
    pub fn validate(mut self) -> ValidationResult<Self> {
        if self.category_id.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "category".to_string(),
            });
        }
        self.description = validate_required_name("description", &self.description)?;
        validate_amount_cents("amount", self.amount.centavos())?;
        self.notes = validate_notes(self.notes.as_deref())?;
        self.payment_method = self
            .payment_method
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty());
        Ok(self)
    }
}

/// Sparse edit of an expense.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ExpensePatch {
    pub category_id: Option<String>,
    pub description: Option<String>,
    pub amount: Option<Money>,
    #[ts(as = "Option<String>")]
    pub expense_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub payment_method: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub notes: Option<Option<String>>,
    pub status: Option<ExpenseStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    #[ts(as = "Option<Option<String>>")]
    pub payment_date: Option<Option<NaiveDate>>,
}

impl Expense {
    /// Applies a sparse patch, validating each changed field.
    pub fn apply(&mut self, patch: &ExpensePatch) -> ValidationResult<()> {
        if let Some(category_id) = &patch.category_id {
            if category_id.trim().is_empty() {
                return Err(ValidationError::Required {
                    field: "category".to_string(),
                });
            }
            self.category_id = category_id.clone();
        }
        if let Some(description) = &patch.description {
            self.description = validate_required_name("description", description)?;
        }
        if let Some(amount) = patch.amount {
            validate_amount_cents("amount", amount.centavos())?;
            self.amount_cents = amount.centavos();
        }
        if let Some(date) = patch.expense_date {
            self.expense_date = date;
        }
        if let Some(method) = &patch.payment_method {
            self.payment_method = method.clone();
        }
        if let Some(notes) = &patch.notes {
            self.notes = validate_notes(notes.as_deref())?;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(payment_date) = patch.payment_date {
            self.payment_date = payment_date;
        }
        Ok(())
    }
}

// =============================================================================
// Owner Compensation
// =============================================================================

/// A new owner compensation record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewCompensation {
    /// `YYYY-MM`.
    pub competency: String,
    pub amount: Money,
    #[ts(as = "Option<String>")]
    pub payment_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl NewCompensation {
    /// Validates and normalizes the form.
    pub fn validate(mut self) -> ValidationResult<Self> {
        self.competency = validate_competency(&self.competency)?.to_string();
        validate_amount_cents("amount", self.amount.centavos())?;
        self.notes = validate_notes(self.notes.as_deref())?;
        Ok(self)
    }
}

/// Sparse edit of a compensation record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CompensationPatch {
    pub competency: Option<String>,
    pub amount: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    #[ts(as = "Option<Option<String>>")]
    pub payment_date: Option<Option<NaiveDate>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub notes: Option<Option<String>>,
}

impl OwnerCompensation {
    /// Applies a sparse patch, validating each changed field.
    pub fn apply(&mut self, patch: &CompensationPatch) -> ValidationResult<()> {
        if let Some(competency) = &patch.competency {
            self.competency = validate_competency(competency)?.to_string();
        }
        if let Some(amount) = patch.amount {
            validate_amount_cents("amount", amount.centavos())?;
            self.amount_cents = amount.centavos();
        }
        if let Some(payment_date) = patch.payment_date {
            self.payment_date = payment_date;
        }
        if let Some(notes) = &patch.notes {
            self.notes = validate_notes(notes.as_deref())?;
        }
        Ok(())
    }
}

// =============================================================================
// Procedure Types
// =============================================================================

/// A new entry in the procedure catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProcedureTypeForm {
    pub name: String,
    pub category: ProcedureCategory,
    pub default_amount: Option<Money>,
    pub description: Option<String>,
}

impl ProcedureTypeForm {
    /// Validates and normalizes the form.
    pub fn validate(mut self) -> ValidationResult<Self> {
        self.name = validate_required_name("name", &self.name)?;
        if let Some(amount) = self.default_amount {
            validate_amount_cents("default_amount", amount.centavos())?;
        }
        self.description = validate_notes(self.description.as_deref())?;
        Ok(self)
    }
}

/// Sparse edit of a procedure type. `active` allows reactivation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProcedureTypePatch {
    pub name: Option<String>,
    pub category: Option<ProcedureCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub default_amount: Option<Option<Money>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub description: Option<Option<String>>,
    pub active: Option<bool>,
}

impl ProcedureType {
    /// Applies a sparse patch, validating each changed field.
    pub fn apply(&mut self, patch: &ProcedureTypePatch) -> ValidationResult<()> {
        if let Some(name) = &patch.name {
            self.name = validate_required_name("name", name)?;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(amount) = patch.default_amount {
            if let Some(amount) = amount {
                validate_amount_cents("default_amount", amount.centavos())?;
            }
            self.default_amount_cents = amount.map(|a| a.centavos());
        }
        if let Some(description) = &patch.description {
            self.description = validate_notes(description.as_deref())?;
        }
        if let Some(active) = patch.active {
            self.active = active;
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn new_procedure() -> NewProcedure {
        NewProcedure {
            patient_id: Some("p-1".to_string()),
            patient_name: Some("ignored".to_string()),
            procedure_type_id: "t-1".to_string(),
            payment_method_id: "m-1".to_string(),
            service_date: date(2024, 3, 10),
            amount: Money::from_centavos(25000),
            expected_collection_date: Some(date(2024, 4, 9)),
            notes: Some("  ".to_string()),
        }
    }

    fn procedure() -> Procedure {
        Procedure {
            id: "a-1".to_string(),
            patient_id: "p-1".to_string(),
            procedure_type_id: "t-1".to_string(),
            payment_method_id: "m-1".to_string(),
            service_date: date(2024, 3, 10),
            amount_cents: 25000,
            status: CollectionStatus::Pending,
            expected_collection_date: Some(date(2024, 4, 9)),
            collection_date: None,
            notes: Some("retorno".to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_new_procedure_prefers_existing_patient() {
        let form = new_procedure().validate().unwrap();
        assert_eq!(form.patient_id.as_deref(), Some("p-1"));
        assert_eq!(form.patient_name, None);
        assert_eq!(form.notes, None);
    }

    #[test]
    fn test_new_procedure_with_new_patient_name() {
        let mut form = new_procedure();
        form.patient_id = Some(String::new());
        form.patient_name = Some(" Ana Souza ".to_string());

        let form = form.validate().unwrap();
        assert_eq!(form.patient_id, None);
        assert_eq!(form.patient_name.as_deref(), Some("Ana Souza"));
    }

    #[test]
    fn test_new_procedure_requires_patient_and_selections() {
        let mut form = new_procedure();
        form.patient_id = None;
        form.patient_name = None;
        assert!(matches!(form.validate(), Err(CoreError::IncompleteDraft { .. })));

        let mut form = new_procedure();
        form.payment_method_id = String::new();
        assert!(matches!(form.validate(), Err(CoreError::IncompleteDraft { .. })));
    }

    #[test]
    fn test_new_procedure_rejects_collection_before_service() {
        let mut form = new_procedure();
        form.expected_collection_date = Some(date(2024, 3, 9));
        assert!(matches!(
            form.validate(),
            Err(CoreError::Validation(ValidationError::CollectionBeforeService { .. }))
        ));
    }

    #[test]
    fn test_procedure_patch_is_sparse() {
        let mut stored = procedure();
        let patch = ProcedurePatch {
            amount: Some(Money::from_centavos(30000)),
            ..ProcedurePatch::default()
        };

        stored.apply(&patch).unwrap();
        assert_eq!(stored.amount_cents, 30000);
        assert_eq!(stored.notes.as_deref(), Some("retorno"));
        assert_eq!(stored.service_date, date(2024, 3, 10));
        assert_eq!(stored.expected_collection_date, Some(date(2024, 4, 9)));
        assert!(ProcedurePatch::default().is_empty());
        assert!(!patch.is_empty());
    }

    #[test]
    fn test_procedure_patch_clears_and_validates() {
        let mut stored = procedure();
        let patch = ProcedurePatch {
            expected_collection_date: Some(None),
            notes: Some(None),
            ..ProcedurePatch::default()
        };
        stored.apply(&patch).unwrap();
        assert_eq!(stored.expected_collection_date, None);
        assert_eq!(stored.notes, None);

        let mut stored = procedure();
        let patch = ProcedurePatch {
            service_date: Some(date(2024, 5, 1)),
            ..ProcedurePatch::default()
        };
        assert!(stored.apply(&patch).is_err());
    }

    #[test]
    fn test_new_expense_validation() {
        let form = NewExpense {
            category_id: "c-1".to_string(),
            description: " Aluguel ".to_string(),
            amount: Money::from_centavos(300000),
            expense_date: date(2024, 3, 5),
            payment_method: Some(" ".to_string()),
            recurring: true,
            notes: None,
        };

        let form = form.validate().unwrap();
        assert_eq!(form.description, "Aluguel");
        assert_eq!(form.payment_method, None);

        let bad = NewExpense {
            amount: Money::from_centavos(-1),
            ..form
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_compensation_validation_and_patch() {
        let form = NewCompensation {
            competency: "2024-03".to_string(),
            amount: Money::from_centavos(800000),
            payment_date: None,
            notes: None,
        };
        assert!(form.clone().validate().is_ok());

        let bad = NewCompensation {
            competency: "03/2024".to_string(),
            ..form
        };
        assert!(bad.validate().is_err());

        let mut stored = OwnerCompensation {
            id: "pl-1".to_string(),
            competency: "2024-03".to_string(),
            amount_cents: 800000,
            payment_date: None,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        stored
            .apply(&CompensationPatch {
                payment_date: Some(Some(date(2024, 4, 5))),
                ..CompensationPatch::default()
            })
            .unwrap();
        assert_eq!(stored.payment_date, Some(date(2024, 4, 5)));
        assert_eq!(stored.amount_cents, 800000);
    }

    #[test]
    fn test_procedure_type_patch() {
        let mut stored = ProcedureType {
            id: "t-1".to_string(),
            name: "Consulta".to_string(),
            category: ProcedureCategory::Consultation,
            default_amount_cents: Some(25000),
            description: None,
            active: true,
            created_at: Utc::now(),
        };

        stored
            .apply(&ProcedureTypePatch {
                default_amount: Some(None),
                ..ProcedureTypePatch::default()
            })
            .unwrap();
        assert_eq!(stored.default_amount_cents, None);
        assert_eq!(stored.name, "Consulta");

        let err = stored.apply(&ProcedureTypePatch {
            name: Some(" ".to_string()),
            ..ProcedureTypePatch::default()
        });
        assert!(err.is_err());
    }

    #[test]
    fn test_patch_json_null_clears_field() {
        let patch: ProcedurePatch =
            serde_json::from_str(r#"{"expected_collection_date": null, "notes": null}"#).unwrap();
        assert_eq!(patch.expected_collection_date, Some(None));
        assert_eq!(patch.notes, Some(None));
        assert!(!patch.is_empty());

        let mut stored = procedure();
        stored.apply(&patch).unwrap();
        assert_eq!(stored.expected_collection_date, None);
        assert_eq!(stored.notes, None);
    }

    #[test]
    fn test_patch_json_missing_key_leaves_field() {
        let patch: ProcedurePatch = serde_json::from_str(r#"{"status": "recebido"}"#).unwrap();
        assert_eq!(patch.expected_collection_date, None);
        assert_eq!(patch.notes, None);

        let patch: ExpensePatch =
            serde_json::from_str(r#"{"payment_method": null, "payment_date": "2024-03-15"}"#)
                .unwrap();
        assert_eq!(patch.payment_method, Some(None));
        assert_eq!(patch.payment_date, Some(Some(date(2024, 3, 15))));
        assert_eq!(patch.notes, None);
    }

    #[test]
    fn test_patch_json_serializes_clear_as_null() {
        let patch = CompensationPatch {
            notes: Some(None),
            ..CompensationPatch::default()
        };
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json["notes"], serde_json::Value::Null);
        assert!(json.get("payment_date").is_none());

        let back: CompensationPatch = serde_json::from_value(json).unwrap();
        assert_eq!(back, patch);

        let patch: ProcedureTypePatch =
            serde_json::from_str(r#"{"default_amount": null, "description": null}"#).unwrap();
        assert_eq!(patch.default_amount, Some(None));
        assert_eq!(patch.description, Some(None));
    }
}
