//! # Receivable Projection
//!
//! Decides when a procedure's payment is expected to arrive, and models the
//! procedure form that applies the rule as the user edits it.
//!
//! ## Rule
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  category == imediato          → no expected date                       │
//! │  days_until_collection == 0    → no expected date                       │
//! │  otherwise                     → service_date + days_until_collection   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Draft Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  select_payment_method ─┐                                               │
//! │                         ├──► recompute expected date (always wins)      │
//! │  set_service_date ──────┘                                               │
//! │                                                                         │
//! │  override_expected_collection ──► manual value, kept only until the     │
//! │                                   next recompute trigger                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::forms::NewProcedure;
use crate::money::Money;
use crate::period::{project_collection_date, today};
use crate::types::{PaymentCategory, PaymentMethod, ProcedureType};

/// Expected collection date for a payment method, or `None` when the payment
/// is collected on the spot.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use clinic_core::receivable::expected_collection_date;
/// use clinic_core::types::{PaymentCategory, PaymentMethod};
///
/// let card = PaymentMethod {
///     id: "m-1".into(),
///     name: "Crédito".into(),
///     category: PaymentCategory::Card,
///     days_until_collection: 30,
///     active: true,
/// };
/// let service = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
/// assert_eq!(
///     expected_collection_date(&card, service),
///     NaiveDate::from_ymd_opt(2024, 2, 14)
/// );
/// ```
pub fn expected_collection_date(method: &PaymentMethod, service_date: NaiveDate) -> Option<NaiveDate> {
    if method.category == PaymentCategory::Immediate || method.days_until_collection == 0 {
        return None;
    }
    Some(project_collection_date(service_date, method.days_until_collection))
}

// =============================================================================
// Procedure Draft
// =============================================================================

/// State of the new-procedure form.
///
/// Owns every field the projection rule depends on, so the expected date can
/// never go stale relative to the service date or payment method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcedureDraft {
    patient_id: Option<String>,
    patient_name: Option<String>,
    procedure_type_id: Option<String>,
    payment_method: Option<PaymentMethod>,
    service_date: NaiveDate,
    amount: Money,
    expected_collection_date: Option<NaiveDate>,
    notes: Option<String>,
}

impl Default for ProcedureDraft {
    fn default() -> Self {
        ProcedureDraft::new(today())
    }
}

impl ProcedureDraft {
    /// Creates an empty draft for the given service date.
    pub fn new(service_date: NaiveDate) -> Self {
        ProcedureDraft {
            patient_id: None,
            patient_name: None,
            procedure_type_id: None,
            payment_method: None,
            service_date,
            amount: Money::zero(),
            expected_collection_date: None,
            notes: None,
        }
    }

    /// Selects an existing patient.
    pub fn select_patient(&mut self, patient_id: impl Into<String>) {
        self.patient_id = Some(patient_id.into());
        self.patient_name = None;
    }

    /// Types the name of a patient to be created on submit.
    pub fn new_patient(&mut self, name: impl Into<String>) {
        self.patient_id = None;
        self.patient_name = Some(name.into());
    }

    /// Selects the procedure type, replacing the amount with the type's default
    /// when it has one.
    pub fn select_procedure_type(&mut self, procedure_type: &ProcedureType) {
        self.procedure_type_id = Some(procedure_type.id.clone());
        if let Some(amount) = procedure_type.default_amount() {
            self.amount = amount;
        }
    }

    /// Selects the payment method and recomputes the expected collection date.
    pub fn select_payment_method(&mut self, method: PaymentMethod) {
        self.payment_method = Some(method);
        self.recompute();
    }

    /// Changes the service date and recomputes the expected collection date.
    pub fn set_service_date(&mut self, service_date: NaiveDate) {
        self.service_date = service_date;
        self.recompute();
    }

    /// Sets the amount.
    pub fn set_amount(&mut self, amount: Money) {
        self.amount = amount;
    }

    /// Sets the amount from raw form input; unparseable input becomes zero.
    pub fn set_amount_input(&mut self, input: &str) {
        self.amount = Money::parse_input(input);
    }

    /// Sets the notes.
    pub fn set_notes(&mut self, notes: impl Into<String>) {
        self.notes = Some(notes.into());
    }

    /// Manually edits the expected collection date.
    ///
    /// The next call to [`select_payment_method`](Self::select_payment_method)
    /// or [`set_service_date`](Self::set_service_date) overwrites this value.
    pub fn override_expected_collection(&mut self, date: Option<NaiveDate>) {
        self.expected_collection_date = date;
    }

    fn recompute(&mut self) {
        self.expected_collection_date = self
            .payment_method
            .as_ref()
            .and_then(|method| expected_collection_date(method, self.service_date));
    }

    pub fn service_date(&self) -> NaiveDate {
        self.service_date
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn expected_collection_date(&self) -> Option<NaiveDate> {
        self.expected_collection_date
    }

    pub fn payment_method(&self) -> Option<&PaymentMethod> {
        self.payment_method.as_ref()
    }

    /// Whether the form may be submitted: a patient (selected or named), a
    /// procedure type, a payment method and a non-zero amount.
    pub fn is_complete(&self) -> bool {
        self.missing_field().is_none()
    }

    fn missing_field(&self) -> Option<&'static str> {
        let has_patient = self.patient_id.is_some()
            || self.patient_name.as_deref().is_some_and(|n| !n.trim().is_empty());

        if !has_patient {
            Some("patient")
        } else if self.procedure_type_id.is_none() {
            Some("procedure type")
        } else if self.payment_method.is_none() {
            Some("payment method")
        } else if self.amount.is_zero() {
            Some("amount")
        } else {
            None
        }
    }

    /// Converts the draft into a validated [`NewProcedure`].
    pub fn into_new_procedure(self) -> CoreResult<NewProcedure> {
        if let Some(field) = self.missing_field() {
            return Err(CoreError::IncompleteDraft {
                field: field.to_string(),
            });
        }

        NewProcedure {
            patient_id: self.patient_id,
            patient_name: self.patient_name,
            procedure_type_id: self.procedure_type_id.unwrap_or_default(),
            payment_method_id: self.payment_method.map(|m| m.id).unwrap_or_default(),
            service_date: self.service_date,
            amount: self.amount,
            expected_collection_date: self.expected_collection_date,
            notes: self.notes,
        }
        .validate()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crate::types::ProcedureCategory;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn method(category: PaymentCategory, days: u32) -> PaymentMethod {
        PaymentMethod {
            id: format!("m-{}-{}", category.as_str(), days),
            name: category.as_str().to_string(),
            category,
            days_until_collection: days,
            active: true,
        }
    }

    fn consulta(default_cents: Option<i64>) -> ProcedureType {
        ProcedureType {
            id: "t-1".to_string(),
            name: "Consulta".to_string(),
            category: ProcedureCategory::Consultation,
            default_amount_cents: default_cents,
            description: None,
            active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_immediate_never_projects() {
        for days in [0, 1, 30, 365] {
            let pix = method(PaymentCategory::Immediate, days);
            assert_eq!(expected_collection_date(&pix, date(2024, 1, 1)), None);
        }
    }

    #[test]
    fn test_zero_days_never_projects() {
        let card = method(PaymentCategory::Card, 0);
        assert_eq!(expected_collection_date(&card, date(2024, 1, 1)), None);
    }

    #[test]
    fn test_projection_rollover() {
        let card = method(PaymentCategory::Card, 5);
        assert_eq!(
            expected_collection_date(&card, date(2024, 1, 28)),
            Some(date(2024, 2, 2))
        );

        let insurer = method(PaymentCategory::Insurance, 10);
        assert_eq!(
            expected_collection_date(&insurer, date(2024, 12, 30)),
            Some(date(2025, 1, 9))
        );
    }

    #[test]
    fn test_draft_recomputes_on_method_and_date() {
        let mut draft = ProcedureDraft::new(date(2024, 3, 1));
        draft.select_payment_method(method(PaymentCategory::Insurance, 30));
        assert_eq!(draft.expected_collection_date(), Some(date(2024, 3, 31)));

        draft.set_service_date(date(2024, 3, 10));
        assert_eq!(draft.expected_collection_date(), Some(date(2024, 4, 9)));

        draft.select_payment_method(method(PaymentCategory::Immediate, 30));
        assert_eq!(draft.expected_collection_date(), None);
    }

    #[test]
    fn test_recompute_overwrites_manual_edit() {
        let mut draft = ProcedureDraft::new(date(2024, 3, 1));
        draft.select_payment_method(method(PaymentCategory::Card, 30));
        draft.override_expected_collection(Some(date(2024, 5, 1)));
        assert_eq!(draft.expected_collection_date(), Some(date(2024, 5, 1)));

        draft.set_service_date(date(2024, 3, 2));
        assert_eq!(draft.expected_collection_date(), Some(date(2024, 4, 1)));
    }

    #[test]
    fn test_manual_edit_survives_unrelated_changes() {
        let mut draft = ProcedureDraft::new(date(2024, 3, 1));
        draft.select_payment_method(method(PaymentCategory::Card, 30));
        draft.override_expected_collection(Some(date(2024, 5, 1)));
        draft.set_amount(Money::from_centavos(100));
        draft.set_notes("sem retorno");
        assert_eq!(draft.expected_collection_date(), Some(date(2024, 5, 1)));
    }

    #[test]
    fn test_procedure_type_default_amount() {
        let mut draft = ProcedureDraft::new(date(2024, 3, 1));
        draft.set_amount_input("99,90");
        assert_eq!(draft.amount().centavos(), 9990);

        draft.select_procedure_type(&consulta(Some(25000)));
        assert_eq!(draft.amount().centavos(), 25000);

        draft.set_amount_input("300");
        draft.select_procedure_type(&consulta(None));
        assert_eq!(draft.amount().centavos(), 30000);
    }

    #[test]
    fn test_completeness_and_conversion() {
        let mut draft = ProcedureDraft::new(date(2024, 3, 1));
        assert!(!draft.is_complete());

        draft.new_patient("Ana");
        draft.select_procedure_type(&consulta(None));
        draft.select_payment_method(method(PaymentCategory::Card, 30));
        assert!(!draft.is_complete());
        assert!(matches!(
            draft.clone().into_new_procedure(),
            Err(CoreError::IncompleteDraft { ref field }) if field == "amount"
        ));

        draft.set_amount_input("abc");
        assert!(!draft.is_complete());

        draft.set_amount(Money::from_centavos(25000));
        assert!(draft.is_complete());

        let form = draft.into_new_procedure().unwrap();
        assert_eq!(form.patient_name.as_deref(), Some("Ana"));
        assert_eq!(form.procedure_type_id, "t-1");
        assert_eq!(form.payment_method_id, "m-cartao-30");
        assert_eq!(form.expected_collection_date, Some(date(2024, 3, 31)));
    }

    #[test]
    fn test_drafts_compare_by_selected_method() {
        let mut card = ProcedureDraft::new(date(2024, 3, 1));
        card.select_payment_method(method(PaymentCategory::Card, 30));
        assert_eq!(card.clone(), card);

        let mut insurance = card.clone();
        insurance.select_payment_method(method(PaymentCategory::Insurance, 30));
        assert_ne!(insurance, card);
    }
}
