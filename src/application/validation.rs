//! Form validation gate.
//!
//! Wraps the `validator` derive rules on [`ReceiptDraft`] into a flat,
//! per-field report that the UI layer renders next to each input.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use validator::Validate;

use crate::domain::{Field, ReceiptDraft};

/// Result of validating a draft.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// True when every field satisfies its constraint.
    pub valid: bool,
    /// First failing message per field.
    pub errors: BTreeMap<Field, String>,
}

impl ValidationReport {
    /// Message for a single field, if it failed.
    #[must_use]
    pub fn error(&self, field: Field) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    /// Restrict the report to the given fields (used to hide errors on
    /// untouched inputs). `valid` still describes the whole draft.
    #[must_use]
    pub fn visible(&self, touched: &BTreeSet<Field>) -> Self {
        Self {
            valid: self.valid,
            errors: self
                .errors
                .iter()
                .filter(|(f, _)| touched.contains(f))
                .map(|(f, m)| (*f, m.clone()))
                .collect(),
        }
    }
}

/// Validate every field of the draft.
#[must_use]
pub fn validate(draft: &ReceiptDraft) -> ValidationReport {
    let Err(errs) = draft.validate() else {
        return ValidationReport {
            valid: true,
            errors: BTreeMap::new(),
        };
    };

    let mut errors = BTreeMap::new();
    for (key, list) in errs.field_errors() {
        let Some(field) = Field::from_key(&key) else {
            tracing::warn!(field = %key, "Validation error for unknown field");
            continue;
        };
        let message = list
            .first()
            .and_then(|e| e.message.as_ref())
            .map_or_else(|| format!("{field} is invalid."), ToString::to_string);
        errors.insert(field, message);
    }

    ValidationReport {
        valid: errors.is_empty(),
        errors,
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn filled() -> ReceiptDraft {
        ReceiptDraft {
            date: NaiveDate::from_ymd_opt(2025, 3, 5),
            resident_name: "Ali Raza".into(),
            unit_number: "A-101".into(),
            billing_period: "January 2025".into(),
            previous_balance: "5000".into(),
            amount_paid: "2500".into(),
        }
    }

    #[test]
    fn test_filled_draft_is_valid() {
        let report = validate(&filled());
        assert!(report.valid);
        assert!(report.errors.is_empty());
    }

    #[test]
    fn test_empty_draft_reports_every_field() {
        let report = validate(&ReceiptDraft::dated(None));
        assert!(!report.valid);
        assert_eq!(report.errors.len(), 6);
        assert_eq!(report.error(Field::Date), Some("Please select a date."));
        assert_eq!(
            report.error(Field::ResidentName),
            Some("Name must be at least 2 characters.")
        );
        assert_eq!(report.error(Field::UnitNumber), Some("Flat number is required."));
        assert_eq!(report.error(Field::BillingPeriod), Some("Month is required."));
        assert_eq!(report.error(Field::PreviousBalance), Some("Balance is required."));
        assert_eq!(report.error(Field::AmountPaid), Some("Amount is required."));
    }

    #[test]
    fn test_single_character_name_fails() {
        let mut draft = filled();
        draft.resident_name = "A".into();
        let report = validate(&draft);
        assert!(!report.valid);
        assert_eq!(report.errors.len(), 1);
        assert!(report.error(Field::ResidentName).is_some());
    }

    #[test]
    fn test_non_numeric_amounts_pass_the_gate() {
        let mut draft = filled();
        draft.previous_balance = "abc".into();
        draft.amount_paid = "n/a".into();
        assert!(validate(&draft).valid);
    }

    #[test]
    fn test_visible_hides_untouched_fields() {
        let report = validate(&ReceiptDraft::dated(None));
        let touched = BTreeSet::from([Field::UnitNumber]);
        let visible = report.visible(&touched);
        assert!(!visible.valid);
        assert_eq!(visible.errors.len(), 1);
        assert!(visible.error(Field::UnitNumber).is_some());
    }
}
