//! Domain models for a single maintenance receipt.
//!
//! A [`ReceiptDraft`] is the editable form state; a [`ReceiptInput`] is the
//! record frozen at the moment of a successful submit.

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// The six fields of a receipt form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    /// Receipt date.
    Date,
    /// Resident name.
    ResidentName,
    /// Flat / unit number.
    UnitNumber,
    /// Billing period label ("January 2025").
    BillingPeriod,
    /// Previous balance, free text.
    PreviousBalance,
    /// Amount paid, free text.
    AmountPaid,
}

impl Field {
    /// All fields in form order.
    pub const ALL: [Self; 6] = [
        Self::Date,
        Self::ResidentName,
        Self::UnitNumber,
        Self::BillingPeriod,
        Self::PreviousBalance,
        Self::AmountPaid,
    ];

    /// Stable machine key, identical to the draft's struct field name.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::ResidentName => "resident_name",
            Self::UnitNumber => "unit_number",
            Self::BillingPeriod => "billing_period",
            Self::PreviousBalance => "previous_balance",
            Self::AmountPaid => "amount_paid",
        }
    }

    /// Label shown next to the input.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Date => "Date",
            Self::ResidentName => "Name",
            Self::UnitNumber => "Flat No.",
            Self::BillingPeriod => "Month",
            Self::PreviousBalance => "Previous Balance",
            Self::AmountPaid => "Amount Paid",
        }
    }

    /// Example value shown as the input placeholder.
    #[must_use]
    pub const fn placeholder(self) -> &'static str {
        match self {
            Self::Date => "YYYY-MM-DD",
            Self::ResidentName => "John Doe",
            Self::UnitNumber => "A-101",
            Self::BillingPeriod => "January 2025",
            Self::PreviousBalance => "Rs. 5000",
            Self::AmountPaid => "Rs. 2500",
        }
    }

    /// Look up a field by its machine key.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.key() == key)
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Editable form state for one receipt.
///
/// Numeric fields are kept as text: the gate only checks that
/// they are non-empty, and the formatter neutralizes anything unparsable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ReceiptDraft {
    #[validate(required(message = "Please select a date."))]
    pub date: Option<NaiveDate>,

    #[validate(length(min = 2, message = "Name must be at least 2 characters."))]
    pub resident_name: String,

    #[validate(length(min = 1, message = "Flat number is required."))]
    pub unit_number: String,

    #[validate(length(min = 1, message = "Month is required."))]
    pub billing_period: String,

    #[validate(length(min = 1, message = "Balance is required."))]
    pub previous_balance: String,

    #[validate(length(min = 1, message = "Amount is required."))]
    pub amount_paid: String,
}

impl Default for ReceiptDraft {
    fn default() -> Self {
        Self::dated(Some(Local::now().date_naive()))
    }
}

impl ReceiptDraft {
    /// Empty draft with the given date.
    #[must_use]
    pub const fn dated(date: Option<NaiveDate>) -> Self {
        Self {
            date,
            resident_name: String::new(),
            unit_number: String::new(),
            billing_period: String::new(),
            previous_balance: String::new(),
            amount_paid: String::new(),
        }
    }

    /// Current text of a field (dates as `YYYY-MM-DD`, empty when unset).
    #[must_use]
    pub fn text(&self, field: Field) -> String {
        match field {
            Field::Date => self
                .date
                .map_or_else(String::new, |d| d.format("%Y-%m-%d").to_string()),
            Field::ResidentName => self.resident_name.clone(),
            Field::UnitNumber => self.unit_number.clone(),
            Field::BillingPeriod => self.billing_period.clone(),
            Field::PreviousBalance => self.previous_balance.clone(),
            Field::AmountPaid => self.amount_paid.clone(),
        }
    }

    /// Freeze the draft into a record. Callers are expected to have validated first.
    #[must_use]
    pub fn freeze(&self) -> ReceiptInput {
        ReceiptInput {
            date: self.date,
            resident_name: self.resident_name.clone(),
            unit_number: self.unit_number.clone(),
            billing_period: self.billing_period.clone(),
            previous_balance: self.previous_balance.clone(),
            amount_paid: self.amount_paid.clone(),
        }
    }
}

/// A submitted receipt record. Has no identity beyond the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptInput {
    pub date: Option<NaiveDate>,
    pub resident_name: String,
    pub unit_number: String,
    pub billing_period: String,
    pub previous_balance: String,
    pub amount_paid: String,
}

impl ReceiptInput {
    /// Output filename for the exported PDF: `receipt_{unit}_{period}.pdf`,
    /// whitespace runs collapsed to `_`, lowercased. Path separators and other
    /// characters not allowed in file names become `_`, so the result is
    /// always a single path component.
    #[must_use]
    pub fn pdf_filename(&self) -> String {
        let raw = format!("receipt_{}_{}.pdf", self.unit_number, self.billing_period);
        collapse_whitespace(&raw, "_")
            .to_lowercase()
            .chars()
            .map(|c| if is_reserved_in_file_name(c) { '_' } else { c })
            .collect()
    }

    /// Caption attached to a shared receipt.
    #[must_use]
    pub fn share_caption(&self) -> String {
        format!(
            "Maintenance Receipt for Flat {} - {}",
            self.unit_number, self.billing_period
        )
    }
}

fn is_reserved_in_file_name(c: char) -> bool {
    matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|') || c.is_control()
}

/// Replace every run of whitespace with `sep`.
fn collapse_whitespace(s: &str, sep: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_run = false;
    for c in s.chars() {
        if c.is_whitespace() {
            if !in_run {
                out.push_str(sep);
                in_run = true;
            }
        } else {
            out.push(c);
            in_run = false;
        }
    }
    out
}

/// Which tab of the tool is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    /// Editing the form.
    #[default]
    Form,
    /// Looking at the rendered receipt.
    Preview,
}

impl std::fmt::Display for Tab {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Form => write!(f, "Form"),
            Self::Preview => write!(f, "Preview"),
        }
    }
}
