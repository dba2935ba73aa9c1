//! Receipt session: form state plus the `Form` / `Preview` tab machine.
//!
//! `submit` moves `Form → Preview` only when validation passes; `edit` moves
//! `Preview → Form` unconditionally. At most one receipt exists at a time.

use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::domain::{AppConfig, Field, ReceiptDraft, ReceiptInput, Tab};

use super::preview::{render_preview, PreviewSurface, ReceiptPreview};
use super::validation::{validate, ValidationReport};

/// Editable form with touched-field tracking.
#[derive(Debug, Clone)]
pub struct ReceiptForm {
    draft: ReceiptDraft,
    touched: BTreeSet<Field>,
    report: ValidationReport,
}

impl Default for ReceiptForm {
    fn default() -> Self {
        Self::new(ReceiptDraft::default())
    }
}

impl ReceiptForm {
    /// Wrap an existing draft. Nothing is touched yet.
    #[must_use]
    pub fn new(draft: ReceiptDraft) -> Self {
        let report = validate(&draft);
        Self {
            draft,
            touched: BTreeSet::new(),
            report,
        }
    }

    /// Current draft values.
    #[must_use]
    pub const fn draft(&self) -> &ReceiptDraft {
        &self.draft
    }

    /// Set a field from text. Dates are `YYYY-MM-DD`; empty or unparsable
    /// date text clears the date. Marks the field touched and re-validates.
    pub fn set_field(&mut self, field: Field, value: &str) {
        let value = value.trim_end_matches(['\r', '\n']);
        match field {
            Field::Date => {
                self.draft.date = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok();
            }
            Field::ResidentName => self.draft.resident_name = value.to_string(),
            Field::UnitNumber => self.draft.unit_number = value.to_string(),
            Field::BillingPeriod => self.draft.billing_period = value.to_string(),
            Field::PreviousBalance => self.draft.previous_balance = value.to_string(),
            Field::AmountPaid => self.draft.amount_paid = value.to_string(),
        }
        self.touched.insert(field);
        self.report = validate(&self.draft);
        tracing::trace!(field = field.key(), valid = self.report.valid, "Field updated");
    }

    /// Set the date directly.
    pub fn set_date(&mut self, date: Option<NaiveDate>) {
        self.draft.date = date;
        self.touched.insert(Field::Date);
        self.report = validate(&self.draft);
    }

    /// Errors for touched fields only.
    #[must_use]
    pub fn errors(&self) -> ValidationReport {
        self.report.visible(&self.touched)
    }

    /// Validate every field. On success returns the frozen record.
    ///
    /// # Errors
    /// Returns the full report when any field fails; the draft is untouched.
    pub fn submit(&mut self) -> Result<ReceiptInput, ValidationReport> {
        self.touched.extend(Field::ALL);
        self.report = validate(&self.draft);
        if self.report.valid {
            Ok(self.draft.freeze())
        } else {
            Err(self.report.clone())
        }
    }
}

/// One receipt session.
#[derive(Debug)]
pub struct Session {
    config: AppConfig,
    form: ReceiptForm,
    tab: Tab,
    record: Option<ReceiptInput>,
    preview: Option<ReceiptPreview>,
    surface: Option<PreviewSurface>,
}

impl Session {
    /// New session with an empty draft dated today.
    #[must_use]
    pub fn new(config: AppConfig) -> Self {
        Self::with_form(config, ReceiptForm::default())
    }

    /// New session around an existing form.
    #[must_use]
    pub const fn with_form(config: AppConfig, form: ReceiptForm) -> Self {
        Self {
            config,
            form,
            tab: Tab::Form,
            record: None,
            preview: None,
            surface: None,
        }
    }

    #[must_use]
    pub const fn tab(&self) -> Tab {
        self.tab
    }

    /// Mutable form access. Only meaningful while on the `Form` tab.
    pub fn form_mut(&mut self) -> &mut ReceiptForm {
        &mut self.form
    }

    /// The record frozen by the last successful submit.
    #[must_use]
    pub const fn record(&self) -> Option<&ReceiptInput> {
        self.record.as_ref()
    }

    #[must_use]
    pub const fn preview(&self) -> Option<&ReceiptPreview> {
        self.preview.as_ref()
    }

    /// The rendered page, present only while on the `Preview` tab.
    #[must_use]
    pub const fn surface(&self) -> Option<&PreviewSurface> {
        self.surface.as_ref()
    }

    /// `Form → Preview`, guarded by validation.
    ///
    /// # Errors
    /// Returns the validation report; tab and record stay as they were.
    pub fn submit(&mut self) -> Result<&ReceiptPreview, ValidationReport> {
        let record = match self.form.submit() {
            Ok(record) => record,
            Err(report) => {
                tracing::debug!(errors = report.errors.len(), "Submit rejected");
                return Err(report);
            }
        };

        tracing::info!(unit = %record.unit_number, period = %record.billing_period, "Receipt submitted");
        self.record = Some(record);
        self.tab = Tab::Preview;
        Ok(self.render())
    }

    /// Render the preview again. Each render draws a new receipt number.
    pub fn rerender(&mut self) -> Option<&ReceiptPreview> {
        if self.tab == Tab::Preview && self.record.is_some() {
            Some(self.render())
        } else {
            None
        }
    }

    fn render(&mut self) -> &ReceiptPreview {
        let record = self.record.clone().unwrap_or_else(|| self.form.draft().freeze());
        let preview = render_preview(&record, &self.config);
        self.surface = Some(preview.layout());
        self.preview.insert(preview)
    }

    /// `Preview → Form`. Discards the frozen record and the rendered page;
    /// the draft keeps its values for editing.
    pub fn edit(&mut self) {
        self.tab = Tab::Form;
        self.record = None;
        self.preview = None;
        self.surface = None;
    }
}
