//! Application layer - the receipt pipeline.
//!
//! Form validation, formatting, preview rendering, the session state machine
//! and export orchestration.

pub mod exporter;
pub mod formatter;
pub mod preview;
pub mod session;
pub mod validation;

pub use exporter::{ExportOutcome, ExportPorts, ExportSettings, Exporter};
pub use formatter::{format_date_long, OutputFormat};
pub use preview::{format_preview_json, format_preview_table, format_preview_text};
pub use session::{ReceiptForm, Session};
pub use validation::ValidationReport;
