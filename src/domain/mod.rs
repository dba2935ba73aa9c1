//! Domain layer - core types for a receipt session.
//!
//! This layer contains pure domain models, configuration and error types
//! without any IO.

pub mod config;
pub mod error;
pub mod receipt;

pub use config::{AppConfig, CurrencyConfig, Grouping};
pub use error::{AppError, ExportError, ExportResult, Result};
pub use receipt::{Field, ReceiptDraft, ReceiptInput, Tab};
