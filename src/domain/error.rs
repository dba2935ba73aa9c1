//! Domain-level error types for the receipt generator.
//!
//! All errors are typed with `thiserror`. Validation failures are not errors:
//! they are reported through [`crate::application::ValidationReport`].

use thiserror::Error;

/// Application-level errors raised by the ambient stack (config, IO, output).
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration or environment error.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// JSON serialization failed.
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    /// IO operation failed.
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },
}

impl AppError {
    /// Create a JSON error.
    pub fn json(err: serde_json::Error) -> Self {
        Self::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Create an IO error with context.
    pub fn io(message: impl Into<String>, err: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source: Some(err),
        }
    }
}

/// Errors raised by the export collaborators (rasterizer, document writer, share target).
///
/// These never reach the user as a failure of the session: the exporter
/// absorbs them into a single error notification.
#[derive(Error, Debug)]
pub enum ExportError {
    /// Snapshot of the preview surface failed.
    #[error("Capture failed: {message}")]
    Capture { message: String },

    /// Bitmap could not be encoded.
    #[error("Encode failed: {message}")]
    Encode { message: String },

    /// PDF document could not be assembled.
    #[error("Document error: {message}")]
    Document { message: String },

    /// Share target rejected the payload.
    #[error("Share failed: {message}")]
    Share { message: String },

    /// IO operation failed while writing output.
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },
}

impl ExportError {
    /// Create an IO export error with context.
    pub fn io(message: impl Into<String>, err: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source: Some(err),
        }
    }
}

/// Result type alias using `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Result type alias for export collaborators.
pub type ExportResult<T> = std::result::Result<T, ExportError>;
