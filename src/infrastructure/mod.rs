//! Infrastructure layer - adapters for the export collaborators and config files.
//!
//! This layer handles all I/O operations and external dependencies.

pub mod config;
pub mod notifier;
pub mod pdf_writer;
pub mod rasterizer;
pub mod share;

pub use config::{config_file_path, ensure_config_exists, load_config, save_config};
pub use notifier::ConsoleNotifier;
pub use pdf_writer::PdfWriter;
pub use rasterizer::BitmapRasterizer;
pub use share::{ConsoleLinkOpener, OutboxShareTarget};
