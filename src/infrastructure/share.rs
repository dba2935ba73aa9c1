//! Share collaborators for the command line.
//!
//! The outbox directory plays the part of a native share sheet: a configured,
//! existing directory receives the image plus a caption file. Without one the
//! probe reports no file-sharing support and the exporter falls back to
//! printing the messaging link.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use colored::Colorize;

use crate::application::exporter::{LinkOpener, SharePayload, ShareTarget};
use crate::domain::{ExportError, ExportResult};

/// Share target that drops payloads into a directory.
#[derive(Debug, Clone, Default)]
pub struct OutboxShareTarget {
    outbox: Option<PathBuf>,
}

impl OutboxShareTarget {
    #[must_use]
    pub const fn new(outbox: Option<PathBuf>) -> Self {
        Self { outbox }
    }

    fn caption_path(image: &Path) -> PathBuf {
        image.with_extension("txt")
    }
}

#[async_trait]
impl ShareTarget for OutboxShareTarget {
    fn can_share(&self, payload: &SharePayload) -> bool {
        let supported = self.outbox.as_deref().is_some_and(Path::is_dir)
            && payload.mime_type.starts_with("image/")
            && !payload.bytes.is_empty();
        tracing::debug!(supported, "Share capability probe");
        supported
    }

    async fn share(&self, payload: &SharePayload) -> ExportResult<()> {
        let Some(outbox) = &self.outbox else {
            return Err(ExportError::Share {
                message: "No outbox configured".into(),
            });
        };

        let image_path = outbox.join(&payload.file_name);
        tokio::fs::write(&image_path, &payload.bytes)
            .await
            .map_err(|e| ExportError::io(format!("Failed to write {}", image_path.display()), e))?;

        let caption_path = Self::caption_path(&image_path);
        tokio::fs::write(&caption_path, format!("{}\n{}\n", payload.title, payload.text))
            .await
            .map_err(|e| ExportError::io(format!("Failed to write {}", caption_path.display()), e))?;

        tracing::info!(path = %image_path.display(), "Receipt placed in share outbox");
        Ok(())
    }
}

/// Prints links instead of launching a browser.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleLinkOpener;

impl LinkOpener for ConsoleLinkOpener {
    fn open(&self, url: &str) -> ExportResult<()> {
        println!("{} {}", "🔗 Open:".bold(), url.underline());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    fn payload() -> SharePayload {
        SharePayload {
            file_name: "receipt.png".into(),
            mime_type: "image/png".into(),
            bytes: vec![1, 2, 3],
            title: "Maintenance Receipt".into(),
            text: "Maintenance Receipt for Flat A-101 - January 2025".into(),
        }
    }

    #[test]
    fn test_probe_requires_existing_outbox() {
        let dir = tempdir().unwrap();
        assert!(!OutboxShareTarget::new(None).can_share(&payload()));
        assert!(!OutboxShareTarget::new(Some(dir.path().join("nope"))).can_share(&payload()));
        assert!(OutboxShareTarget::new(Some(dir.path().to_path_buf())).can_share(&payload()));
    }

    #[test]
    fn test_probe_rejects_empty_payload() {
        let dir = tempdir().unwrap();
        let mut empty = payload();
        empty.bytes.clear();
        assert!(!OutboxShareTarget::new(Some(dir.path().to_path_buf())).can_share(&empty));
    }

    #[tokio::test]
    async fn test_share_writes_image_and_caption() {
        let dir = tempdir().unwrap();
        let target = OutboxShareTarget::new(Some(dir.path().to_path_buf()));

        target.share(&payload()).await.unwrap();

        assert_eq!(std::fs::read(dir.path().join("receipt.png")).unwrap(), vec![1, 2, 3]);
        let caption = std::fs::read_to_string(dir.path().join("receipt.txt")).unwrap();
        assert!(caption.contains("Flat A-101 - January 2025"));
    }

    #[tokio::test]
    async fn test_share_without_outbox_fails() {
        let err = OutboxShareTarget::new(None).share(&payload()).await.unwrap_err();
        assert!(matches!(err, ExportError::Share { .. }));
    }
}
