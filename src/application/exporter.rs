//! Receipt export: PDF download and image sharing.
//!
//! Both operations snapshot the rendered [`PreviewSurface`] through a
//! [`Rasterizer`] and hand the bitmap to the collaborator for their output.
//! Collaborator failures never escape: they are logged and surfaced as a
//! single destructive [`Notification`].

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use image::{DynamicImage, ImageOutputFormat, RgbImage};

use crate::domain::{AppConfig, ExportError, ExportResult, ReceiptInput};

use super::preview::{PreviewSurface, Rgb, WHITE};
use super::session::Session;

/// Captured bitmap of the preview surface.
pub type Bitmap = RgbImage;

/// A4 page size in millimetres.
pub const A4_WIDTH_MM: f32 = 210.0;
pub const A4_HEIGHT_MM: f32 = 297.0;
/// Width of the receipt image on the page.
pub const IMAGE_WIDTH_MM: f32 = 190.0;
/// Distance of the image from the top edge.
pub const IMAGE_TOP_MM: f32 = 10.0;

const SHARE_TITLE: &str = "Maintenance Receipt";
const SHARE_FILE_NAME: &str = "receipt.png";

/// Options passed to the rasterizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureOptions {
    /// Device pixels per CSS pixel.
    pub scale: u32,
    /// Color painted under the surface.
    pub background: Rgb,
}

/// Page orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Portrait,
}

/// Placement of the captured image on a single PDF page, in millimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub orientation: Orientation,
    pub page_width: f32,
    pub page_height: f32,
    pub image_x: f32,
    pub image_y: f32,
    pub image_width: f32,
    pub image_height: f32,
}

impl PageGeometry {
    /// A4 portrait, image 190 mm wide, centred, 10 mm from the top, aspect preserved.
    #[must_use]
    pub fn a4_for(bitmap_width: u32, bitmap_height: u32) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let image_height = if bitmap_width == 0 {
            0.0
        } else {
            bitmap_height as f32 * IMAGE_WIDTH_MM / bitmap_width as f32
        };
        Self {
            orientation: Orientation::Portrait,
            page_width: A4_WIDTH_MM,
            page_height: A4_HEIGHT_MM,
            image_x: (A4_WIDTH_MM - IMAGE_WIDTH_MM) / 2.0,
            image_y: IMAGE_TOP_MM,
            image_width: IMAGE_WIDTH_MM,
            image_height,
        }
    }
}

/// Image handed to a share target.
#[derive(Debug, Clone)]
pub struct SharePayload {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
    pub title: String,
    pub text: String,
}

/// Severity of a user notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    Default,
    Destructive,
}

/// Transient message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub variant: Variant,
}

impl Notification {
    fn info(title: &str, description: &str) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            variant: Variant::Default,
        }
    }

    fn error(description: &str) -> Self {
        Self {
            title: "Error".into(),
            description: description.into(),
            variant: Variant::Destructive,
        }
    }
}

/// Snapshots a preview surface into a bitmap.
#[async_trait]
pub trait Rasterizer: Send + Sync {
    async fn capture(
        &self,
        surface: &PreviewSurface,
        options: CaptureOptions,
    ) -> ExportResult<Bitmap>;
}

/// Writes a single-page document holding the bitmap. Called from a blocking
/// worker thread.
pub trait DocumentWriter: Send + Sync {
    fn write(&self, bitmap: &Bitmap, geometry: &PageGeometry, path: &Path) -> ExportResult<()>;
}

/// Native share target with a capability probe.
#[async_trait]
pub trait ShareTarget: Send + Sync {
    /// Whether this target can take the payload (file sharing supported).
    fn can_share(&self, payload: &SharePayload) -> bool;

    async fn share(&self, payload: &SharePayload) -> ExportResult<()>;
}

/// Opens an external link (fallback share path).
pub trait LinkOpener: Send + Sync {
    fn open(&self, url: &str) -> ExportResult<()>;
}

/// Shows notifications to the user.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Result of an export action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// No preview rendered; nothing happened.
    Skipped,
    /// PDF written to this path.
    Saved(PathBuf),
    /// Image handed to the native share target.
    Shared,
    /// Fallback link opened (image not attached).
    LinkOpened(String),
    /// A collaborator failed; the user was notified.
    Failed,
}

/// Export settings taken from configuration.
#[derive(Debug, Clone)]
pub struct ExportSettings {
    pub pdf_scale: u32,
    pub share_scale: u32,
    pub output_dir: PathBuf,
    pub fallback_url: String,
}

impl From<&AppConfig> for ExportSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            pdf_scale: config.export.pdf_scale.max(1),
            share_scale: config.export.share_scale.max(1),
            output_dir: config.output_dir(),
            fallback_url: config.share.fallback_url.clone(),
        }
    }
}

/// The collaborators an exporter drives.
pub struct ExportPorts {
    pub rasterizer: Box<dyn Rasterizer>,
    pub writer: Arc<dyn DocumentWriter>,
    pub share: Box<dyn ShareTarget>,
    pub opener: Box<dyn LinkOpener>,
    pub notifier: Box<dyn Notifier>,
}

/// Drives PDF download and sharing for a session.
pub struct Exporter {
    settings: ExportSettings,
    ports: ExportPorts,
}

impl Exporter {
    #[must_use]
    pub const fn new(settings: ExportSettings, ports: ExportPorts) -> Self {
        Self { settings, ports }
    }

    /// Export the rendered receipt as `receipt_{unit}_{period}.pdf`.
    ///
    /// No-op when nothing is rendered. Failures are reported once through
    /// the notifier and never returned as errors.
    pub async fn download_pdf(&self, session: &Session) -> ExportOutcome {
        let (Some(surface), Some(record)) = (session.surface(), session.record()) else {
            tracing::debug!("No rendered preview, skipping PDF export");
            return ExportOutcome::Skipped;
        };

        match self.write_pdf(surface, record).await {
            Ok(path) => {
                tracing::info!(path = %path.display(), "Receipt PDF saved");
                self.ports.notifier.notify(Notification::info(
                    "Success",
                    "Receipt downloaded successfully",
                ));
                ExportOutcome::Saved(path)
            }
            Err(e) => {
                tracing::error!(error = %e, "PDF export failed");
                self.ports
                    .notifier
                    .notify(Notification::error("Failed to generate PDF"));
                ExportOutcome::Failed
            }
        }
    }

    async fn write_pdf(&self, surface: &PreviewSurface, record: &ReceiptInput) -> ExportResult<PathBuf> {
        let bitmap = self
            .ports
            .rasterizer
            .capture(
                surface,
                CaptureOptions {
                    scale: self.settings.pdf_scale,
                    background: WHITE,
                },
            )
            .await?;

        let writer = Arc::clone(&self.ports.writer);
        let dir = self.settings.output_dir.clone();
        let file_name = record.pdf_filename();
        tokio::task::spawn_blocking(move || save_pdf(writer.as_ref(), &bitmap, &dir, &file_name))
            .await
            .map_err(|e| ExportError::Document {
                message: format!("PDF writer task failed: {e}"),
            })?
    }

    /// Share the rendered receipt as a PNG.
    ///
    /// Uses the native share target when its capability probe accepts the
    /// payload, otherwise opens the messaging link with the caption only.
    pub async fn share_receipt(&self, session: &Session) -> ExportOutcome {
        let (Some(surface), Some(record)) = (session.surface(), session.record()) else {
            tracing::debug!("No rendered preview, skipping share");
            return ExportOutcome::Skipped;
        };

        match self.share(surface, record).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(error = %e, "Sharing failed");
                self.ports
                    .notifier
                    .notify(Notification::error("Failed to share receipt. Please try again."));
                ExportOutcome::Failed
            }
        }
    }

    async fn share(&self, surface: &PreviewSurface, record: &ReceiptInput) -> ExportResult<ExportOutcome> {
        let bitmap = self
            .ports
            .rasterizer
            .capture(
                surface,
                CaptureOptions {
                    scale: self.settings.share_scale,
                    background: WHITE,
                },
            )
            .await?;

        let payload = SharePayload {
            file_name: SHARE_FILE_NAME.into(),
            mime_type: "image/png".into(),
            bytes: encode_png(&bitmap)?,
            title: SHARE_TITLE.into(),
            text: record.share_caption(),
        };

        if self.ports.share.can_share(&payload) {
            self.share_native(&payload).await
        } else {
            self.share_fallback(&payload)
        }
    }

    async fn share_native(&self, payload: &SharePayload) -> ExportResult<ExportOutcome> {
        self.ports.share.share(payload).await?;
        tracing::info!(bytes = payload.bytes.len(), "Receipt shared");
        self.ports.notifier.notify(Notification::info(
            "Share Initiated",
            "Choose WhatsApp from the share menu to send the receipt.",
        ));
        Ok(ExportOutcome::Shared)
    }

    fn share_fallback(&self, payload: &SharePayload) -> ExportResult<ExportOutcome> {
        let url = fallback_link(&self.settings.fallback_url, &payload.text);
        self.ports.opener.open(&url)?;
        tracing::info!(%url, "Opened share link");
        self.ports.notifier.notify(Notification::info(
            "WhatsApp Opened",
            "Please paste the receipt image manually.",
        ));
        Ok(ExportOutcome::LinkOpened(url))
    }
}

/// Write the PDF for `bitmap` to `dir/file_name`.
///
/// The document is written to a staging file beside the target and renamed,
/// so a failure leaves nothing behind.
fn save_pdf(
    writer: &dyn DocumentWriter,
    bitmap: &Bitmap,
    dir: &Path,
    file_name: &str,
) -> ExportResult<PathBuf> {
    let geometry = PageGeometry::a4_for(bitmap.width(), bitmap.height());

    std::fs::create_dir_all(dir)
        .map_err(|e| ExportError::io(format!("Failed to create directory {}", dir.display()), e))?;

    let staging = tempfile::NamedTempFile::new_in(dir)
        .map_err(|e| ExportError::io("Failed to create staging file", e))?;
    writer.write(bitmap, &geometry, staging.path())?;

    let target = dir.join(file_name);
    staging
        .persist(&target)
        .map_err(|e| ExportError::io(format!("Failed to save {}", target.display()), e.error))?;

    Ok(target)
}

/// Messaging link carrying the caption.
#[must_use]
pub fn fallback_link(base: &str, text: &str) -> String {
    format!("{base}{}", urlencoding::encode(text))
}

/// Encode a bitmap as PNG bytes.
///
/// # Errors
/// Returns error if encoding fails.
pub fn encode_png(bitmap: &Bitmap) -> ExportResult<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(bitmap.clone())
        .write_to(&mut buffer, ImageOutputFormat::Png)
        .map_err(|e| ExportError::Encode {
            message: e.to_string(),
        })?;
    Ok(buffer.into_inner())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::thread::ThreadId;

    use chrono::NaiveDate;
    use image::Rgb as Pixel;
    use tempfile::tempdir;

    use super::*;
    use crate::application::session::ReceiptForm;
    use crate::domain::{Field, ReceiptDraft};

    #[derive(Default, Clone)]
    struct Recorder {
        notifications: Arc<Mutex<Vec<Notification>>>,
        opened: Arc<Mutex<Vec<String>>>,
        shared: Arc<Mutex<Vec<SharePayload>>>,
        captures: Arc<Mutex<Vec<CaptureOptions>>>,
        writer_threads: Arc<Mutex<Vec<ThreadId>>>,
    }

    struct FakeRasterizer {
        fail: bool,
        recorder: Recorder,
    }

    #[async_trait]
    impl Rasterizer for FakeRasterizer {
        async fn capture(
            &self,
            _surface: &PreviewSurface,
            options: CaptureOptions,
        ) -> ExportResult<Bitmap> {
            self.recorder.captures.lock().unwrap().push(options);
            if self.fail {
                return Err(ExportError::Capture {
                    message: "simulated".into(),
                });
            }
            Ok(RgbImage::from_pixel(20, 10, Pixel([255, 255, 255])))
        }
    }

    struct FakeWriter {
        fail: bool,
        recorder: Recorder,
    }

    impl DocumentWriter for FakeWriter {
        fn write(&self, _bitmap: &Bitmap, geometry: &PageGeometry, path: &Path) -> ExportResult<()> {
            self.recorder
                .writer_threads
                .lock()
                .unwrap()
                .push(std::thread::current().id());
            std::fs::write(path, format!("{geometry:?}")).unwrap();
            if self.fail {
                return Err(ExportError::Document {
                    message: "simulated".into(),
                });
            }
            Ok(())
        }
    }

    struct FakeShare {
        supported: bool,
        recorder: Recorder,
    }

    #[async_trait]
    impl ShareTarget for FakeShare {
        fn can_share(&self, _payload: &SharePayload) -> bool {
            self.supported
        }

        async fn share(&self, payload: &SharePayload) -> ExportResult<()> {
            self.recorder.shared.lock().unwrap().push(payload.clone());
            Ok(())
        }
    }

    struct FakeOpener {
        recorder: Recorder,
    }

    impl LinkOpener for FakeOpener {
        fn open(&self, url: &str) -> ExportResult<()> {
            self.recorder.opened.lock().unwrap().push(url.to_string());
            Ok(())
        }
    }

    struct FakeNotifier {
        recorder: Recorder,
    }

    impl Notifier for FakeNotifier {
        fn notify(&self, notification: Notification) {
            self.recorder.notifications.lock().unwrap().push(notification);
        }
    }

    struct Setup {
        capture_fails: bool,
        write_fails: bool,
        share_supported: bool,
    }

    impl Default for Setup {
        fn default() -> Self {
            Self {
                capture_fails: false,
                write_fails: false,
                share_supported: true,
            }
        }
    }

    fn exporter(dir: &Path, setup: &Setup) -> (Exporter, Recorder) {
        let recorder = Recorder::default();
        let settings = ExportSettings {
            pdf_scale: 3,
            share_scale: 2,
            output_dir: dir.to_path_buf(),
            fallback_url: "https://wa.me/?text=".into(),
        };
        let ports = ExportPorts {
            rasterizer: Box::new(FakeRasterizer {
                fail: setup.capture_fails,
                recorder: recorder.clone(),
            }),
            writer: Arc::new(FakeWriter {
                fail: setup.write_fails,
                recorder: recorder.clone(),
            }),
            share: Box::new(FakeShare {
                supported: setup.share_supported,
                recorder: recorder.clone(),
            }),
            opener: Box::new(FakeOpener {
                recorder: recorder.clone(),
            }),
            notifier: Box::new(FakeNotifier {
                recorder: recorder.clone(),
            }),
        };
        (Exporter::new(settings, ports), recorder)
    }

    fn submitted_session() -> Session {
        session_for_unit("A-101")
    }

    fn session_for_unit(unit: &str) -> Session {
        let mut form = ReceiptForm::new(ReceiptDraft::dated(NaiveDate::from_ymd_opt(2025, 1, 31)));
        form.set_field(Field::ResidentName, "Ali Raza");
        form.set_field(Field::UnitNumber, unit);
        form.set_field(Field::BillingPeriod, "January 2025");
        form.set_field(Field::PreviousBalance, "0");
        form.set_field(Field::AmountPaid, "2500");
        let mut session = Session::with_form(AppConfig::default(), form);
        session.submit().unwrap();
        session
    }

    fn files_in(dir: &Path) -> Vec<String> {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_geometry_centres_image() {
        let g = PageGeometry::a4_for(2016, 1620);
        assert!((g.image_x - 10.0).abs() < f32::EPSILON);
        assert!((g.image_y - 10.0).abs() < f32::EPSILON);
        assert!((g.image_width - 190.0).abs() < f32::EPSILON);
        assert!((g.image_height - 152.678_57).abs() < 0.01);
        assert_eq!(g.orientation, Orientation::Portrait);
    }

    #[test]
    fn test_fallback_link_encodes_caption() {
        assert_eq!(
            fallback_link(
                "https://wa.me/?text=",
                "Maintenance Receipt for Flat A-101 - January 2025"
            ),
            "https://wa.me/?text=Maintenance%20Receipt%20for%20Flat%20A-101%20-%20January%202025"
        );
    }

    #[test]
    fn test_encode_png_signature() {
        let bytes = encode_png(&RgbImage::from_pixel(4, 4, Pixel([0, 0, 0]))).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[tokio::test]
    async fn test_download_pdf_saves_named_file() {
        let dir = tempdir().unwrap();
        let (exporter, recorder) = exporter(dir.path(), &Setup::default());

        let outcome = exporter.download_pdf(&submitted_session()).await;
        let expected = dir.path().join("receipt_a-101_january_2025.pdf");
        assert_eq!(outcome, ExportOutcome::Saved(expected.clone()));
        assert!(expected.exists());
        assert_eq!(files_in(dir.path()).len(), 1);

        let notes = recorder.notifications.lock().unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].title, "Success");
        assert_eq!(recorder.captures.lock().unwrap()[0].scale, 3);
        assert_eq!(recorder.captures.lock().unwrap()[0].background, WHITE);
    }

    #[tokio::test]
    async fn test_document_is_written_off_the_runtime_thread() {
        let dir = tempdir().unwrap();
        let (exporter, recorder) = exporter(dir.path(), &Setup::default());

        exporter.download_pdf(&submitted_session()).await;

        let threads = recorder.writer_threads.lock().unwrap();
        assert_eq!(threads.len(), 1);
        assert_ne!(threads[0], std::thread::current().id());
    }

    #[tokio::test]
    async fn test_unit_with_slash_saves_inside_output_dir() {
        let dir = tempdir().unwrap();
        let (exporter, recorder) = exporter(dir.path(), &Setup::default());

        let outcome = exporter.download_pdf(&session_for_unit("A/101")).await;
        let expected = dir.path().join("receipt_a_101_january_2025.pdf");
        assert_eq!(outcome, ExportOutcome::Saved(expected.clone()));
        assert!(expected.exists());
        assert_eq!(recorder.notifications.lock().unwrap()[0].title, "Success");
    }

    #[tokio::test]
    async fn test_traversal_in_unit_stays_inside_output_dir() {
        let root = tempdir().unwrap();
        let out = root.path().join("out");
        std::fs::create_dir_all(out.join("receipt_")).unwrap();
        let (exporter, _) = exporter(&out, &Setup::default());

        let outcome = exporter
            .download_pdf(&session_for_unit("/../../escaped"))
            .await;
        let ExportOutcome::Saved(path) = outcome else {
            panic!("expected saved, got {outcome:?}");
        };
        assert_eq!(path.parent(), Some(out.as_path()));
        assert!(path.exists());
        assert!(!root.path().join("escaped_january_2025.pdf").exists());
    }

    #[tokio::test]
    async fn test_export_without_preview_is_noop() {
        let dir = tempdir().unwrap();
        let (exporter, recorder) = exporter(dir.path(), &Setup::default());
        let session = Session::new(AppConfig::default());

        assert_eq!(exporter.download_pdf(&session).await, ExportOutcome::Skipped);
        assert_eq!(exporter.share_receipt(&session).await, ExportOutcome::Skipped);
        assert!(files_in(dir.path()).is_empty());
        assert!(recorder.notifications.lock().unwrap().is_empty());
        assert!(recorder.captures.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_export_after_edit_is_noop() {
        let dir = tempdir().unwrap();
        let (exporter, _) = exporter(dir.path(), &Setup::default());
        let mut session = submitted_session();
        session.edit();
        assert_eq!(exporter.download_pdf(&session).await, ExportOutcome::Skipped);
    }

    #[tokio::test]
    async fn test_capture_failure_notifies_once() {
        let dir = tempdir().unwrap();
        let setup = Setup {
            capture_fails: true,
            ..Setup::default()
        };
        let (exporter, recorder) = exporter(dir.path(), &setup);

        let outcome = exporter.download_pdf(&submitted_session()).await;
        assert_eq!(outcome, ExportOutcome::Failed);

        let notes = recorder.notifications.lock().unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].variant, Variant::Destructive);
        assert_eq!(notes[0].description, "Failed to generate PDF");
        assert!(files_in(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_writer_failure_leaves_no_file() {
        let dir = tempdir().unwrap();
        let setup = Setup {
            write_fails: true,
            ..Setup::default()
        };
        let (exporter, recorder) = exporter(dir.path(), &setup);

        assert_eq!(
            exporter.download_pdf(&submitted_session()).await,
            ExportOutcome::Failed
        );
        assert!(files_in(dir.path()).is_empty());
        assert_eq!(recorder.notifications.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_native_share_path() {
        let dir = tempdir().unwrap();
        let (exporter, recorder) = exporter(dir.path(), &Setup::default());

        let outcome = exporter.share_receipt(&submitted_session()).await;
        assert_eq!(outcome, ExportOutcome::Shared);

        let shared = recorder.shared.lock().unwrap();
        assert_eq!(shared.len(), 1);
        assert_eq!(shared[0].title, "Maintenance Receipt");
        assert_eq!(shared[0].file_name, "receipt.png");
        assert_eq!(
            shared[0].text,
            "Maintenance Receipt for Flat A-101 - January 2025"
        );
        assert!(recorder.opened.lock().unwrap().is_empty());
        assert_eq!(recorder.captures.lock().unwrap()[0].scale, 2);
        assert_eq!(
            recorder.notifications.lock().unwrap()[0].title,
            "Share Initiated"
        );
    }

    #[tokio::test]
    async fn test_fallback_share_path() {
        let dir = tempdir().unwrap();
        let setup = Setup {
            share_supported: false,
            ..Setup::default()
        };
        let (exporter, recorder) = exporter(dir.path(), &setup);

        let outcome = exporter.share_receipt(&submitted_session()).await;
        let ExportOutcome::LinkOpened(url) = outcome else {
            panic!("expected fallback, got {outcome:?}");
        };
        assert!(url.starts_with("https://wa.me/?text=Maintenance%20Receipt"));
        assert!(recorder.shared.lock().unwrap().is_empty());
        assert_eq!(recorder.opened.lock().unwrap().as_slice(), [url]);

        let notes = recorder.notifications.lock().unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].title, "WhatsApp Opened");
    }

    #[tokio::test]
    async fn test_share_capture_failure_notifies_once() {
        let dir = tempdir().unwrap();
        let setup = Setup {
            capture_fails: true,
            ..Setup::default()
        };
        let (exporter, recorder) = exporter(dir.path(), &setup);

        assert_eq!(
            exporter.share_receipt(&submitted_session()).await,
            ExportOutcome::Failed
        );
        let notes = recorder.notifications.lock().unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].description, "Failed to share receipt. Please try again.");
    }
}
