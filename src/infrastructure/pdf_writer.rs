//! Single-page PDF writer.
//!
//! Builds the page directly with `lopdf`: a white fill over the whole page and
//! the receipt bitmap embedded as a DeviceRGB image XObject.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

use crate::application::exporter::{Bitmap, DocumentWriter, Orientation, PageGeometry};
use crate::domain::{ExportError, ExportResult};

const POINTS_PER_MM: f32 = 72.0 / 25.4;
const IMAGE_NAME: &str = "Im0";

/// Image rectangle in PDF user space (points, origin bottom-left).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub page_width: f32,
    pub page_height: f32,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Placement {
    /// Convert millimetre geometry (origin top-left) to PDF points.
    #[must_use]
    pub fn from_geometry(g: &PageGeometry) -> Self {
        let (page_width, page_height) = match g.orientation {
            Orientation::Portrait => (g.page_width, g.page_height),
        };
        let page_height = page_height * POINTS_PER_MM;
        Self {
            page_width: page_width * POINTS_PER_MM,
            page_height,
            x: g.image_x * POINTS_PER_MM,
            y: page_height - (g.image_y + g.image_height) * POINTS_PER_MM,
            width: g.image_width * POINTS_PER_MM,
            height: g.image_height * POINTS_PER_MM,
        }
    }
}

/// Writes the receipt bitmap onto an A4 page.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfWriter;

impl DocumentWriter for PdfWriter {
    fn write(&self, bitmap: &Bitmap, geometry: &PageGeometry, path: &Path) -> ExportResult<()> {
        let mut doc = build_document(bitmap, geometry)?;

        let file = File::create(path)
            .map_err(|e| ExportError::io(format!("Failed to create {}", path.display()), e))?;
        let mut writer = BufWriter::new(file);
        doc.save_to(&mut writer).map_err(document_error)?;
        writer
            .flush()
            .map_err(|e| ExportError::io(format!("Failed to write {}", path.display()), e))?;

        tracing::debug!(path = %path.display(), "PDF written");
        Ok(())
    }
}

fn document_error(e: impl std::fmt::Display) -> ExportError {
    ExportError::Document {
        message: e.to_string(),
    }
}

/// Assemble the one-page document.
///
/// # Errors
/// Returns error if the page content cannot be encoded.
pub fn build_document(bitmap: &Bitmap, geometry: &PageGeometry) -> ExportResult<Document> {
    let place = Placement::from_geometry(geometry);
    let (width, height) = bitmap.dimensions();

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut image = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => i64::from(width),
            "Height" => i64::from(height),
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8_i64,
        },
        bitmap.as_raw().clone(),
    );
    if let Err(e) = image.compress() {
        tracing::debug!(error = %e, "Image stream left uncompressed");
    }
    let image_id = doc.add_object(image);

    let real = Object::Real;
    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new("rg", vec![real(1.0), real(1.0), real(1.0)]),
            Operation::new(
                "re",
                vec![real(0.0), real(0.0), real(place.page_width), real(place.page_height)],
            ),
            Operation::new("f", vec![]),
            Operation::new("Q", vec![]),
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    real(place.width),
                    real(0.0),
                    real(0.0),
                    real(place.height),
                    real(place.x),
                    real(place.y),
                ],
            ),
            Operation::new("Do", vec![Object::Name(IMAGE_NAME.as_bytes().to_vec())]),
            Operation::new("Q", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(
        dictionary! {},
        content.encode().map_err(document_error)?,
    ));

    let resources_id = doc.add_object(dictionary! {
        "XObject" => dictionary! { IMAGE_NAME => image_id },
    });

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => resources_id,
        "MediaBox" => vec![real(0.0), real(0.0), real(place.page_width), real(place.page_height)],
    });

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1_i64,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    Ok(doc)
}

#[cfg(test)]
mod tests {
    use image::{Rgb, RgbImage};
    use tempfile::tempdir;

    use super::*;

    fn bitmap() -> Bitmap {
        RgbImage::from_pixel(200, 160, Rgb([255, 255, 255]))
    }

    #[test]
    fn test_placement_is_centred_ten_mm_from_top() {
        let g = PageGeometry::a4_for(200, 160);
        let p = Placement::from_geometry(&g);

        assert!((p.page_width - 595.28).abs() < 0.01);
        assert!((p.page_height - 841.89).abs() < 0.01);
        assert!((p.x - 28.346).abs() < 0.01);
        assert!((p.width - 538.58).abs() < 0.01);
        // 190 mm wide at 5:4 -> 152 mm tall, top edge 10 mm below the page top.
        assert!((p.height - 152.0 * POINTS_PER_MM).abs() < 0.01);
        assert!((p.y + p.height - (297.0 - 10.0) * POINTS_PER_MM).abs() < 0.01);
    }

    #[test]
    fn test_written_pdf_has_one_page() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("receipt.pdf");

        PdfWriter
            .write(&bitmap(), &PageGeometry::a4_for(200, 160), &path)
            .unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));

        let doc = Document::load(&path).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn test_write_to_missing_directory_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("receipt.pdf");
        let err = PdfWriter
            .write(&bitmap(), &PageGeometry::a4_for(200, 160), &path)
            .unwrap_err();
        assert!(matches!(err, ExportError::Io { .. }));
    }
}
