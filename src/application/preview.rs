//! Receipt preview rendering.
//!
//! Interpolates formatted values into the fixed receipt template and lays the
//! result out as a [`PreviewSurface`], the page the exporter snapshots.

use std::path::Path;

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Table};
use rand::Rng;
use serde::Serialize;
use svg::node::element::{Line, Rectangle, Text as SvgText};
use svg::Document;

use crate::domain::{AppConfig, AppError, ReceiptInput, Result};

use super::formatter::{display_or_na, format_date, CurrencyFormatter};

/// Page width in CSS pixels.
pub const SURFACE_WIDTH: u32 = 672;
/// Page height in CSS pixels.
pub const SURFACE_HEIGHT: u32 = 540;
const PADDING: u32 = 40;
const RIGHT_EDGE: u32 = SURFACE_WIDTH - PADDING;
const SECOND_COLUMN: u32 = 356;

/// Glyph advance relative to font size, shared by layout and rasterizer.
pub const ADVANCE_RATIO: f32 = 6.0 / 9.0;

/// RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

pub const WHITE: Rgb = Rgb(255, 255, 255);
const INK: Rgb = Rgb(17, 24, 39);
const MUTED: Rgb = Rgb(107, 114, 128);
const RULE: Rgb = Rgb(229, 231, 235);
const BADGE_FILL: Rgb = Rgb(240, 253, 244);
const BADGE_INK: Rgb = Rgb(21, 128, 61);

impl Rgb {
    fn hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

/// Horizontal anchor of a text run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Align {
    Left,
    Right,
}

/// A positioned primitive on the surface. Coordinates are top-left, in CSS pixels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Element {
    Text {
        x: u32,
        y: u32,
        size: u32,
        align: Align,
        color: Rgb,
        text: String,
    },
    Rule {
        x: u32,
        y: u32,
        width: u32,
        color: Rgb,
    },
    Badge {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        fill: Rgb,
        color: Rgb,
        text: String,
    },
}

/// Estimated rendered width of a text run.
#[must_use]
pub fn text_width(text: &str, size: u32) -> f32 {
    #[allow(clippy::cast_precision_loss)]
    let chars = text.chars().count() as f32;
    #[allow(clippy::cast_precision_loss)]
    let size = size as f32;
    chars * size * ADVANCE_RATIO
}

/// A laid-out receipt page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviewSurface {
    pub width: u32,
    pub height: u32,
    pub elements: Vec<Element>,
}

impl PreviewSurface {
    /// Render the surface as an SVG document.
    #[must_use]
    pub fn to_svg(&self) -> Document {
        let mut doc = Document::new()
            .set("viewBox", (0, 0, self.width, self.height))
            .set("width", self.width)
            .set("height", self.height)
            .add(
                Rectangle::new()
                    .set("width", self.width)
                    .set("height", self.height)
                    .set("fill", WHITE.hex()),
            );

        for element in &self.elements {
            doc = match element {
                Element::Text {
                    x,
                    y,
                    size,
                    align,
                    color,
                    text,
                } => doc.add(
                    SvgText::new()
                        .set("x", *x)
                        .set("y", y + size)
                        .set("font-family", "system-ui, sans-serif")
                        .set("font-size", *size)
                        .set("fill", color.hex())
                        .set(
                            "text-anchor",
                            if *align == Align::Right { "end" } else { "start" },
                        )
                        .add(svg::node::Text::new(text.as_str())),
                ),
                Element::Rule { x, y, width, color } => doc.add(
                    Line::new()
                        .set("x1", *x)
                        .set("y1", *y)
                        .set("x2", x + width)
                        .set("y2", *y)
                        .set("stroke", color.hex())
                        .set("stroke-width", 1),
                ),
                Element::Badge {
                    x,
                    y,
                    width,
                    height,
                    fill,
                    color,
                    text,
                } => doc
                    .add(
                        Rectangle::new()
                            .set("x", *x)
                            .set("y", *y)
                            .set("width", *width)
                            .set("height", *height)
                            .set("rx", height / 2)
                            .set("fill", fill.hex()),
                    )
                    .add(
                        SvgText::new()
                            .set("x", x + width / 2)
                            .set("y", y + height / 2 + 5)
                            .set("font-family", "system-ui, sans-serif")
                            .set("font-size", 14)
                            .set("fill", color.hex())
                            .set("text-anchor", "middle")
                            .add(svg::node::Text::new(text.as_str())),
                    ),
            };
        }

        doc
    }

    /// Write the SVG rendition to a file.
    ///
    /// # Errors
    /// Returns error if the file cannot be written.
    pub fn save_svg(&self, path: &Path) -> Result<()> {
        svg::save(path, &self.to_svg())
            .map_err(|e| AppError::io(format!("Failed to write {}", path.display()), e))?;
        tracing::info!(path = %path.display(), "Preview SVG saved");
        Ok(())
    }
}

/// Organization header block.
#[derive(Debug, Clone, Serialize)]
pub struct OrganizationBlock {
    pub name: String,
    pub address: Vec<String>,
    pub contact: String,
}

/// All display strings of one rendered receipt.
#[derive(Debug, Clone, Serialize)]
pub struct ReceiptPreview {
    pub organization: OrganizationBlock,
    pub receipt_number: String,
    pub date: String,
    pub resident: String,
    pub flat_number: String,
    pub month: String,
    pub previous_balance: String,
    pub amount_paid: String,
    pub status: String,
    pub signatory: String,
}

/// Random decorative receipt number, `0000`-`9999`. Drawn fresh on every call.
#[must_use]
pub fn receipt_number() -> String {
    let n: u16 = rand::thread_rng().gen_range(0..10_000);
    format!("{n:04}")
}

/// Render the receipt for an input record.
#[must_use]
pub fn render_preview(input: &ReceiptInput, config: &AppConfig) -> ReceiptPreview {
    let currency = CurrencyFormatter::new(&config.currency);
    let org = &config.organization;

    ReceiptPreview {
        organization: OrganizationBlock {
            name: org.name.clone(),
            address: org.address.clone(),
            contact: org.contact.clone(),
        },
        receipt_number: receipt_number(),
        date: format_date(input.date),
        resident: display_or_na(&input.resident_name),
        flat_number: display_or_na(&input.unit_number),
        month: display_or_na(&input.billing_period),
        previous_balance: currency.format_or_na(&input.previous_balance),
        amount_paid: currency.format_or_na(&input.amount_paid),
        status: "Paid".into(),
        signatory: org.signatory.clone(),
    }
}

fn text(x: u32, y: u32, size: u32, align: Align, color: Rgb, value: &str) -> Element {
    Element::Text {
        x,
        y,
        size,
        align,
        color,
        text: value.to_string(),
    }
}

impl ReceiptPreview {
    /// Lay the receipt out on a fixed page.
    #[must_use]
    pub fn layout(&self) -> PreviewSurface {
        let mut els = Vec::new();

        // Header
        els.push(text(PADDING, PADDING, 24, Align::Left, INK, &self.organization.name));
        let mut y = 84;
        for line in self
            .organization
            .address
            .iter()
            .chain(std::iter::once(&self.organization.contact))
        {
            els.push(text(PADDING, y, 14, Align::Left, MUTED, line));
            y += 20;
        }
        els.push(text(RIGHT_EDGE, PADDING, 14, Align::Right, MUTED, "Receipt No."));
        els.push(text(RIGHT_EDGE, 62, 18, Align::Right, INK, &self.receipt_number));
        els.push(text(RIGHT_EDGE, 92, 14, Align::Right, MUTED, &self.date));

        let rule_y = y.max(150) + 10;
        els.push(Element::Rule {
            x: PADDING,
            y: rule_y,
            width: SURFACE_WIDTH - 2 * PADDING,
            color: RULE,
        });

        // Details grid
        let grid = [
            ("Resident", &self.resident, "Flat Number", &self.flat_number),
            ("Month", &self.month, "Previous Balance", &self.previous_balance),
        ];
        let mut y = rule_y + 32;
        for (l1, v1, l2, v2) in grid {
            els.push(text(PADDING, y, 14, Align::Left, MUTED, l1));
            els.push(text(PADDING, y + 22, 16, Align::Left, INK, v1));
            els.push(text(SECOND_COLUMN, y, 14, Align::Left, MUTED, l2));
            els.push(text(SECOND_COLUMN, y + 22, 16, Align::Left, INK, v2));
            y += 64;
        }

        // Amount
        let amount_y = y + 16;
        els.push(Element::Rule {
            x: PADDING,
            y: amount_y,
            width: SURFACE_WIDTH - 2 * PADDING,
            color: RULE,
        });
        els.push(text(PADDING, amount_y + 36, 14, Align::Left, MUTED, "Amount Paid"));
        els.push(text(RIGHT_EDGE, amount_y + 28, 24, Align::Right, INK, &self.amount_paid));

        // Footer
        let footer_y = amount_y + 90;
        els.push(Element::Rule {
            x: PADDING,
            y: footer_y,
            width: SURFACE_WIDTH - 2 * PADDING,
            color: RULE,
        });
        els.push(Element::Badge {
            x: PADDING,
            y: footer_y + 44,
            width: 72,
            height: 28,
            fill: BADGE_FILL,
            color: BADGE_INK,
            text: self.status.clone(),
        });
        els.push(text(RIGHT_EDGE - 10, footer_y + 24, 16, Align::Right, INK, &self.signatory));
        els.push(Element::Rule {
            x: RIGHT_EDGE - 120,
            y: footer_y + 46,
            width: 120,
            color: INK,
        });
        els.push(text(RIGHT_EDGE, footer_y + 56, 14, Align::Right, MUTED, "Authorised"));

        PreviewSurface {
            width: SURFACE_WIDTH,
            height: SURFACE_HEIGHT.max(footer_y + 100),
            elements: els,
        }
    }
}

/// Formats the receipt as a terminal card.
pub fn format_preview_text(preview: &ReceiptPreview) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", preview.organization.name.bold()));
    for line in &preview.organization.address {
        out.push_str(&format!("{}\n", line.dimmed()));
    }
    out.push_str(&format!("{}\n\n", preview.organization.contact.dimmed()));

    out.push_str(&format!(
        "{} {}    {}\n",
        "Receipt No.".dimmed(),
        preview.receipt_number.bold(),
        preview.date
    ));
    out.push_str(&format!("{}\n", "─".repeat(48).dimmed()));

    let rows = [
        ("Resident", &preview.resident),
        ("Flat Number", &preview.flat_number),
        ("Month", &preview.month),
        ("Previous Balance", &preview.previous_balance),
    ];
    for (label, value) in rows {
        out.push_str(&format!("{:<18}{value}\n", label.dimmed()));
    }

    out.push_str(&format!("{}\n", "─".repeat(48).dimmed()));
    out.push_str(&format!(
        "{:<18}{}\n\n",
        "Amount Paid".dimmed(),
        preview.amount_paid.bold()
    ));
    out.push_str(&format!(
        "{}    {} ({})",
        format!("✓ {}", preview.status).green(),
        preview.signatory.italic(),
        "Authorised".dimmed()
    ));

    out
}

/// Formats the receipt as a two-column table.
pub fn format_preview_table(preview: &ReceiptPreview) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Field", "Value"]);

    table.add_row(vec!["Receipt No.", preview.receipt_number.as_str()]);
    table.add_row(vec!["Date", preview.date.as_str()]);
    table.add_row(vec!["Resident", preview.resident.as_str()]);
    table.add_row(vec!["Flat Number", preview.flat_number.as_str()]);
    table.add_row(vec!["Month", preview.month.as_str()]);
    table.add_row(vec!["Previous Balance", preview.previous_balance.as_str()]);
    table.add_row(vec!["Amount Paid", preview.amount_paid.as_str()]);
    table.add_row(vec!["Status", preview.status.as_str()]);

    table.to_string()
}

/// Formats the receipt as JSON.
///
/// # Errors
/// Returns error if serialization fails.
pub fn format_preview_json(preview: &ReceiptPreview) -> std::result::Result<String, serde_json::Error> {
    serde_json::to_string_pretty(preview)
}
