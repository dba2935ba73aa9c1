//! Display formatting for receipt values.
//!
//! Every function here is total: malformed or missing input degrades to a
//! placeholder (`Rs. 0`, `N/A`) instead of an error.

use chrono::{Datelike, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::domain::{CurrencyConfig, Grouping};

/// Placeholder for unset values.
pub const NOT_AVAILABLE: &str = "N/A";

/// Fraction digits kept when rendering amounts.
const MAX_FRACTION_DIGITS: u32 = 3;

/// Output format options for CLI output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable receipt card.
    #[default]
    Text,
    /// JSON format for programmatic use.
    Json,
    /// Two-column table.
    Table,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "table" => Ok(Self::Table),
            _ => Err(format!("Unknown format: {s}. Use: text, json, table")),
        }
    }
}

/// Currency formatter bound to a prefix and grouping convention.
#[derive(Debug, Clone)]
pub struct CurrencyFormatter {
    prefix: String,
    grouping: Grouping,
}

impl Default for CurrencyFormatter {
    fn default() -> Self {
        Self::new(&CurrencyConfig::default())
    }
}

impl CurrencyFormatter {
    /// Build a formatter from configuration.
    #[must_use]
    pub fn new(config: &CurrencyConfig) -> Self {
        Self {
            prefix: config.prefix.clone(),
            grouping: config.grouping,
        }
    }

    /// Format free text as an amount.
    ///
    /// Everything except digits, `.` and `-` is stripped, then the longest
    /// leading number is parsed. Unparsable input yields `"{prefix} 0"`.
    #[must_use]
    pub fn format(&self, raw: &str) -> String {
        let cleaned: String = raw
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
            .collect();

        match parse_leading_number(&cleaned) {
            Some(value) => format!("{} {}", self.prefix, self.group(value)),
            None => format!("{} 0", self.prefix),
        }
    }

    /// Like [`Self::format`], but empty input renders as `N/A`.
    #[must_use]
    pub fn format_or_na(&self, raw: &str) -> String {
        if raw.is_empty() {
            NOT_AVAILABLE.to_string()
        } else {
            self.format(raw)
        }
    }

    fn group(&self, value: f64) -> String {
        let sign = if value.is_sign_negative() { "-" } else { "" };
        if !value.is_finite() {
            return format!("{sign}∞");
        }

        let fixed = round_fraction(value.abs());
        let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
        let frac_part = frac_part.trim_end_matches('0');

        let grouped = match self.grouping {
            Grouping::SouthAsian => group_south_asian(int_part),
            Grouping::Western => group_by(int_part, 3),
        };

        if frac_part.is_empty() {
            format!("{sign}{grouped}")
        } else {
            format!("{sign}{grouped}.{frac_part}")
        }
    }
}

/// Round a non-negative amount to the kept fraction digits, half away from
/// zero, starting from its shortest decimal form rather than the binary value
/// (`1.0005` rounds to `1.001`).
fn round_fraction(value: f64) -> String {
    value.to_string().parse::<Decimal>().map_or_else(
        |_| format!("{value:.3}"),
        |d| {
            d.round_dp_with_strategy(MAX_FRACTION_DIGITS, RoundingStrategy::MidpointAwayFromZero)
                .normalize()
                .to_string()
        },
    )
}

/// Parse the longest leading decimal literal: optional `-`, digits,
/// optional fraction. At least one digit is required.
fn parse_leading_number(s: &str) -> Option<f64> {
    let bytes = s.as_bytes();
    let mut i = 0;
    let negative = bytes.first() == Some(&b'-');
    if negative {
        i += 1;
    }

    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let int_digits = &s[int_start..i];

    let mut frac_digits = "";
    if i < bytes.len() && bytes[i] == b'.' {
        let frac_start = i + 1;
        let mut j = frac_start;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        frac_digits = &s[frac_start..j];
    }

    if int_digits.is_empty() && frac_digits.is_empty() {
        return None;
    }

    let literal = format!(
        "{}{}.{}",
        if negative { "-" } else { "" },
        if int_digits.is_empty() { "0" } else { int_digits },
        if frac_digits.is_empty() { "0" } else { frac_digits },
    );
    literal.parse().ok()
}

/// Group digits from the right in fixed-size groups.
fn group_by(digits: &str, size: usize) -> String {
    let mut groups: Vec<&str> = Vec::new();
    let mut end = digits.len();
    while end > size {
        groups.push(&digits[end - size..end]);
        end -= size;
    }
    groups.push(&digits[..end]);
    groups.reverse();
    groups.join(",")
}

/// Last three digits, then groups of two (lakh / crore).
fn group_south_asian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }
    let (head, tail) = digits.split_at(digits.len() - 3);
    format!("{},{tail}", group_by(head, 2))
}

/// Receipt date: `"5 March 2025"`, or `N/A` when unset.
#[must_use]
pub fn format_date(date: Option<NaiveDate>) -> String {
    date.map_or_else(
        || NOT_AVAILABLE.to_string(),
        |d| d.format("%-d %B %Y").to_string(),
    )
}

/// Form-side date label: `"March 5th, 2025"`, or `Pick a date` when unset.
#[must_use]
pub fn format_date_long(date: Option<NaiveDate>) -> String {
    date.map_or_else(
        || "Pick a date".to_string(),
        |d| {
            format!(
                "{} {}{}, {}",
                d.format("%B"),
                d.day(),
                ordinal_suffix(d.day()),
                d.year()
            )
        },
    )
}

const fn ordinal_suffix(day: u32) -> &'static str {
    match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}

/// Text value, or `N/A` when empty.
#[must_use]
pub fn display_or_na(value: &str) -> String {
    if value.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        value.to_string()
    }
}
