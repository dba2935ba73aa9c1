//! Application configuration models.
//!
//! Every key carries a serde default, so an empty or partial TOML file still
//! yields the stock receipt template.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Organization shown in the receipt header and signature block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizationConfig {
    /// Organization name (header title).
    #[serde(default = "default_org_name")]
    pub name: String,

    /// Address lines under the title.
    #[serde(default = "default_address")]
    pub address: Vec<String>,

    /// Contact line (phone).
    #[serde(default = "default_contact")]
    pub contact: String,

    /// Name drawn on the signature line.
    #[serde(default = "default_signatory")]
    pub signatory: String,
}

impl Default for OrganizationConfig {
    fn default() -> Self {
        Self {
            name: default_org_name(),
            address: default_address(),
            contact: default_contact(),
            signatory: default_signatory(),
        }
    }
}

fn default_org_name() -> String {
    "RAHIM ARCADE".into()
}

fn default_address() -> Vec<String> {
    vec![
        "SC-24, Block-H, North Nazimabad".into(),
        "Karachi, Pakistan".into(),
    ]
}

fn default_contact() -> String {
    "0333-2232354".into()
}

fn default_signatory() -> String {
    "Usman".into()
}

/// Thousands grouping convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grouping {
    /// Groups of three: `1,234,567`.
    #[default]
    Western,
    /// Last three digits, then pairs: `12,34,567`.
    SouthAsian,
}

/// Currency display settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrencyConfig {
    /// Prefix written before every amount.
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Digit grouping convention.
    #[serde(default)]
    pub grouping: Grouping,
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            grouping: Grouping::default(),
        }
    }
}

fn default_prefix() -> String {
    "Rs.".into()
}

/// Export settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Capture scale factor for PDF export.
    #[serde(default = "default_pdf_scale")]
    pub pdf_scale: u32,

    /// Capture scale factor for shared images.
    #[serde(default = "default_share_scale")]
    pub share_scale: u32,

    /// Directory receiving exported PDFs (defaults to the working directory).
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            pdf_scale: default_pdf_scale(),
            share_scale: default_share_scale(),
            output_dir: None,
        }
    }
}

const fn default_pdf_scale() -> u32 {
    3
}

const fn default_share_scale() -> u32 {
    2
}

/// Share settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareConfig {
    /// Outbox directory acting as the native share target. Sharing falls back
    /// to the messaging link when unset.
    #[serde(default)]
    pub outbox_dir: Option<PathBuf>,

    /// Base of the messaging link used by the fallback path.
    #[serde(default = "default_fallback_url")]
    pub fallback_url: String,
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            outbox_dir: None,
            fallback_url: default_fallback_url(),
        }
    }
}

fn default_fallback_url() -> String {
    "https://wa.me/?text=".into()
}

/// Complete application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Receipt header and signature.
    #[serde(default)]
    pub organization: OrganizationConfig,

    /// Currency formatting.
    #[serde(default)]
    pub currency: CurrencyConfig,

    /// PDF export.
    #[serde(default)]
    pub export: ExportConfig,

    /// Sharing.
    #[serde(default)]
    pub share: ShareConfig,
}

impl AppConfig {
    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".receipt-generator")
    }

    /// Directory exported PDFs are written to.
    #[must_use]
    pub fn output_dir(&self) -> PathBuf {
        self.export
            .output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.organization.name, "RAHIM ARCADE");
        assert_eq!(config.currency.prefix, "Rs.");
        assert_eq!(config.currency.grouping, Grouping::Western);
        assert_eq!(config.export.pdf_scale, 3);
        assert_eq!(config.export.share_scale, 2);
        assert!(config.share.outbox_dir.is_none());
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [currency]
            grouping = "south_asian"
            "#,
        )
        .unwrap();
        assert_eq!(config.currency.grouping, Grouping::SouthAsian);
        assert_eq!(config.currency.prefix, "Rs.");
    }
}
