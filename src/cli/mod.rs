//! CLI interface using clap.
//!
//! Provides command-line arguments and subcommands for the tool.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::application::{OutputFormat, ReceiptForm};
use crate::domain::{Field, ReceiptDraft};

/// Maintenance Receipt Generator - fill in, preview, export and share receipts.
#[derive(Parser, Debug)]
#[command(name = "receipt")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging (use multiple times for more verbosity).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Configuration file (defaults to ~/.receipt-generator/config.toml).
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format: text, json, or table.
    #[arg(short, long, default_value = "text", global = true)]
    pub format: String,

    #[command(subcommand)]
    pub command: Commands,
}

/// The six receipt fields as flags.
#[derive(Args, Debug, Clone, Default)]
pub struct ReceiptArgs {
    /// Receipt date as YYYY-MM-DD (defaults to today).
    #[arg(short, long)]
    pub date: Option<NaiveDate>,

    /// Resident name.
    #[arg(short, long, default_value = "")]
    pub name: String,

    /// Flat / unit number.
    #[arg(long, default_value = "")]
    pub flat: String,

    /// Billing period, e.g. "January 2025".
    #[arg(short, long, default_value = "")]
    pub month: String,

    /// Previous balance.
    #[arg(short, long, default_value = "")]
    pub balance: String,

    /// Amount paid.
    #[arg(short, long, default_value = "")]
    pub amount: String,
}

impl ReceiptArgs {
    /// Build a form with every flag applied as a user edit.
    #[must_use]
    pub fn into_form(self) -> ReceiptForm {
        let mut form = ReceiptForm::new(ReceiptDraft::default());
        if let Some(date) = self.date {
            form.set_date(Some(date));
        }
        form.set_field(Field::ResidentName, &self.name);
        form.set_field(Field::UnitNumber, &self.flat);
        form.set_field(Field::BillingPeriod, &self.month);
        form.set_field(Field::PreviousBalance, &self.balance);
        form.set_field(Field::AmountPaid, &self.amount);
        form
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate the fields and print the receipt preview.
    Preview {
        #[command(flatten)]
        receipt: ReceiptArgs,

        /// Also save the rendered page as SVG.
        #[arg(long)]
        svg: Option<PathBuf>,
    },

    /// Validate the fields and save the receipt as a PDF.
    Export {
        #[command(flatten)]
        receipt: ReceiptArgs,

        /// Output directory (overrides the config).
        #[arg(short, long)]
        out_dir: Option<PathBuf>,
    },

    /// Validate the fields and share the receipt image.
    Share {
        #[command(flatten)]
        receipt: ReceiptArgs,

        /// Outbox directory acting as the share target (overrides the config).
        #[arg(short, long)]
        outbox: Option<PathBuf>,
    },

    /// Step through the form, preview, export and share interactively.
    Interactive,

    /// Write the default configuration file.
    InitConfig {
        /// Rewrite an existing file with every key filled in.
        #[arg(long)]
        force: bool,
    },

    /// Show the configuration file path being used.
    ConfigPath,
}

impl Cli {
    /// Parse the output format argument.
    pub fn output_format(&self) -> Result<OutputFormat, String> {
        self.format.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_export_command() {
        let cli = Cli::try_parse_from([
            "receipt",
            "export",
            "--date",
            "2025-03-05",
            "--name",
            "Ali Raza",
            "--flat",
            "A-101",
            "--month",
            "January 2025",
            "--balance",
            "5000",
            "--amount",
            "2500",
            "--out-dir",
            "/tmp/receipts",
        ])
        .unwrap();

        let Commands::Export { receipt, out_dir } = cli.command else {
            panic!("expected export");
        };
        assert_eq!(receipt.date, NaiveDate::from_ymd_opt(2025, 3, 5));
        assert_eq!(receipt.flat, "A-101");
        assert_eq!(out_dir, Some(PathBuf::from("/tmp/receipts")));
    }

    #[test]
    fn test_missing_flags_fail_validation_not_parsing() {
        let cli = Cli::try_parse_from(["receipt", "preview", "--name", "A"]).unwrap();
        let Commands::Preview { receipt, .. } = cli.command else {
            panic!("expected preview");
        };
        let mut form = receipt.into_form();
        let report = form.submit().unwrap_err();
        assert!(report.error(Field::ResidentName).is_some());
        assert!(report.error(Field::UnitNumber).is_some());
        assert!(report.error(Field::Date).is_none());
    }

    #[test]
    fn test_bad_date_is_parse_error() {
        assert!(Cli::try_parse_from(["receipt", "preview", "--date", "March 5"]).is_err());
    }

    #[test]
    fn test_output_format() {
        let cli = Cli::try_parse_from(["receipt", "-f", "json", "config-path"]).unwrap();
        assert_eq!(cli.output_format(), Ok(OutputFormat::Json));
    }
}
