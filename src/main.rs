//! Maintenance Receipt Generator - fill in a receipt, preview it, export it
//! as a PDF or share it as an image.
//!
//! QUICK START:
//!   receipt preview --name "Ali Raza" --flat A-101 --month "January 2025" -b 5000 -a 2500
//!   receipt export  ... --out-dir receipts     # receipt_a-101_january_2025.pdf
//!   receipt share   ... --outbox ~/outbox      # PNG + caption, or a messaging link
//!   receipt interactive                        # Form / Preview session

mod application;
mod cli;
mod domain;
mod infrastructure;

use std::io::{BufRead, Write};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use colored::Colorize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use application::{
    format_date_long, format_preview_json, format_preview_table, format_preview_text,
    ExportOutcome, ExportPorts, ExportSettings, Exporter, OutputFormat, ReceiptForm, Session,
    ValidationReport,
};
use cli::{Cli, Commands, ReceiptArgs};
use domain::{AppConfig, AppError, Field, Tab};
use infrastructure::{
    config_file_path, ensure_config_exists, load_config, save_config, BitmapRasterizer,
    ConsoleLinkOpener, ConsoleNotifier, OutboxShareTarget, PdfWriter,
};

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

/// Main application logic.
fn run(cli: Cli) -> domain::Result<ExitCode> {
    let format = cli
        .output_format()
        .map_err(|e| AppError::Config { message: e })?;
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Preview { receipt, svg } => {
            let config = load_config(config_path)?;
            cmd_preview(config, receipt, svg.as_deref(), format)
        }
        Commands::Export { receipt, out_dir } => {
            let mut config = load_config(config_path)?;
            if out_dir.is_some() {
                config.export.output_dir = out_dir;
            }
            cmd_export(config, receipt)
        }
        Commands::Share { receipt, outbox } => {
            let mut config = load_config(config_path)?;
            if outbox.is_some() {
                config.share.outbox_dir = outbox;
            }
            cmd_share(config, receipt)
        }
        Commands::Interactive => {
            let config = load_config(config_path)?;
            cmd_interactive(config)
        }
        Commands::InitConfig { force } => cmd_init_config(config_path, force),
        Commands::ConfigPath => {
            cmd_config_path(config_path);
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Submit the flags as a form; prints field errors on failure.
fn submitted_session(config: AppConfig, receipt: ReceiptArgs) -> Option<Session> {
    let mut session = Session::with_form(config, receipt.into_form());
    match session.submit() {
        Ok(_) => Some(session),
        Err(report) => {
            print_validation_errors(&report);
            None
        }
    }
}

/// Preview command.
fn cmd_preview(
    config: AppConfig,
    receipt: ReceiptArgs,
    svg: Option<&Path>,
    format: OutputFormat,
) -> domain::Result<ExitCode> {
    let Some(session) = submitted_session(config, receipt) else {
        return Ok(ExitCode::FAILURE);
    };
    let (Some(preview), Some(surface)) = (session.preview(), session.surface()) else {
        return Ok(ExitCode::FAILURE);
    };

    let output = match format {
        OutputFormat::Text => format_preview_text(preview),
        OutputFormat::Json => format_preview_json(preview).map_err(AppError::json)?,
        OutputFormat::Table => format_preview_table(preview),
    };
    println!("{output}");

    if let Some(path) = svg {
        surface.save_svg(path)?;
        println!("{} Preview saved to {}", "✓".green().bold(), path.display());
    }

    Ok(ExitCode::SUCCESS)
}

/// Export command.
fn cmd_export(config: AppConfig, receipt: ReceiptArgs) -> domain::Result<ExitCode> {
    let exporter = build_exporter(&config);
    let Some(session) = submitted_session(config, receipt) else {
        return Ok(ExitCode::FAILURE);
    };

    let outcome = block_on(exporter.download_pdf(&session))?;
    Ok(report_outcome(&outcome))
}

/// Share command.
fn cmd_share(config: AppConfig, receipt: ReceiptArgs) -> domain::Result<ExitCode> {
    let exporter = build_exporter(&config);
    let Some(session) = submitted_session(config, receipt) else {
        return Ok(ExitCode::FAILURE);
    };

    let outcome = block_on(exporter.share_receipt(&session))?;
    Ok(report_outcome(&outcome))
}

/// Interactive Form / Preview session.
fn cmd_interactive(config: AppConfig) -> domain::Result<ExitCode> {
    let exporter = build_exporter(&config);
    let mut session = Session::new(config);

    interactive_loop(&mut session, &exporter).map_err(|e| AppError::Io {
        message: format!("{e:#}"),
        source: None,
    })?;

    Ok(ExitCode::SUCCESS)
}

fn interactive_loop(session: &mut Session, exporter: &Exporter) -> anyhow::Result<()> {
    let stdin = std::io::stdin();
    let mut input = stdin.lock();

    loop {
        match session.tab() {
            Tab::Form => {
                println!("\n{}", "📝 Receipt Information".bold());
                println!("{}", "Enter the details for the maintenance receipt.".dimmed());
                if !fill_form(session.form_mut(), &mut input)? {
                    return Ok(());
                }
                if let Err(report) = session.submit() {
                    print_validation_errors(&report);
                }
            }
            Tab::Preview => {
                if let Some(preview) = session.preview() {
                    println!("\n{}\n", format_preview_text(preview));
                }
                let Some(choice) = prompt(
                    &mut input,
                    "[d] Download PDF  [s] Share  [r] Re-render  [e] Edit details  [q] Quit",
                )?
                else {
                    return Ok(());
                };

                match choice.trim().to_lowercase().as_str() {
                    "d" => {
                        let outcome = block_on(exporter.download_pdf(session))?;
                        report_outcome(&outcome);
                    }
                    "s" => {
                        let outcome = block_on(exporter.share_receipt(session))?;
                        report_outcome(&outcome);
                    }
                    "r" => {
                        session.rerender();
                    }
                    "e" => session.edit(),
                    "q" => return Ok(()),
                    other => println!("{} Unknown choice: {other}", "?".yellow()),
                }
            }
        }
    }
}

/// Prompt for every field. Empty input keeps the current value.
/// Returns `false` on end of input.
fn fill_form(form: &mut ReceiptForm, input: &mut impl BufRead) -> anyhow::Result<bool> {
    for field in Field::ALL {
        let current = form.draft().text(field);
        let hint = match field {
            Field::Date => format!("{} - {}", format_date_long(form.draft().date), field.placeholder()),
            _ if current.is_empty() => field.placeholder().to_string(),
            _ => current.clone(),
        };

        let Some(line) = prompt(input, &format!("{} [{}]", field.label(), hint.dimmed()))? else {
            return Ok(false);
        };

        let value = line.trim_end_matches(['\r', '\n']);
        if !value.is_empty() || current.is_empty() {
            form.set_field(field, value);
        }
        if let Some(message) = form.errors().error(field) {
            println!("  {} {}", "✗".red(), message.red());
        }
    }
    Ok(true)
}

fn prompt(input: &mut impl BufRead, message: &str) -> anyhow::Result<Option<String>> {
    print!("{message}: ");
    std::io::stdout().flush().context("Failed to flush stdout")?;

    let mut line = String::new();
    let read = input
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    Ok((read > 0).then_some(line))
}

fn build_exporter(config: &AppConfig) -> Exporter {
    Exporter::new(
        ExportSettings::from(config),
        ExportPorts {
            rasterizer: Box::new(BitmapRasterizer),
            writer: Arc::new(PdfWriter),
            share: Box::new(OutboxShareTarget::new(config.share.outbox_dir.clone())),
            opener: Box::new(ConsoleLinkOpener),
            notifier: Box::new(ConsoleNotifier),
        },
    )
}

/// Run an export future on a single-threaded runtime.
fn block_on<F: std::future::Future>(future: F) -> domain::Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| AppError::io("Failed to start async runtime", e))?;
    Ok(runtime.block_on(future))
}

fn report_outcome(outcome: &ExportOutcome) -> ExitCode {
    match outcome {
        ExportOutcome::Saved(path) => {
            println!("{} Saved {}", "✓".green().bold(), path.display());
            ExitCode::SUCCESS
        }
        ExportOutcome::Shared | ExportOutcome::LinkOpened(_) => ExitCode::SUCCESS,
        ExportOutcome::Skipped => {
            println!("{}", "Nothing to export yet - submit the form first.".yellow());
            ExitCode::SUCCESS
        }
        ExportOutcome::Failed => ExitCode::FAILURE,
    }
}

fn print_validation_errors(report: &ValidationReport) {
    eprintln!("{}", "Please fix the following fields:".red().bold());
    for (field, message) in &report.errors {
        eprintln!("  {} {}: {}", "✗".red(), field.label().bold(), message);
    }
}

/// Init-config command.
fn cmd_init_config(path: Option<&Path>, force: bool) -> domain::Result<ExitCode> {
    let path = path.map_or_else(config_file_path, Path::to_path_buf);

    if ensure_config_exists(&path)? {
        println!("{} Created {}", "✓".green().bold(), path.display());
    } else if force {
        let current = load_config(Some(&path))?;
        save_config(&current, &path)?;
        println!("{} Rewrote {}", "✓".green().bold(), path.display());
    } else {
        println!(
            "{} already exists (use --force to rewrite it)",
            path.display()
        );
    }

    Ok(ExitCode::SUCCESS)
}

/// Config-path command.
fn cmd_config_path(path: Option<&Path>) {
    let path = path.map_or_else(config_file_path, Path::to_path_buf);
    let state = if path.exists() {
        "found".green()
    } else {
        "not found, using defaults".yellow()
    };
    println!("📂 {} ({state})", path.display());
}

/// Setup tracing/logging based on verbosity level.
fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time())
        .with(filter)
        .init();
}
