//! `lf check`: report what each loop would become

use super::common::{convert_path, ConversionArgs};
use crate::{cli::CliConfig, files::collect_source_files, CliError, Result};
use clap::Args;
use console::style;
use lf_convert::{ConversionDriver, LoopOutcome, LoopVerdict};
use lf_core::diagnostics::Diagnostic;
use serde::Serialize;
use std::path::PathBuf;

/// Arguments for the check command
#[derive(Debug, Clone, Args)]
pub struct CheckArgs {
    /// Java files or directories to check
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,
    /// Print the reports as JSON
    #[arg(long)]
    pub json: bool,
    #[command(flatten)]
    pub conversion: ConversionArgs,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub loops: Vec<LoopOutcome>,
}

fn outcome_diagnostic(outcome: &LoopOutcome) -> Diagnostic {
    let kind = outcome
        .kind
        .map(|kind| kind.to_string())
        .unwrap_or_else(|| "loop".to_string());
    let diagnostic = match &outcome.verdict {
        LoopVerdict::Converted { family } => {
            Diagnostic::info(format!("{kind} loop converts to a {} pipeline", family.as_str()))
                .with_code("convertible")
        }
        LoopVerdict::Rejected { reason, detail } => {
            Diagnostic::info(format!("{kind} loop left unchanged: {detail}")).with_code(reason.to_string())
        }
        LoopVerdict::Disabled { family } => Diagnostic::warning(format!(
            "{kind} loop needs the {} terminal, which is disabled",
            family.as_str()
        ))
        .with_code("disabled"),
    };
    diagnostic.with_span(outcome.span)
}

/// Execute the check command
pub fn check_command(args: CheckArgs, config: &CliConfig) -> Result<()> {
    let files = collect_source_files(&args.paths, &config.files)?;
    let driver = ConversionDriver::new(args.conversion.apply(config.conversion.clone()));

    let mut reports = Vec::with_capacity(files.len());
    let (mut convertible, mut rejected, mut disabled) = (0, 0, 0);
    for (idx, path) in files.iter().enumerate() {
        let (file, converted) = convert_path(&driver, idx as u64 + 1, path)?;
        for outcome in &converted.report.outcomes {
            match outcome.verdict {
                LoopVerdict::Converted { .. } => convertible += 1,
                LoopVerdict::Rejected { .. } => rejected += 1,
                LoopVerdict::Disabled { .. } => disabled += 1,
            }
            if !args.json {
                for line in outcome_diagnostic(outcome).render_plain(Some(&file)) {
                    println!("{line}");
                }
            }
        }
        reports.push(FileReport {
            path: path.clone(),
            loops: converted.report.outcomes,
        });
    }

    if args.json {
        let json = serde_json::to_string_pretty(&reports)
            .map_err(|e| CliError::Conversion(format!("Failed to serialize report: {}", e)))?;
        println!("{json}");
        return Ok(());
    }
    println!(
        "{} {} loop(s): {} convertible, {} rejected, {} disabled",
        style("ℹ").blue(),
        convertible + rejected + disabled,
        convertible,
        rejected,
        disabled
    );
    Ok(())
}
