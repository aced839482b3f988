//! `lf convert`: rewrite loops into stream pipelines

use super::common::{convert_path, ConversionArgs};
use crate::{cli::CliConfig, files::collect_source_files, Result};
use clap::Args;
use console::style;
use lf_convert::ConversionDriver;
use std::path::PathBuf;
use tracing::info;

/// Arguments for the convert command
#[derive(Debug, Clone, Args)]
pub struct ConvertArgs {
    /// Java files or directories to convert
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,
    /// Rewrite files in place instead of printing the result
    #[arg(short, long)]
    pub write: bool,
    #[command(flatten)]
    pub conversion: ConversionArgs,
}

/// Execute the convert command
pub fn convert_command(args: ConvertArgs, config: &CliConfig) -> Result<()> {
    let files = collect_source_files(&args.paths, &config.files)?;
    let driver = ConversionDriver::new(args.conversion.apply(config.conversion.clone()));

    let mut loops = 0;
    let mut changed = 0;
    for (idx, path) in files.iter().enumerate() {
        let (_, converted) = convert_path(&driver, idx as u64 + 1, path)?;
        let count = converted.report.converted_count();
        loops += count;
        if !args.write {
            if files.len() > 1 {
                println!("// {}", path.display());
            }
            print!("{}", converted.text);
            continue;
        }
        if converted.changed() {
            std::fs::write(path, &converted.text)?;
            changed += 1;
            info!("{}: converted {} loop(s)", path.display(), count);
        }
    }

    if args.write {
        println!(
            "{} Converted {} loop(s) in {} of {} file(s)",
            style("✔").green(),
            loops,
            changed,
            files.len()
        );
    }
    Ok(())
}
