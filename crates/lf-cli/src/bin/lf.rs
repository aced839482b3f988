//! Loopfold CLI Binary
//!
//! Rewrites Java loops into equivalent stream pipelines.
//!
//! # Usage
//!
//! ```bash
//! # Print the converted file
//! lf convert src/main/java/App.java
//!
//! # Convert a source tree in place, leaving reductions alone
//! lf convert src/ --write --disable reduce
//!
//! # Report what each loop would become
//! lf check src/ --json
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use lf_cli::{
    cli::CliConfig,
    commands::{self, check::CheckArgs, convert::ConvertArgs},
    diagnostics::render_cli_error,
    CliError, Result,
};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser)]
#[command(
    name = "lf",
    version = env!("CARGO_PKG_VERSION"),
    about = "loopfold: rewrite Java loops as stream pipelines",
    long_about = r#"
loopfold rewrites imperative Java loops into equivalent java.util.stream
pipelines, and leaves every loop it cannot prove safe unchanged.

EXAMPLES:
    lf convert App.java                  # Print the converted file
    lf convert src/ --write              # Rewrite a tree in place
    lf check src/ --json                 # Per-loop verdicts as JSON
    "#
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (use multiple times for increased verbosity)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Set log level (overrides --verbose/--quiet)
    #[arg(long, global = true, value_enum)]
    log: Option<LogLevel>,

    /// Set log output format
    #[arg(long, global = true, value_enum, default_value = "pretty")]
    log_format: LogFormat,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogFormat {
    Pretty,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert loops and print or write the result
    Convert(ConvertArgs),

    /// Report each loop with its verdict
    Check(CheckArgs),
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = setup_logging(cli.verbose, cli.quiet, cli.log, cli.log_format) {
        eprintln!("{e}");
        std::process::exit(2);
    }

    match run(cli.command, cli.config) {
        Ok(()) => {
            if cli.verbose > 0 {
                info!("Command completed successfully");
            }
        }
        Err(e) => {
            if !render_cli_error(&e) {
                error!("{}", e);
            }
            if cli.verbose > 0 {
                error!(?e, "detailed error context");
            }
            std::process::exit(1);
        }
    }
}

fn run(command: Commands, config_path: Option<PathBuf>) -> Result<()> {
    let config = CliConfig::load(config_path.as_deref())?;
    match command {
        Commands::Convert(args) => commands::convert_command(args, &config),
        Commands::Check(args) => commands::check_command(args, &config),
    }
}

fn setup_logging(
    verbose: u8,
    quiet: bool,
    log_level: Option<LogLevel>,
    log_format: LogFormat,
) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if let Some(level) = log_level {
        EnvFilter::new(match level {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        })
    } else if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    // stdout carries converted sources and reports
    let formatter = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_timer(tracing_subscriber::fmt::time::uptime())
        .with_level(true);

    let result = match log_format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(formatter)
            .with(filter)
            .try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(formatter.json())
            .with(filter)
            .try_init(),
    };
    result.map_err(|e| CliError::Config(format!("Failed to set up logging: {}", e)))
}
