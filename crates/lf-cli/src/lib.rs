//! Loopfold CLI library
//!
//! Command implementations, configuration loading and error reporting for the
//! `lf` binary.

pub mod cli;
pub mod commands;
pub mod diagnostics;
pub mod files;

pub mod error {
    use thiserror::Error;

    use crate::diagnostics::SyntaxDiagnostic;

    #[derive(Error, Debug)]
    pub enum CliError {
        #[error("IO error: {0}")]
        Io(#[from] std::io::Error),

        #[error("Configuration error: {0}")]
        Config(String),

        #[error("{0}")]
        Parse(Box<SyntaxDiagnostic>),

        #[error("Conversion error: {0}")]
        Conversion(String),

        #[error("Invalid input: {0}")]
        InvalidInput(String),
    }

    pub type Result<T> = std::result::Result<T, CliError>;
}

pub use error::{CliError, Result};
