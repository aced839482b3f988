//! Diagnostic and error reporting utilities

use crate::CliError;
use lf_core::source_map::SourceFile;
use miette::{Diagnostic, GraphicalReportHandler, NamedSource, SourceSpan};
use std::path::Path;
use thiserror::Error;

/// A Java file the front end could not parse.
#[derive(Error, Debug, Diagnostic)]
#[error("syntax error: {message}")]
#[diagnostic(
    code(loopfold::syntax_error),
    help("loopfold only reads files that compile; fix the syntax and rerun")
)]
pub struct SyntaxDiagnostic {
    pub message: String,
    #[source_code]
    pub src: NamedSource<String>,
    #[label("here")]
    pub err_span: SourceSpan,
}

impl SyntaxDiagnostic {
    pub fn new(path: &Path, source: &str, lo: usize, hi: usize, message: impl Into<String>) -> Self {
        let lo = lo.min(source.len());
        let len = hi.max(lo).min(source.len()) - lo;
        Self {
            message: message.into(),
            src: NamedSource::new(path.display().to_string(), source.to_string()),
            err_span: SourceSpan::from((lo, len)),
        }
    }
}

/// Map an engine failure on `file` to a CLI error.
pub fn engine_error(file: &SourceFile, err: lf_core::Error) -> CliError {
    match err {
        lf_core::Error::Syntax { span, message } => CliError::Parse(Box::new(SyntaxDiagnostic::new(
            &file.path,
            &file.source,
            span.lo as usize,
            span.hi as usize,
            message,
        ))),
        other => CliError::Conversion(format!("{}: {}", file.path.display(), other)),
    }
}

/// Print `err` through miette when it carries source context. Returns
/// whether anything was printed.
pub fn render_cli_error(err: &CliError) -> bool {
    match err {
        CliError::Parse(diagnostic) => {
            let mut out = String::new();
            if GraphicalReportHandler::new()
                .with_context_lines(2)
                .render_report(&mut out, diagnostic.as_ref())
                .is_err()
            {
                return false;
            }
            eprintln!("{out}");
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_error_maps_to_parse() {
        let file = SourceFile::new(3, "Broken.java", "class Broken {");
        let err = engine_error(&file, lf_core::Error::syntax(lf_core::span::Span::new(3, 13, 14), "expected `}`"));
        match err {
            CliError::Parse(diagnostic) => {
                assert_eq!(diagnostic.err_span, SourceSpan::from((13, 1)));
                assert_eq!(diagnostic.message, "expected `}`");
            }
            other => panic!("Expected Parse, got {other:?}"),
        }
    }

    #[test]
    fn test_span_is_clamped_to_source() {
        let diagnostic = SyntaxDiagnostic::new(Path::new("A.java"), "abc", 2, 40, "eof");
        assert_eq!(diagnostic.err_span, SourceSpan::from((2, 1)));
    }

    #[test]
    fn test_other_errors_are_conversion_errors() {
        let file = SourceFile::anonymous("class A {}");
        let err = engine_error(&file, lf_core::Error::invalid_model("bad stage"));
        assert!(matches!(err, CliError::Conversion(_)));
    }
}
