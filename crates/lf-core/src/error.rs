use crate::span::Span;
use std::result;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("syntax error at {span}: {message}")]
    Syntax { span: Span, message: String },
    /// A loop model or pipeline violated an internal invariant.
    #[error("invalid model: {0}")]
    InvalidModel(String),
    #[error("edit conflict: {0}")]
    EditConflict(String),
    #[error("Generic error: {0}")]
    Generic(String),
}

impl Error {
    pub fn syntax(span: Span, message: impl Into<String>) -> Self {
        Error::Syntax {
            span,
            message: message.into(),
        }
    }

    pub fn invalid_model(message: impl Into<String>) -> Self {
        Error::InvalidModel(message.into())
    }
}

pub type Result<T> = result::Result<T, Error>;

impl From<eyre::Report> for Error {
    fn from(err: eyre::Report) -> Self {
        Error::Generic(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Generic(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eyre_reports_become_generic_errors() {
        let err: Error = eyre::eyre!("printer gave up").into();
        assert!(matches!(&err, Error::Generic(message) if message == "printer gave up"));
    }

    #[test]
    fn syntax_errors_show_their_span() {
        let err = Error::syntax(Span::new(1, 4, 9), "expected `;`");
        assert_eq!(err.to_string(), "syntax error at Span(1:4-9): expected `;`");
    }
}
