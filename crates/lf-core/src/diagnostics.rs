//! Plain-text diagnostics anchored to a source span.

use crate::source_map::SourceFile;
use crate::span::Span;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticLevel {
    Info,
    Warning,
    Error,
}

impl Display for DiagnosticLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            DiagnosticLevel::Info => "info",
            DiagnosticLevel::Warning => "warning",
            DiagnosticLevel::Error => "error",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub message: String,
    pub span: Option<Span>,
    /// Short machine-readable tag, e.g. a rejection reason.
    pub code: Option<String>,
}

impl Diagnostic {
    fn with_level(level: DiagnosticLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            span: None,
            code: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::with_level(DiagnosticLevel::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::with_level(DiagnosticLevel::Warning, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::with_level(DiagnosticLevel::Info, message)
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// `path:line:col: level[code]: message`, then the source line and a
    /// caret when `file` is given.
    pub fn render_plain(&self, file: Option<&SourceFile>) -> Vec<String> {
        let head = match &self.code {
            Some(code) => format!("{}[{}]", self.level, code),
            None => self.level.to_string(),
        };
        let (Some(span), Some(file)) = (self.span, file) else {
            return vec![format!("{head}: {}", self.message)];
        };
        let (line, col) = file.line_col(span.lo);
        let mut lines = vec![format!(
            "{}:{line}:{col}: {head}: {}",
            file.path.display(),
            self.message
        )];
        if let Some(text) = file.line_text(line) {
            lines.push(format!("    {text}"));
            lines.push(format!("    {}^", " ".repeat(col.saturating_sub(1))));
        }
        lines
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{} [{}]", self.message, code),
            None => f.write_str(&self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_rendering_points_at_column() {
        let file = SourceFile::anonymous("class A {\n    int x;\n}\n");
        let diagnostic = Diagnostic::info("field")
            .with_span(Span::new(1, 14, 20))
            .with_code("demo");
        let lines = diagnostic.render_plain(Some(&file));
        assert_eq!(lines[0], "<memory>:2:5: info[demo]: field");
        assert_eq!(lines[1], "        int x;");
        assert_eq!(lines[2], "        ^");
    }

    #[test]
    fn without_a_file_only_the_message_is_printed() {
        let diagnostic = Diagnostic::warning("reduce disabled").with_span(Span::new(1, 0, 3));
        assert_eq!(diagnostic.render_plain(None), vec!["warning: reduce disabled".to_string()]);
        assert_eq!(diagnostic.to_string(), "reduce disabled");
    }
}
