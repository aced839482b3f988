use crate::span::{FileId, Span};
use std::path::PathBuf;
use std::sync::Arc;

/// A source text with its line table. Cheap to clone.
#[derive(Clone, Debug)]
pub struct SourceFile {
    pub id: FileId,
    pub path: PathBuf,
    pub source: Arc<str>,
    line_starts: Arc<Vec<usize>>,
}

impl SourceFile {
    pub fn new(id: FileId, path: impl Into<PathBuf>, source: &str) -> Self {
        Self {
            id,
            path: path.into(),
            source: Arc::from(source),
            line_starts: Arc::new(compute_line_starts(source)),
        }
    }

    /// Anonymous in-memory source, used by tests and `convert_source`.
    pub fn anonymous(source: &str) -> Self {
        Self::new(1, "<memory>", source)
    }

    /// 1-based line and column of a byte offset.
    pub fn line_col(&self, offset: u32) -> (usize, usize) {
        let offset = offset as usize;
        let idx = match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx.saturating_sub(1),
        };
        let line_start = self.line_starts.get(idx).copied().unwrap_or(0);
        let line = idx + 1;
        let col = offset.saturating_sub(line_start) + 1;
        (line, col)
    }

    pub fn line_of(&self, offset: u32) -> usize {
        self.line_col(offset).0
    }

    pub fn line_text(&self, line: usize) -> Option<&str> {
        if line == 0 {
            return None;
        }
        let idx = line - 1;
        let start = *self.line_starts.get(idx)?;
        let end = self
            .line_starts
            .get(idx + 1)
            .copied()
            .unwrap_or_else(|| self.source.len());
        self.source
            .get(start..end)
            .map(|s| s.trim_end_matches('\n').trim_end_matches('\r'))
    }

    /// Leading whitespace of the line containing `offset`.
    pub fn indentation_at(&self, offset: u32) -> &str {
        let line = self.line_of(offset);
        let text = self.line_text(line).unwrap_or("");
        let trimmed = text.trim_start_matches([' ', '\t']);
        &text[..text.len() - trimmed.len()]
    }

    pub fn snippet(&self, span: Span) -> Option<&str> {
        self.source.get(span.range())
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

fn compute_line_starts(source: &str) -> Vec<usize> {
    let mut starts = vec![0];
    for (idx, byte) in source.bytes().enumerate() {
        if byte == b'\n' {
            starts.push(idx + 1);
        }
    }
    starts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_col_counts_from_one() {
        let file = SourceFile::anonymous("a\n  bc\nd");
        assert_eq!(file.line_col(0), (1, 1));
        assert_eq!(file.line_col(4), (2, 3));
        assert_eq!(file.line_col(7), (3, 1));
        assert_eq!(file.line_text(2), Some("  bc"));
        assert_eq!(file.indentation_at(4), "  ");
    }
}
