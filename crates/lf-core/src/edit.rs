//! Byte-range text edits over the original source.

use crate::ast::CompilationUnit;
use crate::error::{Error, Result};
use std::ops::Range;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TextEdit {
    pub range: Range<usize>,
    pub replacement: String,
}

impl TextEdit {
    pub fn replace(range: Range<usize>, replacement: impl Into<String>) -> Self {
        Self {
            range,
            replacement: replacement.into(),
        }
    }

    pub fn insert(offset: usize, text: impl Into<String>) -> Self {
        Self::replace(offset..offset, text)
    }
}

/// Apply non-overlapping edits. Insertions at the same offset keep their
/// relative order.
pub fn apply_edits(source: &str, edits: &[TextEdit]) -> Result<String> {
    let mut sorted: Vec<&TextEdit> = edits.iter().collect();
    sorted.sort_by_key(|edit| (edit.range.start, edit.range.end));

    for pair in sorted.windows(2) {
        if pair[1].range.start < pair[0].range.end {
            return Err(Error::EditConflict(format!(
                "{:?} overlaps {:?}",
                pair[0].range, pair[1].range
            )));
        }
    }

    let mut out = String::with_capacity(source.len());
    let mut cursor = 0;
    for edit in sorted {
        let Range { start, end } = edit.range.clone();
        if end > source.len() || !source.is_char_boundary(start) || !source.is_char_boundary(end)
        {
            return Err(Error::EditConflict(format!(
                "{:?} is outside the source",
                edit.range
            )));
        }
        out.push_str(&source[cursor..start]);
        out.push_str(&edit.replacement);
        cursor = end;
    }
    out.push_str(&source[cursor..]);
    Ok(out)
}

/// Edit adding `imports` that `unit` does not already cover. Placed after the
/// last import, else after the package declaration, else at the top.
pub fn insert_imports(source: &str, unit: &CompilationUnit, imports: &[String]) -> Option<TextEdit> {
    let mut missing: Vec<&String> = imports
        .iter()
        .filter(|path| !unit.imports.iter().any(|import| import.covers(path)))
        .collect();
    missing.sort();
    missing.dedup();
    if missing.is_empty() {
        return None;
    }

    let lines: String = missing
        .iter()
        .map(|path| format!("import {path};"))
        .collect::<Vec<_>>()
        .join("\n");

    if let Some(last) = unit.imports.iter().max_by_key(|import| import.span.hi) {
        let offset = (last.span.hi as usize).min(source.len());
        return Some(TextEdit::insert(offset, format!("\n{lines}")));
    }
    if let Some(package) = unit.package_span {
        let offset = (package.hi as usize).min(source.len());
        return Some(TextEdit::insert(offset, format!("\n\n{lines}")));
    }
    Some(TextEdit::insert(0, format!("{lines}\n\n")))
}
