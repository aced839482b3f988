//! Source discovery

use crate::cli::FilesConfig;
use crate::{CliError, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

fn has_source_extension(path: &Path, files: &FilesConfig) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| files.extensions.iter().any(|wanted| wanted == ext))
}

/// Expand `inputs` into source files. Files are taken as given; directories
/// are walked, skipping excluded directory names. The result is sorted and
/// deduplicated.
pub fn collect_source_files(inputs: &[PathBuf], files: &FilesConfig) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for input in inputs {
        if input.is_file() {
            found.push(input.clone());
            continue;
        }
        if !input.is_dir() {
            return Err(CliError::InvalidInput(format!(
                "Input path does not exist: {}",
                input.display()
            )));
        }
        let walker = WalkDir::new(input).follow_links(false).into_iter().filter_entry(|entry| {
            entry.depth() == 0
                || !entry.file_type().is_dir()
                || !entry
                    .file_name()
                    .to_str()
                    .map_or(false, |name| files.exclude_dirs.iter().any(|dir| dir == name))
        });
        for entry in walker {
            let entry = entry.map_err(|e| CliError::Io(e.into()))?;
            if entry.file_type().is_file() && has_source_extension(entry.path(), files) {
                found.push(entry.into_path());
            }
        }
    }
    found.sort();
    found.dedup();
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_walks_directories_and_skips_excluded() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src/app")).unwrap();
        fs::create_dir_all(dir.path().join("build")).unwrap();
        fs::write(dir.path().join("src/app/A.java"), "class A {}").unwrap();
        fs::write(dir.path().join("src/app/notes.txt"), "").unwrap();
        fs::write(dir.path().join("build/B.java"), "class B {}").unwrap();

        let files = collect_source_files(&[dir.path().to_path_buf()], &FilesConfig::default()).unwrap();
        assert_eq!(files, vec![dir.path().join("src/app/A.java")]);
    }

    #[test]
    fn test_missing_input_is_rejected() {
        let err = collect_source_files(&[PathBuf::from("/nonexistent/src")], &FilesConfig::default())
            .unwrap_err();
        assert!(matches!(err, CliError::InvalidInput(_)));
    }
}
