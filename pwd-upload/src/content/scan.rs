use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::warn;
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("unable to walk content directory: {0}")]
    Walk(String),
}

/// Lists every `*.md` file below `root`, recursively, sorted by path.
/// A missing root holds no posts.
pub fn markdown_files(root: &Path) -> Result<Vec<PathBuf>, ScanError> {
    if !root.is_dir() {
        warn!(root = %root.display(), "content directory not found");
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| ScanError::Walk(format!("{e}")))?;
        let is_markdown = entry.path().extension().is_some_and(|ext| ext == "md");
        if entry.file_type().is_file() && is_markdown {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}
