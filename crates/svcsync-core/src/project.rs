//! Project root discovery

use std::path::{Path, PathBuf};

use crate::error::{Result, SyncError};

/// Module file marking a Go project root
pub const PROJECT_MARKER: &str = "go.mod";

/// Walk up from `start` to the first directory holding `go.mod`
///
/// Returns the project root and the path of `start` relative to it.
///
/// # Errors
/// Returns `SyncError::Precondition` if no ancestor holds `go.mod`
pub fn find_project_root(start: &Path) -> Result<(PathBuf, PathBuf)> {
    for dir in start.ancestors() {
        if dir.join(PROJECT_MARKER).is_file() {
            let middle = start.strip_prefix(dir).unwrap_or(Path::new("")).to_path_buf();
            tracing::debug!(root = %dir.display(), middle = %middle.display(), "project root");
            return Ok((dir.to_path_buf(), middle));
        }
    }
    Err(SyncError::precondition(format!(
        "no {PROJECT_MARKER} found in {} or any parent directory",
        start.display()
    )))
}
