//! Project tree walking

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use svcsync_source::{MarkerPattern, SourceFile};
use walkdir::WalkDir;

use crate::error::Result;

/// Regular files under `root` whose name ends with `suffix`, sorted
///
/// # Errors
/// Returns error if the directory cannot be walked
pub fn files_with_suffix(root: &Path, suffix: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file() && entry.file_name().to_string_lossy().ends_with(suffix) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Check if any regular file exists under `root`
///
/// # Errors
/// Returns error if the directory cannot be walked
pub fn has_files(root: &Path) -> Result<bool> {
    for entry in WalkDir::new(root) {
        if !entry?.file_type().is_dir() {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Map every marker found in `service_root` to the file declaring it
///
/// Directories named `skip_dir` are not entered. When two files declare
/// the same marker the later one in walk order wins.
///
/// # Errors
/// Returns error if the tree cannot be walked or a file fails to parse
pub fn marker_index(
    service_root: &Path,
    skip_dir: &str,
    pattern: &MarkerPattern,
) -> Result<BTreeMap<String, PathBuf>> {
    let mut index = BTreeMap::new();
    if !service_root.is_dir() {
        return Ok(index);
    }

    let walker = WalkDir::new(service_root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !(e.file_type().is_dir() && e.file_name() == skip_dir));
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() || entry.path().extension().map_or(true, |ext| ext != "go") {
            continue;
        }
        let file = SourceFile::read(entry.path())?;
        for decl in file.types() {
            if let Some(marker) = pattern.marker_of(decl) {
                tracing::debug!(marker, file = %entry.path().display(), "found mask type");
                index.insert(marker.to_string(), entry.path().to_path_buf());
            }
        }
    }
    Ok(index)
}
