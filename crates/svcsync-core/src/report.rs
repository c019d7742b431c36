//! Run summary

use std::fmt;
use std::path::PathBuf;

use svcsync_merge::FileOutcome;

/// What one synchronization run changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Contracts generated straight into the implementation directory
    pub created: Vec<String>,
    /// Staged files moved into the implementation directory unchanged
    pub relocated: Vec<PathBuf>,
    /// Per-file reconciliation outcomes
    pub files: Vec<FileOutcome>,
    /// Staged files rewritten by the import rewriter
    pub rewritten: usize,
}

impl SyncReport {
    /// Create empty report
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of procedures appended
    #[must_use]
    pub fn procedures_added(&self) -> usize {
        self.files.iter().map(|f| f.added.len()).sum()
    }

    /// Number of procedures demoted
    #[must_use]
    pub fn procedures_demoted(&self) -> usize {
        self.files.iter().map(|f| f.demoted.len()).sum()
    }

    /// Number of files with at least one reordered type
    #[must_use]
    pub fn files_reordered(&self) -> usize {
        self.files.iter().filter(|f| !f.reordered.is_empty()).count()
    }

    /// Number of implementation files written, counting relocations
    #[must_use]
    pub fn files_written(&self) -> usize {
        self.files.iter().filter(|f| !f.is_unchanged()).count() + self.relocated.len()
    }

    /// Check if the implementation directory was left as it was
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.created.is_empty() && self.files_written() == 0
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "created {} contract(s), added {} method(s), demoted {} method(s), reordered {} file(s), wrote {} file(s)",
            self.created.len(),
            self.procedures_added(),
            self.procedures_demoted(),
            self.files_reordered(),
            self.files_written()
        )
    }
}
