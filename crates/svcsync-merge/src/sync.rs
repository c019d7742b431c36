//! Per-file reconciliation
//!
//! Runs the three merge steps against one implementation file and one
//! scaffold, strictly in order:
//!
//! 1. append missing procedures
//! 2. demote procedures dropped from the contract
//! 3. reorder procedure blocks, one implementation type at a time
//!
//! The implementation file is parsed from disk again after every write, so
//! each step sees exactly what the previous step persisted. Each step skips
//! its write when it has nothing to change, which makes a second run over
//! the same inputs a no-op.

use std::path::{Path, PathBuf};

use svcsync_source::{format_and_write, CodeFormatter, MarkerPattern, SourceFile};

use crate::error::Result;
use crate::matcher::EntityMatcher;
use crate::{demote, missing, reorder};

/// What reconciling one file changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileOutcome {
    /// Implementation file
    pub path: PathBuf,
    /// Added procedures as `Type.Method`
    pub added: Vec<String>,
    /// Demoted procedures (exported names before demotion)
    pub demoted: Vec<String>,
    /// Implementation types whose procedures were reordered
    pub reordered: Vec<String>,
    /// Number of writes to the file
    pub writes: usize,
}

impl FileOutcome {
    /// Create empty outcome for a path
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Check if the file was left as it was
    #[inline]
    #[must_use]
    pub fn is_unchanged(&self) -> bool {
        self.writes == 0
    }
}

/// Merges scaffolds into implementation files
#[derive(Debug)]
pub struct Reconciler {
    matcher: EntityMatcher,
    pattern: MarkerPattern,
    formatter: Box<dyn CodeFormatter>,
}

impl Reconciler {
    /// Create reconciler with the standard name-then-marker matcher
    #[must_use]
    pub fn new(pattern: MarkerPattern, formatter: Box<dyn CodeFormatter>) -> Self {
        Self {
            matcher: EntityMatcher::standard(pattern.clone()),
            pattern,
            formatter,
        }
    }

    /// Replace the matcher
    #[must_use]
    pub fn with_matcher(mut self, matcher: EntityMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    /// Marker pattern in use
    #[inline]
    #[must_use]
    pub fn pattern(&self) -> &MarkerPattern {
        &self.pattern
    }

    /// Formatter every write goes through
    #[inline]
    #[must_use]
    pub fn formatter(&self) -> &dyn CodeFormatter {
        self.formatter.as_ref()
    }

    /// Reconcile the implementation at `old_path` with scaffold `new`
    ///
    /// # Errors
    /// Returns error if the implementation cannot be parsed or written
    pub fn reconcile(&self, old_path: &Path, new: &SourceFile) -> Result<FileOutcome> {
        let mut outcome = FileOutcome::new(old_path);
        tracing::debug!(
            old = %old_path.display(),
            new = %new.path().display(),
            "reconciling"
        );

        let mut old = SourceFile::read(old_path)?;

        let found = missing::detect(&old, new, &self.matcher);
        if missing::append(&old, &found, self.formatter())? {
            outcome.writes += 1;
            outcome.added = found
                .additions()
                .iter()
                .map(|a| format!("{}.{}", a.type_name, a.procedure))
                .collect();
            old = SourceFile::read(old_path)?;
        }

        let demoted = demote::apply(&old, new, &self.matcher, &self.pattern, self.formatter())?;
        if !demoted.is_empty() {
            outcome.writes += 1;
            outcome.demoted = demoted;
        }

        for new_type in new.types() {
            let old = SourceFile::read(old_path)?;
            let Some(found) = self.matcher.find_counterpart(new_type, &old) else {
                continue;
            };
            let Some(buffer) = reorder::reorder(&old, found.counterpart, new_type) else {
                continue;
            };
            if format_and_write(old_path, &buffer, self.formatter())? {
                tracing::info!(
                    path = %old_path.display(),
                    type_name = found.counterpart.name(),
                    "sorted methods"
                );
                outcome.writes += 1;
                outcome.reordered.push(found.counterpart.name().to_string());
            }
        }

        Ok(outcome)
    }
}
