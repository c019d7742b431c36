//! Error types for the merge engine

use std::path::PathBuf;

use svcsync_source::{ParseError, WriteError};

/// Errors while reconciling files
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    /// Source file could not be read or parsed
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Mutated buffer could not be formatted or written
    #[error(transparent)]
    Write(#[from] WriteError),

    /// Directory walk failed
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// IO error outside the parse and write paths
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl MergeError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result alias for merge operations
pub type Result<T> = std::result::Result<T, MergeError>;
