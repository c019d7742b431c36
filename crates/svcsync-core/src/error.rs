//! Error types for orchestration
//!
//! - Preconditions checked before any work starts
//! - Generator invocation failures
//! - Configuration loading failures
//! - Everything raised by the parse, merge and write layers

use std::path::PathBuf;

use svcsync_merge::MergeError;
use svcsync_source::{ParseError, WriteError};

/// Errors of a synchronization run
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Required directory or file missing, or conflicting invocation
    #[error("precondition violated: {0}")]
    Precondition(String),

    /// Source file could not be parsed
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Merge step failed
    #[error(transparent)]
    Merge(#[from] MergeError),

    /// File could not be written
    #[error(transparent)]
    Write(#[from] WriteError),

    /// Scaffold generator failed
    #[error(transparent)]
    Generate(#[from] GenerateError),

    /// Configuration could not be loaded
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Directory walk failed
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// IO error on the project tree
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SyncError {
    /// Create precondition error
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition(message.into())
    }

    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors raised by a scaffold generator
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    /// Generator process could not be started
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Generator exited unsuccessfully
    #[error("{program} failed ({status}):\n{output}")]
    Failed {
        program: String,
        status: String,
        output: String,
    },

    /// Target directory could not be prepared
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl GenerateError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors while loading `svcsync.toml`
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File is not valid configuration
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Unknown formatter name
    #[error("unknown formatter `{0}` (expected `gofmt` or `layout`)")]
    UnknownFormatter(String),
}

/// Result alias for orchestration
pub type Result<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generator_failure_surfaces_output() {
        let err = SyncError::from(GenerateError::Failed {
            program: "kratos".into(),
            status: "exit status: 1".into(),
            output: "proto not found".into(),
        });
        let text = err.to_string();
        assert!(text.contains("kratos failed"));
        assert!(text.contains("proto not found"));
    }

    #[test]
    fn precondition_display() {
        let err = SyncError::precondition("duplicate proto-name");
        assert_eq!(err.to_string(), "precondition violated: duplicate proto-name");
    }
}
