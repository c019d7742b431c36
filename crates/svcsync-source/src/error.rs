//! Error types for the source model
//!
//! - Parse operations (file → [`SourceFile`](crate::SourceFile))
//! - Format operations (buffer → canonical buffer)
//! - Write operations (buffer → file)

use std::path::PathBuf;

/// Errors while reading or parsing a source file
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// IO error during file read
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Grammar could not be loaded into the parser
    #[error("parser initialization failed: {0}")]
    ParserInit(String),

    /// Parser produced no tree (cancelled or timed out)
    #[error("parse failed for {path}")]
    ParseFailed { path: PathBuf },

    /// Syntax error in source file
    #[error("syntax error in {path} at {line}:{column}: {message}")]
    Syntax {
        path: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },

    /// Same method name declared twice on one type
    #[error("duplicate method {type_name}.{method} in {path}")]
    DuplicateProcedure {
        path: PathBuf,
        type_name: String,
        method: String,
    },
}

impl ParseError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create syntax error for path
    pub fn syntax_error(
        path: impl Into<PathBuf>,
        line: usize,
        column: usize,
        message: impl Into<String>,
    ) -> Self {
        Self::Syntax {
            path: path.into(),
            line,
            column,
            message: message.into(),
        }
    }
}

/// Errors during canonical reformatting
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    /// Formatter process could not be started
    #[error("failed to run formatter {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Formatter rejected the buffer
    #[error("formatter {program} exited with {status}: {stderr}")]
    Rejected {
        program: String,
        status: std::process::ExitStatus,
        stderr: String,
    },

    /// Scratch file for the formatter could not be prepared
    #[error("formatter scratch file: {0}")]
    Scratch(#[source] std::io::Error),

    /// Formatter produced non UTF-8 output
    #[error("formatter {program} produced invalid utf-8")]
    InvalidOutput { program: String },

    /// Buffer could not be parsed to locate raw strings
    #[error("failed to parse buffer: {0}")]
    Parse(String),
}

/// Errors during file egress
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    /// Buffer could not be formatted
    #[error("format error for {path}: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: FormatError,
    },

    /// IO error during file write
    #[error("io error writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl WriteError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syntax_error_display() {
        let err = ParseError::syntax_error("greeter.go", 3, 7, "unexpected `}`");
        assert_eq!(
            err.to_string(),
            "syntax error in greeter.go at 3:7: unexpected `}`"
        );
    }

    #[test]
    fn duplicate_display() {
        let err = ParseError::DuplicateProcedure {
            path: "a.go".into(),
            type_name: "GreeterService".into(),
            method: "SayHello".into(),
        };
        assert_eq!(
            err.to_string(),
            "duplicate method GreeterService.SayHello in a.go"
        );
    }

    #[test]
    fn write_io_error_keeps_path() {
        let err = WriteError::io_error(
            "svc/a.go",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.to_string().contains("svc/a.go"));
    }
}
