//! Canonical reformatting
//!
//! Every mutated buffer passes through a [`CodeFormatter`] before it is
//! written. [`GofmtFormatter`] delegates to the Go toolchain;
//! [`LayoutFormatter`] is a built-in normalizer for environments without
//! `gofmt` (and for tests).

use std::io::Write;
use std::ops::Range;
use std::path::PathBuf;
use std::process::Command;

use tree_sitter::Parser;

use crate::error::FormatError;

/// Formats a whole source buffer
pub trait CodeFormatter: Send + Sync + std::fmt::Debug {
    /// Format `code`, returning the canonical buffer
    ///
    /// # Errors
    /// Returns error if the formatter cannot run or rejects the buffer
    fn format(&self, code: &str) -> Result<String, FormatError>;

    /// Formatter name (for logging)
    fn name(&self) -> &'static str;
}

/// Runs `gofmt` on a scratch copy of the buffer
#[derive(Debug, Clone)]
pub struct GofmtFormatter {
    program: PathBuf,
}

impl GofmtFormatter {
    /// Use `gofmt` from `PATH`
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_program("gofmt")
    }

    /// Use a specific formatter binary
    #[inline]
    #[must_use]
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for GofmtFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeFormatter for GofmtFormatter {
    fn format(&self, code: &str) -> Result<String, FormatError> {
        let program = self.program.display().to_string();

        let mut scratch = tempfile::Builder::new()
            .suffix(".go")
            .tempfile()
            .map_err(FormatError::Scratch)?;
        scratch
            .write_all(code.as_bytes())
            .and_then(|()| scratch.flush())
            .map_err(FormatError::Scratch)?;

        let output = Command::new(&self.program)
            .arg(scratch.path())
            .output()
            .map_err(|source| FormatError::Spawn {
                program: program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(FormatError::Rejected {
                program,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        String::from_utf8(output.stdout).map_err(|_| FormatError::InvalidOutput { program })
    }

    fn name(&self) -> &'static str {
        "gofmt"
    }
}

/// Built-in whitespace normalizer
///
/// Strips trailing whitespace, drops leading blank lines, collapses runs of
/// blank lines to one and ends the buffer with exactly one newline. Lines
/// that start or end inside a raw string literal are copied verbatim. It
/// never reorders tokens, so it is a fixed point on its own output.
#[derive(Debug, Clone, Copy, Default)]
pub struct LayoutFormatter;

impl LayoutFormatter {
    /// Create formatter
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl CodeFormatter for LayoutFormatter {
    fn format(&self, code: &str) -> Result<String, FormatError> {
        let spans = raw_string_spans(code)?;
        let inside = |pos: usize| spans.iter().any(|r| r.start < pos && pos < r.end);

        let mut out = String::with_capacity(code.len() + 1);
        let mut blank_run = 0usize;
        let mut offset = 0usize;
        for chunk in code.split_inclusive('\n') {
            let start = offset;
            offset += chunk.len();
            let line = chunk.strip_suffix('\n').unwrap_or(chunk);
            let end = start + line.len();

            if inside(start) || inside(end) {
                if blank_run > 0 && !out.is_empty() {
                    out.push('\n');
                }
                blank_run = 0;
                out.push_str(if inside(end) { line } else { line.trim_end() });
                out.push('\n');
                continue;
            }

            let line = line.trim_end();
            if line.is_empty() {
                blank_run += 1;
                continue;
            }
            if blank_run > 0 && !out.is_empty() {
                out.push('\n');
            }
            blank_run = 0;
            out.push_str(line);
            out.push('\n');
        }
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "layout"
    }
}

/// Byte ranges of the raw string literals in `code`
///
/// Syntax errors elsewhere in the buffer do not matter here; the parser
/// recovers and the literals it does find are still reported.
fn raw_string_spans(code: &str) -> Result<Vec<Range<usize>>, FormatError> {
    if !code.contains('`') {
        return Ok(Vec::new());
    }

    let mut parser = Parser::new();
    let language: tree_sitter::Language = tree_sitter_go::LANGUAGE.into();
    parser
        .set_language(&language)
        .map_err(|e| FormatError::Parse(e.to_string()))?;
    let tree = parser
        .parse(code, None)
        .ok_or_else(|| FormatError::Parse("parser produced no tree".to_string()))?;

    let mut spans = Vec::new();
    let mut cursor = tree.walk();
    'walk: loop {
        let node = cursor.node();
        if node.kind() == "raw_string_literal" {
            spans.push(node.byte_range());
        } else if cursor.goto_first_child() {
            continue;
        }
        while !cursor.goto_next_sibling() {
            if !cursor.goto_parent() {
                break 'walk;
            }
        }
    }
    Ok(spans)
}
