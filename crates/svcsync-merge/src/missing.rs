//! Missing-procedure detection
//!
//! Collects the verbatim text of every procedure the scaffold declares and
//! the implementation lacks, plus whole types the implementation has no
//! counterpart for. The collected text is appended to the end of the
//! implementation file.

use svcsync_source::text::splice;
use svcsync_source::{format_and_write, CodeFormatter, Procedure, SourceFile};

use crate::error::Result;
use crate::matcher::EntityMatcher;

/// One procedure scheduled for addition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Addition {
    /// Type in the implementation file that receives the procedure
    pub type_name: String,
    /// Procedure name
    pub procedure: String,
}

/// Code to append to an implementation file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MissingCode {
    code: String,
    additions: Vec<Addition>,
    new_types: Vec<String>,
}

impl MissingCode {
    /// Trimmed text to append
    #[inline]
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Procedures carried by [`code`](Self::code)
    #[inline]
    #[must_use]
    pub fn additions(&self) -> &[Addition] {
        &self.additions
    }

    /// Types emitted whole because nothing matched them
    #[inline]
    #[must_use]
    pub fn new_types(&self) -> &[String] {
        &self.new_types
    }

    /// Check if there is nothing to append
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }
}

/// Collect scaffold declarations absent from the implementation
#[must_use]
pub fn detect(old: &SourceFile, new: &SourceFile, matcher: &EntityMatcher) -> MissingCode {
    let mut pieces = Vec::new();
    let mut additions = Vec::new();
    let mut new_types = Vec::new();

    for new_type in new.types() {
        let Some(found) = matcher.find_counterpart(new_type, old) else {
            tracing::debug!(type_name = new_type.name(), "adding whole type");
            pieces.push(format!("type {}", new.text(new_type.spec())));
            for procedure in new_type.procedures() {
                pieces.push(new.text(procedure.full_span()).to_string());
                additions.push(Addition {
                    type_name: new_type.name().to_string(),
                    procedure: procedure.name().to_string(),
                });
            }
            new_types.push(new_type.name().to_string());
            continue;
        };

        let owner = found.counterpart;
        let renamed = found.is_renamed(new_type);
        for procedure in new_type.procedures() {
            if owner.contains(procedure.name()) {
                tracing::trace!(method = procedure.name(), "exists");
                continue;
            }
            tracing::debug!(type_name = owner.name(), method = procedure.name(), "to add");
            let text = if renamed {
                rebind(new, procedure, owner.name())
            } else {
                new.text(procedure.full_span()).to_string()
            };
            pieces.push(text);
            additions.push(Addition {
                type_name: owner.name().to_string(),
                procedure: procedure.name().to_string(),
            });
        }
    }

    MissingCode {
        code: pieces.join("\n\n").trim().to_string(),
        additions,
        new_types,
    }
}

/// Procedure text with its receiver type identifier replaced by `binding`
fn rebind(file: &SourceFile, procedure: &Procedure, binding: &str) -> String {
    let full = procedure.full_span();
    let receiver = procedure.binding_span();
    let local = receiver.start - full.start..receiver.end - full.start;
    splice(file.text(full), vec![(local, binding.to_string())])
}

/// Append `missing` to `old` and write it back
///
/// Returns `true` when the file was written.
///
/// # Errors
/// Returns error if formatting or writing fails
pub fn append(old: &SourceFile, missing: &MissingCode, formatter: &dyn CodeFormatter) -> Result<bool> {
    if missing.is_empty() {
        return Ok(false);
    }
    let combined = format!("{}\n{}", old.code(), missing.code());
    let wrote = format_and_write(old.path(), &combined, formatter)?;
    if wrote {
        tracing::info!(
            path = %old.path().display(),
            added = missing.additions().len(),
            "added missing methods"
        );
    }
    Ok(wrote)
}
