//! Deprecation demotion
//!
//! A procedure that disappeared from the contract keeps its body but loses
//! its exported name: `SayHello` becomes `sayHello`. Only the identifier is
//! touched. Demotion is one-way; a procedure later re-added to the contract
//! is added again as a fresh stub next to the demoted one.
//!
//! Per implementation type:
//!
//! - matched: procedures absent from the counterpart are demoted
//! - unmatched, marker present in the scaffold: every procedure is demoted
//! - unmatched otherwise: the type belongs to another contract (or is a
//!   plain helper) and is left alone

use std::collections::HashSet;
use std::ops::Range;

use svcsync_source::text::{is_exported, lower_first, splice};
use svcsync_source::{format_and_write, CodeFormatter, MarkerPattern, Procedure, SourceFile};

use crate::error::Result;
use crate::matcher::EntityMatcher;

/// Renamed buffer for an implementation file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Demotion {
    buffer: String,
    renamed: Vec<String>,
}

impl Demotion {
    /// Buffer with the identifiers renamed
    #[inline]
    #[must_use]
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Original names of the renamed procedures
    #[inline]
    #[must_use]
    pub fn renamed(&self) -> &[String] {
        &self.renamed
    }
}

/// Procedures of `old` that the scaffold no longer declares
///
/// A type with a scaffold counterpart loses the procedures the counterpart
/// lacks. A marked type whose marker the scaffold still carries under a
/// different name is demoted whole. An unmarked type without counterpart is
/// treated as a helper sharing the file and keeps every exported method;
/// it is not demoted wholesale.
#[must_use]
pub fn stale<'a>(
    old: &'a SourceFile,
    new: &SourceFile,
    matcher: &EntityMatcher,
    pattern: &MarkerPattern,
) -> Vec<&'a Procedure> {
    let scaffold_markers: HashSet<&str> = new.types().filter_map(|t| pattern.marker_of(t)).collect();
    let mut marked = Vec::new();

    for old_type in old.types() {
        if let Some(found) = matcher.find_counterpart(old_type, new) {
            for procedure in old_type.procedures() {
                if found.counterpart.contains(procedure.name()) {
                    tracing::trace!(method = procedure.name(), "retained");
                } else {
                    tracing::debug!(type_name = old_type.name(), method = procedure.name(), "to demote");
                    marked.push(procedure);
                }
            }
            continue;
        }

        match pattern.marker_of(old_type) {
            Some(marker) if scaffold_markers.contains(marker) => {
                tracing::debug!(type_name = old_type.name(), marker, "type vanished, demoting all");
                marked.extend(old_type.procedures());
            }
            Some(marker) => {
                tracing::debug!(type_name = old_type.name(), marker, "other contract, skipping");
            }
            None => {
                tracing::debug!(type_name = old_type.name(), "unmarked type without counterpart, skipping");
            }
        }
    }
    marked
}

/// Compute the demoted buffer, or `None` when no identifier changes
#[must_use]
pub fn demote(
    old: &SourceFile,
    new: &SourceFile,
    matcher: &EntityMatcher,
    pattern: &MarkerPattern,
) -> Option<Demotion> {
    let mut edits: Vec<(Range<usize>, String)> = Vec::new();
    let mut renamed = Vec::new();

    for procedure in stale(old, new, matcher, pattern) {
        let name = procedure.name();
        if !is_exported(name) {
            continue;
        }
        let lowered = lower_first(name);
        if lowered.len() != name.len() {
            tracing::debug!(method = name, "case fold changes length, splicing");
        }
        edits.push((procedure.name_span(), lowered));
        renamed.push(name.to_string());
    }

    if edits.is_empty() {
        return None;
    }
    Some(Demotion {
        buffer: splice(old.code(), edits),
        renamed,
    })
}

/// Demote stale procedures of `old` in place
///
/// Returns the renamed procedure names; empty when nothing was written.
///
/// # Errors
/// Returns error if formatting or writing fails
pub fn apply(
    old: &SourceFile,
    new: &SourceFile,
    matcher: &EntityMatcher,
    pattern: &MarkerPattern,
    formatter: &dyn CodeFormatter,
) -> Result<Vec<String>> {
    let Some(demotion) = demote(old, new, matcher, pattern) else {
        return Ok(Vec::new());
    };
    if !format_and_write(old.path(), demotion.buffer(), formatter)? {
        return Ok(Vec::new());
    }
    tracing::info!(
        path = %old.path().display(),
        methods = ?demotion.renamed(),
        "unexported removed methods"
    );
    Ok(demotion.renamed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn file(code: &str) -> SourceFile {
        SourceFile::parse("x.go", code).unwrap()
    }

    fn run(old: &str, new: &str) -> Option<Demotion> {
        let pattern = MarkerPattern::default();
        demote(
            &file(old),
            &file(new),
            &EntityMatcher::standard(pattern.clone()),
            &pattern,
        )
    }

    #[test]
    fn demotes_dropped_method_in_place() {
        let old = "package p\n\ntype S struct{}\n\nfunc (s *S) A() {}\n\nfunc (s *S) B() string {\n\treturn \"B\"\n}\n";
        let new = "package p\n\ntype S struct{}\n\nfunc (s *S) A() {}\n";
        let demotion = run(old, new).unwrap();
        assert_eq!(demotion.renamed(), &["B".to_string()]);
        assert_eq!(
            demotion.buffer(),
            "package p\n\ntype S struct{}\n\nfunc (s *S) A() {}\n\nfunc (s *S) b() string {\n\treturn \"B\"\n}\n"
        );
        assert_eq!(demotion.buffer().len(), old.len());
    }

    #[test]
    fn already_unexported_is_no_change() {
        let old = "package p\n\ntype S struct{}\n\nfunc (s *S) A() {}\n\nfunc (s *S) b() {}\n";
        let new = "package p\n\ntype S struct{}\n\nfunc (s *S) A() {}\n";
        assert!(run(old, new).is_none());
    }

    #[test]
    fn other_contract_type_is_skipped() {
        let old = "package p\n\ntype Other struct {\n\tpb.UnimplementedOtherServer\n}\n\nfunc (o *Other) Keep() {}\n";
        let new = "package p\n\ntype S struct {\n\tpb.UnimplementedSServer\n}\n";
        assert!(run(old, new).is_none());
    }

    #[test]
    fn unmarked_helper_is_skipped() {
        let old = "package p\n\ntype helper struct{}\n\nfunc (h *helper) Do() {}\n";
        let new = "package p\n\ntype S struct {\n\tpb.UnimplementedSServer\n}\n";
        assert!(run(old, new).is_none());
    }

    #[test]
    fn helper_beside_service_keeps_exported_methods() {
        let old = concat!(
            "package p\n\ntype S struct {\n\tpb.UnimplementedSServer\n}\n\n",
            "type cache struct{}\n\n",
            "func (s *S) A() {}\n\nfunc (s *S) Gone() {}\n\n",
            "func (c *cache) Get() {}\n\nfunc (c *cache) Put() {}\n",
        );
        let new = "package p\n\ntype S struct {\n\tpb.UnimplementedSServer\n}\n\nfunc (s *S) A() {}\n";
        let demotion = run(old, new).unwrap();
        assert_eq!(demotion.renamed(), &["Gone".to_string()]);
        assert!(demotion.buffer().contains("func (s *S) gone() {}"));
        assert!(demotion.buffer().contains("func (c *cache) Get() {}\n\nfunc (c *cache) Put() {}"));
    }

    #[test]
    fn vanished_type_with_scaffold_marker_is_demoted_whole() {
        let pattern = MarkerPattern::default();
        let old = file("package p\n\ntype Foo struct {\n\tpb.UnimplementedSServer\n}\n\nfunc (f *Foo) A() {}\n\nfunc (f *Foo) B() {}\n");
        let new = file("package p\n\ntype S struct {\n\tpb.UnimplementedSServer\n}\n");
        // a name-only matcher cannot pair Foo with S, the marker set still covers it
        let matcher = EntityMatcher::new().with_strategy(crate::matcher::NameMatch);
        let demotion = demote(&old, &new, &matcher, &pattern).unwrap();
        assert_eq!(demotion.renamed(), &["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn non_ascii_fold_splices() {
        let old = "package p\n\ntype S struct{}\n\nfunc (s *S) ẞig() {}\n\nfunc (s *S) Ωmega() {}\n";
        let new = "package p\n\ntype S struct{}\n";
        let demotion = run(old, new).unwrap();
        assert!(demotion.buffer().contains("func (s *S) ßig() {}"));
        assert!(demotion.buffer().contains("func (s *S) ωmega() {}"));
        assert_eq!(demotion.buffer().len(), old.len() - 1);
    }
}
