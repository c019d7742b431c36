//! Placeholder import rewriting
//!
//! The scaffold generator spells well-known protobuf types as
//! `pb.google_protobuf_<Name>` placeholders. They are replaced with the
//! canonical `wrapperspb` / `emptypb` types, and the packages of the rules
//! that fired are imported, before any scaffold is diffed.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use svcsync_source::{format_and_write, parse_tree, CodeFormatter};
use tree_sitter::Node;
use walkdir::WalkDir;

use crate::error::{MergeError, Result};

/// One placeholder substitution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteRule {
    /// Text emitted by the generator
    pub placeholder: String,
    /// Replacement type reference
    pub canonical: String,
    /// Import path providing the replacement
    pub import_path: String,
}

impl RewriteRule {
    /// Create rule
    #[must_use]
    pub fn new(
        placeholder: impl Into<String>,
        canonical: impl Into<String>,
        import_path: impl Into<String>,
    ) -> Self {
        Self {
            placeholder: placeholder.into(),
            canonical: canonical.into(),
            import_path: import_path.into(),
        }
    }
}

/// Fixed-table placeholder rewriter
#[derive(Debug, Clone, Default)]
pub struct ImportRewriter {
    rules: Vec<RewriteRule>,
}

impl ImportRewriter {
    /// Create rewriter with no rules
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rewriter with the well-known protobuf wrapper rules
    #[must_use]
    pub fn standard() -> Self {
        Self::new()
            .with_rule(RewriteRule::new(
                "pb.google_protobuf_StringValue",
                "wrapperspb.StringValue",
                "google.golang.org/protobuf/types/known/wrapperspb",
            ))
            .with_rule(RewriteRule::new(
                "pb.google_protobuf_Empty",
                "emptypb.Empty",
                "google.golang.org/protobuf/types/known/emptypb",
            ))
    }

    /// Append a rule
    #[must_use]
    pub fn with_rule(mut self, rule: RewriteRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Registered rules in priority order
    #[inline]
    #[must_use]
    pub fn rules(&self) -> &[RewriteRule] {
        &self.rules
    }

    /// Rewrite one buffer, or `None` when no placeholder occurs
    ///
    /// # Errors
    /// Returns `ParseError` if the rewritten buffer is not valid Go
    pub fn rewrite_source(&self, code: &str, path: &Path) -> Result<Option<String>> {
        let (replaced, fired) = self.substitute(code);
        if fired.is_empty() {
            return Ok(None);
        }
        let imports: Vec<&str> = fired
            .into_iter()
            .map(|idx| self.rules[idx].import_path.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        inject_imports(&replaced, &imports, path).map(Some)
    }

    /// Rewrite every `.go` file under `root` in place
    ///
    /// Returns the files that were written.
    ///
    /// # Errors
    /// Returns error if a file cannot be read, parsed or written
    pub fn rewrite_tree(&self, root: &Path, formatter: &dyn CodeFormatter) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry?;
            let path = entry.path();
            if !entry.file_type().is_file() || path.extension().map_or(true, |ext| ext != "go") {
                continue;
            }
            let code = std::fs::read_to_string(path).map_err(|e| MergeError::io_error(path, e))?;
            let Some(rewritten) = self.rewrite_source(&code, path)? else {
                continue;
            };
            if format_and_write(path, &rewritten, formatter)? {
                tracing::info!(path = %path.display(), "replaced proto imports");
                written.push(path.to_path_buf());
            }
        }
        Ok(written)
    }

    /// Single left-to-right pass; at each offset the first matching rule wins
    fn substitute(&self, code: &str) -> (String, BTreeSet<usize>) {
        let mut out = String::with_capacity(code.len());
        let mut fired = BTreeSet::new();
        let mut rest = code;

        'scan: while let Some(ch) = rest.chars().next() {
            for (idx, rule) in self.rules.iter().enumerate() {
                if !rule.placeholder.is_empty() && rest.starts_with(rule.placeholder.as_str()) {
                    out.push_str(&rule.canonical);
                    rest = &rest[rule.placeholder.len()..];
                    fired.insert(idx);
                    continue 'scan;
                }
            }
            out.push(ch);
            rest = &rest[ch.len_utf8()..];
        }
        (out, fired)
    }
}

/// Add import paths that `code` does not already import
fn inject_imports(code: &str, paths: &[&str], file: &Path) -> Result<String> {
    let tree = parse_tree(code, file)?;
    let root = tree.root_node();
    let src = code.as_bytes();

    let mut present = BTreeSet::new();
    let mut block_close = None;
    let mut last_single = None;
    let mut package_end = None;

    let mut cursor = root.walk();
    for decl in root.named_children(&mut cursor) {
        match decl.kind() {
            "package_clause" => package_end = Some(decl.end_byte()),
            "import_declaration" => {
                collect_import_paths(decl, src, &mut present);
                let mut decl_cursor = decl.walk();
                let list = decl
                    .named_children(&mut decl_cursor)
                    .find(|n| n.kind() == "import_spec_list");
                match list {
                    Some(list) if block_close.is_none() => block_close = Some(list.end_byte() - 1),
                    Some(_) => {}
                    None => last_single = Some(decl.end_byte()),
                }
            }
            _ => {}
        }
    }

    let missing: Vec<&str> = paths
        .iter()
        .copied()
        .filter(|p| !present.contains(*p))
        .collect();
    if missing.is_empty() {
        return Ok(code.to_string());
    }
    tracing::debug!(imports = ?missing, "injecting imports");

    let (at, text) = if let Some(close) = block_close {
        let mut text = String::new();
        if !code[..close].ends_with('\n') {
            text.push('\n');
        }
        for path in &missing {
            text.push_str(&format!("\t\"{path}\"\n"));
        }
        (close, text)
    } else if let Some(end) = last_single {
        let text: String = missing.iter().map(|p| format!("\nimport \"{p}\"")).collect();
        (end, text)
    } else {
        let mut text = String::from("\n\nimport (\n");
        for path in &missing {
            text.push_str(&format!("\t\"{path}\"\n"));
        }
        text.push(')');
        (package_end.unwrap_or(0), text)
    };

    let mut out = String::with_capacity(code.len() + text.len());
    out.push_str(&code[..at]);
    out.push_str(&text);
    out.push_str(&code[at..]);
    Ok(out)
}

fn collect_import_paths(node: Node<'_>, src: &[u8], present: &mut BTreeSet<String>) {
    if node.kind() == "import_spec" {
        if let Some(path) = node.child_by_field_name("path") {
            let text = path.utf8_text(src).unwrap_or("");
            present.insert(text.trim_matches(|c| c == '"' || c == '`').to_string());
        }
        return;
    }
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        collect_import_paths(child, src, present);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use svcsync_source::LayoutFormatter;

    const SCAFFOLD: &str = r#"package service

import (
	"context"

	pb "demo/api/helloworld/v1"
)

type GreeterService struct {
	pb.UnimplementedGreeterServer
}

func (s *GreeterService) Ping(ctx context.Context, req *pb.google_protobuf_Empty) (*pb.google_protobuf_StringValue, error) {
	return &pb.google_protobuf_StringValue{}, nil
}
"#;

    #[test]
    fn replaces_placeholders_and_imports_block() {
        let out = ImportRewriter::standard()
            .rewrite_source(SCAFFOLD, Path::new("greeter.go"))
            .unwrap()
            .unwrap();
        assert!(out.contains(
            "func (s *GreeterService) Ping(ctx context.Context, req *emptypb.Empty) (*wrapperspb.StringValue, error) {"
        ));
        assert!(out.contains("return &wrapperspb.StringValue{}, nil"));
        assert!(out.contains(
            "\tpb \"demo/api/helloworld/v1\"\n\t\"google.golang.org/protobuf/types/known/emptypb\"\n\t\"google.golang.org/protobuf/types/known/wrapperspb\"\n)"
        ));
        assert!(!out.contains("google_protobuf"));
    }

    #[test]
    fn untouched_source_is_none() {
        let code = "package service\n\nimport \"context\"\n";
        let rewriter = ImportRewriter::standard();
        assert!(rewriter.rewrite_source(code, Path::new("a.go")).unwrap().is_none());
    }

    #[test]
    fn only_fired_rules_import() {
        let code = "package service\n\nimport \"context\"\n\nvar _ *pb.google_protobuf_Empty\n";
        let out = ImportRewriter::standard()
            .rewrite_source(code, Path::new("a.go"))
            .unwrap()
            .unwrap();
        assert_eq!(
            out,
            "package service\n\nimport \"context\"\nimport \"google.golang.org/protobuf/types/known/emptypb\"\n\nvar _ *emptypb.Empty\n"
        );
    }

    #[test]
    fn existing_import_not_duplicated() {
        let code = "package service\n\nimport (\n\t\"google.golang.org/protobuf/types/known/emptypb\"\n)\n\nvar _ *pb.google_protobuf_Empty\n";
        let out = ImportRewriter::standard()
            .rewrite_source(code, Path::new("a.go"))
            .unwrap()
            .unwrap();
        assert_eq!(out.matches("known/emptypb").count(), 1);
    }

    #[test]
    fn no_imports_opens_block_after_package() {
        let code = "package service\n\nvar _ pb.google_protobuf_Empty\n";
        let out = ImportRewriter::standard()
            .rewrite_source(code, Path::new("a.go"))
            .unwrap()
            .unwrap();
        assert_eq!(
            out,
            "package service\n\nimport (\n\t\"google.golang.org/protobuf/types/known/emptypb\"\n)\n\nvar _ emptypb.Empty\n"
        );
    }

    #[test]
    fn custom_rule() {
        let rewriter = ImportRewriter::new().with_rule(RewriteRule::new(
            "pb.google_protobuf_Timestamp",
            "timestamppb.Timestamp",
            "google.golang.org/protobuf/types/known/timestamppb",
        ));
        let out = rewriter
            .rewrite_source("package s\n\nvar _ pb.google_protobuf_Timestamp\n", Path::new("a.go"))
            .unwrap()
            .unwrap();
        assert!(out.contains("timestamppb.Timestamp"));
        assert!(out.contains("\"google.golang.org/protobuf/types/known/timestamppb\""));
    }

    #[test]
    fn rewrite_tree_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let go = dir.path().join("greeter.go");
        let other = dir.path().join("notes.txt");
        std::fs::write(&go, SCAFFOLD).unwrap();
        std::fs::write(&other, "pb.google_protobuf_Empty").unwrap();

        let rewriter = ImportRewriter::standard();
        let written = rewriter.rewrite_tree(dir.path(), &LayoutFormatter).unwrap();
        assert_eq!(written, vec![go.clone()]);
        assert_eq!(std::fs::read_to_string(&other).unwrap(), "pb.google_protobuf_Empty");

        let first = std::fs::read_to_string(&go).unwrap();
        let written = rewriter.rewrite_tree(dir.path(), &LayoutFormatter).unwrap();
        assert!(written.is_empty());
        assert_eq!(std::fs::read_to_string(&go).unwrap(), first);
    }
}
