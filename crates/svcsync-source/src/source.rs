//! Parsed service files
//!
//! A [`SourceFile`] is built from the tree-sitter Go grammar. Only the
//! declaration-level structure is kept: struct types, the types they embed,
//! and the methods bound to them with exact byte ranges. Method bodies are
//! never inspected.

use std::ops::Range;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tree_sitter::{Node, Parser, Tree};

use crate::error::ParseError;
use crate::hash::ContentHash;
use crate::marker::strip_qualifier;

/// Parse Go source into a syntax tree, rejecting any syntax error
///
/// # Errors
/// - `ParseError::ParserInit` if the grammar cannot be loaded
/// - `ParseError::Syntax` if the tree contains an error or missing node
pub fn parse_tree(code: &str, path: &Path) -> Result<Tree, ParseError> {
    let mut parser = Parser::new();
    let language: tree_sitter::Language = tree_sitter_go::LANGUAGE.into();
    parser
        .set_language(&language)
        .map_err(|e| ParseError::ParserInit(e.to_string()))?;

    let tree = parser
        .parse(code, None)
        .ok_or_else(|| ParseError::ParseFailed {
            path: path.to_path_buf(),
        })?;

    let root = tree.root_node();
    if root.has_error() {
        let bad = first_error(root).unwrap_or(root);
        let position = bad.start_position();
        let message = if bad.is_missing() {
            format!("missing `{}`", bad.kind())
        } else {
            let snippet = bad.utf8_text(code.as_bytes()).unwrap_or("");
            format!("unexpected `{}`", snippet.lines().next().unwrap_or(""))
        };
        return Err(ParseError::syntax_error(
            path,
            position.row + 1,
            position.column + 1,
            message,
        ));
    }
    Ok(tree)
}

fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.is_error() || child.is_missing() {
            return Some(child);
        }
        if child.has_error() {
            return first_error(child).or(Some(child));
        }
    }
    None
}

/// One method bound to a struct type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Procedure {
    name: String,
    binding: String,
    span: Range<usize>,
    doc: Option<Range<usize>>,
    name_span: Range<usize>,
    binding_span: Range<usize>,
}

impl Procedure {
    /// Method name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the receiver's base type
    #[inline]
    #[must_use]
    pub fn binding(&self) -> &str {
        &self.binding
    }

    /// Byte range of the declaration, `func` through closing brace
    #[inline]
    #[must_use]
    pub fn span(&self) -> Range<usize> {
        self.span.clone()
    }

    /// Byte range of the doc comment group, if any
    #[inline]
    #[must_use]
    pub fn doc(&self) -> Option<Range<usize>> {
        self.doc.clone()
    }

    /// Byte range of the method identifier
    #[inline]
    #[must_use]
    pub fn name_span(&self) -> Range<usize> {
        self.name_span.clone()
    }

    /// Byte range of the receiver type identifier
    #[inline]
    #[must_use]
    pub fn binding_span(&self) -> Range<usize> {
        self.binding_span.clone()
    }

    /// Where this method's block begins: its doc comment, else `func`
    #[inline]
    #[must_use]
    pub fn block_start(&self) -> usize {
        self.doc.as_ref().map_or(self.span.start, |doc| doc.start)
    }

    /// Doc comment plus declaration
    #[inline]
    #[must_use]
    pub fn full_span(&self) -> Range<usize> {
        self.block_start()..self.span.end
    }
}

/// A struct type with its methods in declaration order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDeclaration {
    name: String,
    spec: Range<usize>,
    definition: Range<usize>,
    embedded: Vec<String>,
    procedures: IndexMap<String, Procedure>,
}

impl TypeDeclaration {
    /// Declared type name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Byte range of the type spec: name, type parameters and struct
    #[inline]
    #[must_use]
    pub fn spec(&self) -> Range<usize> {
        self.spec.clone()
    }

    /// Byte range of the `struct { ... }` expression
    #[inline]
    #[must_use]
    pub fn definition(&self) -> Range<usize> {
        self.definition.clone()
    }

    /// Embedded (anonymous) field types, qualifier stripped, in field order
    #[inline]
    #[must_use]
    pub fn embedded(&self) -> &[String] {
        &self.embedded
    }

    /// Methods in declaration order
    #[inline]
    pub fn procedures(&self) -> impl Iterator<Item = &Procedure> {
        self.procedures.values()
    }

    /// Method by name
    #[inline]
    #[must_use]
    pub fn procedure(&self, name: &str) -> Option<&Procedure> {
        self.procedures.get(name)
    }

    /// Check if a method with this name is declared
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.procedures.contains_key(name)
    }

    /// 0-based declaration index of a method
    #[inline]
    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.procedures.get_index_of(name)
    }

    /// Number of methods
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.procedures.len()
    }

    /// Check if the type has no methods
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.procedures.is_empty()
    }
}

/// A parsed Go file
#[derive(Debug, Clone)]
pub struct SourceFile {
    path: PathBuf,
    code: String,
    checksum: ContentHash,
    types: IndexMap<String, TypeDeclaration>,
}

impl SourceFile {
    /// Read and parse a file from disk
    ///
    /// # Errors
    /// - `ParseError::Io` if the file cannot be read
    /// - `ParseError::Syntax` if the file is not valid Go
    pub fn read(path: impl AsRef<Path>) -> Result<Self, ParseError> {
        let path = path.as_ref();
        let code = std::fs::read_to_string(path).map_err(|e| ParseError::io_error(path, e))?;
        Self::parse(path, code)
    }

    /// Parse an in-memory buffer labelled with `path`
    ///
    /// # Errors
    /// - `ParseError::Syntax` if the buffer is not valid Go
    /// - `ParseError::DuplicateProcedure` if a type declares a method twice
    pub fn parse(path: impl Into<PathBuf>, code: impl Into<String>) -> Result<Self, ParseError> {
        let path = path.into();
        let code = code.into();
        let tree = parse_tree(&code, &path)?;
        let types = collect_types(&tree, &code, &path)?;

        tracing::debug!(
            path = %path.display(),
            types = types.len(),
            "parsed source file"
        );

        Ok(Self {
            checksum: ContentHash::compute(code.as_bytes()),
            path,
            code,
            types,
        })
    }

    /// File path
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raw source text
    #[inline]
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Hash of the raw source text
    #[inline]
    #[must_use]
    pub fn checksum(&self) -> ContentHash {
        self.checksum
    }

    /// Source text of a byte range
    #[inline]
    #[must_use]
    pub fn text(&self, range: Range<usize>) -> &str {
        &self.code[range]
    }

    /// Struct types in declaration order
    #[inline]
    pub fn types(&self) -> impl Iterator<Item = &TypeDeclaration> {
        self.types.values()
    }

    /// Struct type by name
    #[inline]
    #[must_use]
    pub fn type_decl(&self, name: &str) -> Option<&TypeDeclaration> {
        self.types.get(name)
    }

    /// Number of struct types
    #[inline]
    #[must_use]
    pub fn type_count(&self) -> usize {
        self.types.len()
    }
}

fn collect_types(
    tree: &Tree,
    code: &str,
    path: &Path,
) -> Result<IndexMap<String, TypeDeclaration>, ParseError> {
    let root = tree.root_node();
    let src = code.as_bytes();
    let mut types = IndexMap::new();

    let mut cursor = root.walk();
    for decl in root.named_children(&mut cursor) {
        if decl.kind() != "type_declaration" {
            continue;
        }
        let mut spec_cursor = decl.walk();
        for spec in decl.named_children(&mut spec_cursor) {
            if spec.kind() != "type_spec" {
                continue;
            }
            let (Some(name), Some(ty)) = (
                spec.child_by_field_name("name"),
                spec.child_by_field_name("type"),
            ) else {
                continue;
            };
            if ty.kind() != "struct_type" {
                continue;
            }
            let name = node_text(name, src).to_string();
            tracing::trace!(name = %name, "struct type");
            types.insert(
                name.clone(),
                TypeDeclaration {
                    name,
                    spec: spec.byte_range(),
                    definition: ty.byte_range(),
                    embedded: embedded_fields(ty, src),
                    procedures: IndexMap::new(),
                },
            );
        }
    }

    let mut cursor = root.walk();
    for decl in root.named_children(&mut cursor) {
        if decl.kind() != "method_declaration" {
            continue;
        }
        let Some(procedure) = method(decl, src) else {
            continue;
        };
        let Some(owner) = types.get_mut(&procedure.binding) else {
            continue;
        };
        if owner.procedures.contains_key(&procedure.name) {
            return Err(ParseError::DuplicateProcedure {
                path: path.to_path_buf(),
                type_name: owner.name.clone(),
                method: procedure.name,
            });
        }
        owner.procedures.insert(procedure.name.clone(), procedure);
    }

    Ok(types)
}

fn method(decl: Node<'_>, src: &[u8]) -> Option<Procedure> {
    let name_node = decl.child_by_field_name("name")?;
    let receiver = decl.child_by_field_name("receiver")?;

    let mut cursor = receiver.walk();
    let param = receiver
        .named_children(&mut cursor)
        .find(|n| n.kind() == "parameter_declaration")?;
    let binding_node = base_type_identifier(param.child_by_field_name("type")?)?;

    Some(Procedure {
        name: node_text(name_node, src).to_string(),
        binding: node_text(binding_node, src).to_string(),
        span: decl.byte_range(),
        doc: doc_comment(decl),
        name_span: name_node.byte_range(),
        binding_span: binding_node.byte_range(),
    })
}

/// `*Foo`, `(Foo)`, `Foo[T]` → the `Foo` identifier node
fn base_type_identifier(node: Node<'_>) -> Option<Node<'_>> {
    match node.kind() {
        "type_identifier" => Some(node),
        "generic_type" => base_type_identifier(node.child_by_field_name("type")?),
        "pointer_type" | "parenthesized_type" => {
            let mut cursor = node.walk();
            let inner = node.named_children(&mut cursor).next()?;
            base_type_identifier(inner)
        }
        _ => None,
    }
}

/// Comment group directly above a declaration, without blank lines
fn doc_comment(decl: Node<'_>) -> Option<Range<usize>> {
    let mut expected_row = decl.start_position().row;
    let mut group: Option<Range<usize>> = None;
    let mut current = decl.prev_named_sibling();

    while let Some(comment) = current {
        if comment.kind() != "comment" || comment.end_position().row + 1 != expected_row {
            break;
        }
        if let Some(before) = comment.prev_named_sibling() {
            if before.kind() != "comment"
                && before.end_position().row == comment.start_position().row
            {
                // trails code on the same line
                break;
            }
        }
        let end = group.as_ref().map_or(comment.end_byte(), |g| g.end);
        group = Some(comment.start_byte()..end);
        expected_row = comment.start_position().row;
        current = comment.prev_named_sibling();
    }
    group
}

fn embedded_fields(struct_type: Node<'_>, src: &[u8]) -> Vec<String> {
    let mut embedded = Vec::new();
    let mut cursor = struct_type.walk();
    for list in struct_type.named_children(&mut cursor) {
        if list.kind() != "field_declaration_list" {
            continue;
        }
        let mut field_cursor = list.walk();
        for field in list.named_children(&mut field_cursor) {
            if field.kind() != "field_declaration" || field.child_by_field_name("name").is_some() {
                continue;
            }
            if let Some(ty) = field.child_by_field_name("type") {
                embedded.push(strip_qualifier(node_text(ty, src)).to_string());
            }
        }
    }
    embedded
}

#[inline]
fn node_text<'a>(node: Node<'_>, src: &'a [u8]) -> &'a str {
    node.utf8_text(src).unwrap_or("")
}
