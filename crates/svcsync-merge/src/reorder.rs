//! Procedure block reordering
//!
//! Sorts an implementation type's procedures into the scaffold's
//! declaration order by moving whole blocks of text. A block runs from a
//! retained procedure's doc comment (or `func`) up to the next retained
//! procedure's block start, so custom code written between two procedures
//! travels with the one above it. Everything before the first retained
//! procedure is the head and never moves.

use std::ops::Range;

use svcsync_source::{Procedure, SourceFile, TypeDeclaration};

/// A movable slice of the implementation buffer
#[derive(Debug, Clone, PartialEq, Eq)]
struct Block {
    name: String,
    range: Range<usize>,
    rank: usize,
}

/// Reordered buffer for one type, or `None` when nothing moves
///
/// `old_type` must belong to `old`. Procedures of `old_type` that
/// `new_type` does not declare are not blocks of their own.
#[must_use]
pub fn reorder(old: &SourceFile, old_type: &TypeDeclaration, new_type: &TypeDeclaration) -> Option<String> {
    let retained: Vec<&Procedure> = old_type
        .procedures()
        .filter(|p| new_type.contains(p.name()))
        .collect();
    let first = retained.first()?;

    let code = old.code();
    let head = &code[..first.block_start()];
    let mut blocks: Vec<Block> = retained
        .iter()
        .enumerate()
        .map(|(idx, procedure)| {
            let end = retained
                .get(idx + 1)
                .map_or(code.len(), |next| next.block_start());
            Block {
                name: procedure.name().to_string(),
                range: procedure.block_start()..end,
                rank: new_type.position(procedure.name()).unwrap_or(usize::MAX),
            }
        })
        .collect();

    if blocks.windows(2).all(|pair| pair[0].rank <= pair[1].rank) {
        tracing::debug!(type_name = old_type.name(), "already sorted");
        return None;
    }

    blocks.sort_by_key(|block| block.rank);
    tracing::debug!(
        type_name = old_type.name(),
        order = ?blocks.iter().map(|b| b.name.as_str()).collect::<Vec<_>>(),
        "sorted blocks"
    );

    let mut out = String::with_capacity(code.len() + blocks.len() + 1);
    out.push_str(head);
    out.push('\n');
    for block in &blocks {
        out.push_str(&code[block.range.clone()]);
        out.push('\n');
    }
    Some(out)
}
