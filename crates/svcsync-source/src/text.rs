//! Identifier and buffer helpers
//!
//! Go exports an identifier when its first letter is upper case. Demotion
//! lower-cases that one letter, so these helpers work on the first `char`
//! only and leave the rest of the identifier byte-for-byte intact.

use std::ops::Range;

/// Check if the first character of an identifier is upper case (exported)
#[inline]
#[must_use]
pub fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

/// Lower-case the first character of an identifier
#[must_use]
pub fn lower_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Replace byte ranges of `buffer`
///
/// Ranges must not overlap. Edits are applied from the highest offset to
/// the lowest so that every range refers to the unedited buffer, whether or
/// not a replacement changes the length.
#[must_use]
pub fn splice(buffer: &str, mut edits: Vec<(Range<usize>, String)>) -> String {
    edits.sort_by_key(|(range, _)| std::cmp::Reverse(range.start));
    let mut out = buffer.to_string();
    for (range, replacement) in edits {
        out.replace_range(range, &replacement);
    }
    out
}
