//! Marker identity recognition
//!
//! The scaffold generator embeds an `Unimplemented<Contract>Server` field in
//! every service struct it emits. That embedded type name survives renames
//! of the struct itself and is used as its identity.

use crate::source::TypeDeclaration;

/// Recognises marker fields among a struct's embedded field types
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerPattern {
    prefix: String,
    suffix: String,
}

impl MarkerPattern {
    /// Create pattern from prefix and suffix
    #[inline]
    #[must_use]
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }

    /// Marker prefix (`Unimplemented` by default)
    #[inline]
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Marker suffix (`Server` by default)
    #[inline]
    #[must_use]
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Marker name expected for a contract, e.g. `UnimplementedGreeterServer`
    #[must_use]
    pub fn for_contract(&self, contract: &str) -> String {
        format!("{}{}{}", self.prefix, contract, self.suffix)
    }

    /// Check a single embedded type name, returning it without qualifier
    ///
    /// `v1.UnimplementedGreeterServer` → `UnimplementedGreeterServer`
    #[must_use]
    pub fn identify<'a>(&self, embedded: &'a str) -> Option<&'a str> {
        let name = strip_qualifier(embedded);
        (name.contains(self.prefix.as_str()) && name.ends_with(self.suffix.as_str()))
            .then_some(name)
    }

    /// Marker identity of a type: the first embedded field that matches
    #[must_use]
    pub fn marker_of<'a>(&self, decl: &'a TypeDeclaration) -> Option<&'a str> {
        decl.embedded().iter().find_map(|e| self.identify(e))
    }
}

impl Default for MarkerPattern {
    fn default() -> Self {
        Self::new("Unimplemented", "Server")
    }
}

/// Drop the package qualifier (and any type arguments) from a type name
#[must_use]
pub fn strip_qualifier(type_name: &str) -> &str {
    let base = type_name
        .split_once('[')
        .map_or(type_name, |(head, _)| head)
        .trim()
        .trim_start_matches('*');
    base.rsplit_once('.').map_or(base, |(_, name)| name)
}
