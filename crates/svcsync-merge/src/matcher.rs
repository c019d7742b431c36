//! Entity matching
//!
//! Pairs a struct type with its counterpart in another file. Strategies are
//! tried in order and the first hit wins:
//!
//! 1. [`NameMatch`]: identical declared name
//! 2. [`MarkerMatch`]: identical embedded marker (`Unimplemented<Contract>Server`)
//!
//! Implementations are routinely renamed to business names while the
//! generator keeps embedding the same marker, so the marker pass catches
//! what the name pass misses. Matching is symmetric: the same matcher pairs
//! old→new and new→old.

use std::fmt;

use svcsync_source::{MarkerPattern, SourceFile, TypeDeclaration};

/// Which strategy produced a pairing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchKind {
    /// Same declared name
    Name,
    /// Same embedded marker
    Marker,
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name => write!(f, "name"),
            Self::Marker => write!(f, "marker"),
        }
    }
}

/// One way of locating a type's counterpart
pub trait MatchStrategy: Send + Sync + fmt::Debug {
    /// Find the counterpart of `target` among the types of `candidates`
    fn find<'a>(
        &self,
        target: &TypeDeclaration,
        candidates: &'a SourceFile,
    ) -> Option<&'a TypeDeclaration>;

    /// Kind reported for pairings made by this strategy
    fn kind(&self) -> MatchKind;
}

/// Pair types with the same declared name
#[derive(Debug, Clone, Copy, Default)]
pub struct NameMatch;

impl MatchStrategy for NameMatch {
    fn find<'a>(
        &self,
        target: &TypeDeclaration,
        candidates: &'a SourceFile,
    ) -> Option<&'a TypeDeclaration> {
        candidates.type_decl(target.name())
    }

    fn kind(&self) -> MatchKind {
        MatchKind::Name
    }
}

/// Pair types embedding the same marker field
#[derive(Debug, Clone, Default)]
pub struct MarkerMatch {
    pattern: MarkerPattern,
}

impl MarkerMatch {
    /// Create strategy for a marker pattern
    #[inline]
    #[must_use]
    pub fn new(pattern: MarkerPattern) -> Self {
        Self { pattern }
    }
}

impl MatchStrategy for MarkerMatch {
    fn find<'a>(
        &self,
        target: &TypeDeclaration,
        candidates: &'a SourceFile,
    ) -> Option<&'a TypeDeclaration> {
        let marker = self.pattern.marker_of(target)?;
        candidates
            .types()
            .find(|candidate| self.pattern.marker_of(candidate) == Some(marker))
    }

    fn kind(&self) -> MatchKind {
        MatchKind::Marker
    }
}

/// A located counterpart
#[derive(Debug, Clone, Copy)]
pub struct TypeMatch<'a> {
    /// The paired type in the other file
    pub counterpart: &'a TypeDeclaration,
    /// Strategy that found it
    pub kind: MatchKind,
}

impl TypeMatch<'_> {
    /// Check if the pairing crosses a rename
    #[inline]
    #[must_use]
    pub fn is_renamed(&self, target: &TypeDeclaration) -> bool {
        self.counterpart.name() != target.name()
    }
}

/// Ordered list of match strategies
#[derive(Debug, Default)]
pub struct EntityMatcher {
    strategies: Vec<Box<dyn MatchStrategy>>,
}

impl EntityMatcher {
    /// Create matcher with no strategies
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Name first, then marker
    #[must_use]
    pub fn standard(pattern: MarkerPattern) -> Self {
        Self::new()
            .with_strategy(NameMatch)
            .with_strategy(MarkerMatch::new(pattern))
    }

    /// Append a strategy
    #[must_use]
    pub fn with_strategy(mut self, strategy: impl MatchStrategy + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    /// Number of strategies
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    /// Check if no strategy is registered
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Find the counterpart of `target` in `candidates`
    pub fn find_counterpart<'a>(
        &self,
        target: &TypeDeclaration,
        candidates: &'a SourceFile,
    ) -> Option<TypeMatch<'a>> {
        for strategy in &self.strategies {
            if let Some(counterpart) = strategy.find(target, candidates) {
                tracing::debug!(
                    type_name = target.name(),
                    counterpart = counterpart.name(),
                    via = %strategy.kind(),
                    "matched type"
                );
                return Some(TypeMatch {
                    counterpart,
                    kind: strategy.kind(),
                });
            }
        }
        tracing::debug!(type_name = target.name(), "no counterpart");
        None
    }
}
