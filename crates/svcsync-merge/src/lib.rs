//! svcsync Merge Engine
//!
//! Structural diff and merge between a hand-maintained Go service file and
//! a freshly regenerated scaffold of the same contract.
//!
//! # Core Concepts
//!
//! - [`EntityMatcher`]: pairs struct types across files by name, then by marker
//! - [`missing`]: procedures declared in the scaffold but absent from the implementation
//! - [`demote`]: procedures dropped from the contract, renamed to unexported form
//! - [`reorder`]: procedure blocks sorted into the scaffold's declaration order
//! - [`ImportRewriter`]: placeholder type references normalized before diffing
//! - [`Reconciler`]: runs add, demote and reorder against one file pair
//!
//! Every step writes through
//! [`format_and_write`](svcsync_source::format_and_write) and the file is
//! parsed again before the next step reads it.

#![warn(unreachable_pub)]

pub mod demote;
pub mod error;
pub mod imports;
pub mod matcher;
pub mod missing;
pub mod reorder;
pub mod sync;

pub use error::{MergeError, Result};
pub use imports::{ImportRewriter, RewriteRule};
pub use matcher::{EntityMatcher, MarkerMatch, MatchKind, MatchStrategy, NameMatch, TypeMatch};
pub use sync::{FileOutcome, Reconciler};
