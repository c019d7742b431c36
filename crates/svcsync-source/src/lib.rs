//! svcsync Source Model
//!
//! Parses Go service implementation files into a structured model of
//! struct types and their bound methods, with exact byte ranges for
//! verbatim extraction and in-place mutation.
//!
//! # Core Concepts
//!
//! - [`SourceFile`]: a parsed file, its raw buffer and its struct types
//! - [`TypeDeclaration`]: one struct type with its methods in declaration order
//! - [`Procedure`]: one method with its declaration, doc, name and receiver ranges
//! - [`MarkerPattern`]: recognises the embedded `Unimplemented<Contract>Server` field
//! - [`CodeFormatter`]: canonical reformatting of a whole buffer
//! - [`format_and_write`]: the single reformat-and-overwrite path for every mutation
//!
//! # Lifecycle
//!
//! Models are never patched. After any on-disk write the file is parsed
//! again with [`SourceFile::read`].
//!
//! # Example
//!
//! ```rust,ignore
//! use svcsync_source::{SourceFile, LayoutFormatter, format_and_write};
//!
//! let file = SourceFile::read("internal/service/greeter.go")?;
//! let greeter = file.type_decl("GreeterService").unwrap();
//! for method in greeter.procedures() {
//!     println!("{} @ {:?}", method.name(), method.span());
//! }
//! ```

#![warn(unreachable_pub)]

pub mod error;
pub mod format;
pub mod hash;
pub mod marker;
pub mod source;
pub mod text;
pub mod write;

pub use error::{FormatError, ParseError, WriteError};
pub use format::{CodeFormatter, GofmtFormatter, LayoutFormatter};
pub use hash::ContentHash;
pub use marker::MarkerPattern;
pub use source::{parse_tree, Procedure, SourceFile, TypeDeclaration};
pub use write::{format_and_write, write_atomic};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
