//! svcsync Core
//!
//! Keeps the Go service implementations of a Kratos project in step with
//! their protobuf contracts: regenerates scaffolds with the external
//! generator and merges them into the hand-written files.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use svcsync_core::{Orchestrator, SyncConfig};
//!
//! let config = SyncConfig::discover(&root)?;
//! let report = Orchestrator::new(&root, config).sync_all()?;
//! println!("{report}");
//! ```
//!
//! # Modules
//!
//! - [`config`]: layout, marker pattern, generator command and formatter
//! - [`contracts`]: `service` declarations found in definition files
//! - [`generator`]: the scaffold generator seam
//! - [`orchestrator`]: bulk and single-definition runs
//! - [`project`]: project root discovery
//! - [`walk`]: file listing and the marker index

#![warn(unreachable_pub)]

pub mod config;
pub mod contracts;
pub mod error;
pub mod generator;
pub mod orchestrator;
pub mod project;
pub mod report;
pub mod walk;

pub use config::{FormatterKind, SyncConfig, CONFIG_FILE};
pub use contracts::{ContractLister, ProtoContractLister};
pub use error::{ConfigError, GenerateError, Result, SyncError};
pub use generator::{CommandGenerator, ScaffoldGenerator};
pub use orchestrator::Orchestrator;
pub use project::find_project_root;
pub use report::SyncReport;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
