//! Contract discovery
//!
//! A contract is a `service <Name> { ... }` block of a `.proto` definition.

use std::fmt;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Result, SyncError};
use crate::walk;

static SERVICE_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bservice\s+([A-Za-z_][A-Za-z0-9_]*)\s*\{").expect("service declaration regex")
});

/// Lists the contracts declared under a definition directory
pub trait ContractLister: Send + Sync + fmt::Debug {
    /// Contract names in first-declaration order, without duplicates
    ///
    /// # Errors
    /// Returns error if the directory cannot be walked or read
    fn list(&self, dir: &Path) -> Result<Vec<String>>;
}

/// Scans `*.proto` files for `service` declarations
#[derive(Debug, Clone, Copy, Default)]
pub struct ProtoContractLister;

impl ContractLister for ProtoContractLister {
    fn list(&self, dir: &Path) -> Result<Vec<String>> {
        let mut contracts: Vec<String> = Vec::new();
        for path in walk::files_with_suffix(dir, ".proto")? {
            let code = std::fs::read_to_string(&path).map_err(|e| SyncError::io_error(&path, e))?;
            for name in declared_contracts(&code) {
                if !contracts.contains(&name) {
                    contracts.push(name);
                }
            }
        }
        tracing::debug!(dir = %dir.display(), contracts = ?contracts, "found grpc services");
        Ok(contracts)
    }
}

/// Contract names declared in one definition, in order
#[must_use]
pub fn declared_contracts(code: &str) -> Vec<String> {
    SERVICE_DECL
        .captures_iter(code)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Check if `code` declares contract `name`
#[must_use]
pub fn declares_contract(code: &str, name: &str) -> bool {
    SERVICE_DECL
        .captures_iter(code)
        .filter_map(|caps| caps.get(1))
        .any(|m| m.as_str() == name)
}
