//! Synchronization runs
//!
//! One run walks the definition files, asks the scaffold generator for fresh
//! scaffolds and merges them into the implementation directory:
//!
//! 1. contracts with no implementation are generated straight into the
//!    implementation directory
//! 2. contracts that already have one are generated into a timestamped
//!    staging directory
//! 3. staged files get their placeholder types rewritten, then each is
//!    reconciled with its implementation file
//! 4. the staging directory is removed
//!
//! Everything happens sequentially; the first error aborts the run.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use svcsync_merge::{ImportRewriter, Reconciler};
use svcsync_source::{write_atomic, SourceFile};

use crate::config::SyncConfig;
use crate::contracts::{declares_contract, ContractLister, ProtoContractLister};
use crate::error::{Result, SyncError};
use crate::generator::{CommandGenerator, ScaffoldGenerator};
use crate::report::SyncReport;
use crate::walk;

/// Staging directory name format
pub const STAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Drives generation and merging for one project
#[derive(Debug)]
pub struct Orchestrator {
    root: PathBuf,
    config: SyncConfig,
    lister: Box<dyn ContractLister>,
    generator: Box<dyn ScaffoldGenerator>,
    reconciler: Reconciler,
    rewriter: ImportRewriter,
}

impl Orchestrator {
    /// Create orchestrator with the configured generator command
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, config: SyncConfig) -> Self {
        Self {
            root: root.into(),
            lister: Box::new(ProtoContractLister),
            generator: Box::new(CommandGenerator::from_config(&config.generator)),
            reconciler: config.reconciler(),
            rewriter: config.rewriter(),
            config,
        }
    }

    /// Replace the scaffold generator
    #[must_use]
    pub fn with_generator(mut self, generator: impl ScaffoldGenerator + 'static) -> Self {
        self.generator = Box::new(generator);
        self
    }

    /// Replace the contract lister
    #[must_use]
    pub fn with_lister(mut self, lister: impl ContractLister + 'static) -> Self {
        self.lister = Box::new(lister);
        self
    }

    /// Project root
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Configuration in use
    #[inline]
    #[must_use]
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Synchronize every definition under the definition directory
    ///
    /// # Errors
    /// Returns `SyncError::Precondition` if the root or definition directory
    /// is missing, and any generator, parse or write error
    pub fn sync_all(&self) -> Result<SyncReport> {
        self.check_root()?;
        let api_root = self.config.api_root(&self.root);
        if !api_root.is_dir() {
            return Err(SyncError::precondition(format!(
                "definition directory {} does not exist",
                api_root.display()
            )));
        }
        tracing::info!(
            root = %self.root.display(),
            mask_mode = self.config.mask_mode,
            "syncing all services"
        );

        let contracts = self.lister.list(&api_root)?;
        let staging = self.staging_dir();
        let mut report = SyncReport::new();
        for definition in walk::files_with_suffix(&api_root, ".proto")? {
            self.generate_for(&definition, &contracts, &staging, &mut report)?;
        }
        self.merge_staging(&staging, &mut report)?;
        self.remove_empty_staging_parent()?;

        tracing::info!(%report, "sync done");
        Ok(report)
    }

    /// Synchronize the contracts of one definition file
    ///
    /// # Errors
    /// Returns `SyncError::Precondition` if the root or definition is
    /// missing, and any generator, parse or write error
    pub fn sync_once(&self, definition: &Path) -> Result<SyncReport> {
        self.check_root()?;
        if !definition.is_file() {
            return Err(SyncError::precondition(format!(
                "definition {} does not exist",
                definition.display()
            )));
        }
        tracing::info!(
            root = %self.root.display(),
            definition = %definition.display(),
            mask_mode = self.config.mask_mode,
            "syncing single definition"
        );

        let dir = definition.parent().unwrap_or(self.root.as_path());
        let contracts = self.lister.list(dir)?;
        let staging = self.staging_dir();
        let mut report = SyncReport::new();
        self.generate_for(definition, &contracts, &staging, &mut report)?;
        self.merge_staging(&staging, &mut report)?;
        self.remove_empty_staging_parent()?;

        tracing::info!(%report, "sync done");
        Ok(report)
    }

    fn check_root(&self) -> Result<()> {
        if self.root.is_dir() {
            Ok(())
        } else {
            Err(SyncError::precondition(format!(
                "project root {} is not a directory",
                self.root.display()
            )))
        }
    }

    fn staging_dir(&self) -> PathBuf {
        let stamp = chrono::Local::now().format(STAMP_FORMAT).to_string();
        self.config.staging_parent(&self.root).join(stamp)
    }

    fn service_root(&self) -> PathBuf {
        self.config.service_root(&self.root)
    }

    fn marker_index(&self) -> Result<BTreeMap<String, PathBuf>> {
        walk::marker_index(&self.service_root(), &self.config.staging_dir, self.reconciler.pattern())
    }

    fn is_implemented(&self, contract: &str, index: &BTreeMap<String, PathBuf>) -> bool {
        if self.config.mask_mode {
            index.contains_key(&self.reconciler.pattern().for_contract(contract))
        } else {
            self.service_root()
                .join(format!("{}.go", contract.to_lowercase()))
                .is_file()
        }
    }

    fn generate_for(
        &self,
        definition: &Path,
        contracts: &[String],
        staging: &Path,
        report: &mut SyncReport,
    ) -> Result<()> {
        let code = std::fs::read_to_string(definition).map_err(|e| SyncError::io_error(definition, e))?;
        let index = if self.config.mask_mode {
            self.marker_index()?
        } else {
            BTreeMap::new()
        };

        let mut missing = Vec::new();
        let mut present = Vec::new();
        for contract in contracts.iter().filter(|c| declares_contract(&code, c)) {
            if self.is_implemented(contract, &index) {
                tracing::debug!(contract = %contract, "service exists");
                present.push(contract.clone());
            } else {
                tracing::debug!(contract = %contract, "service not found");
                missing.push(contract.clone());
            }
        }
        if missing.is_empty() && present.is_empty() {
            tracing::debug!(definition = %definition.display(), "no services in definition");
            return Ok(());
        }

        if !missing.is_empty() {
            let service_root = self.service_root();
            std::fs::create_dir_all(&service_root).map_err(|e| SyncError::io_error(&service_root, e))?;
            tracing::info!(
                definition = %definition.display(),
                contracts = ?missing,
                generator = self.generator.name(),
                "creating new services"
            );
            let output = self.generator.generate(definition, &service_root, &self.root)?;
            tracing::debug!(output = %output.trim_end(), "generator output");
            report.created.extend(missing);
        }

        if !present.is_empty() {
            std::fs::create_dir_all(staging).map_err(|e| SyncError::io_error(staging, e))?;
            tracing::debug!(
                definition = %definition.display(),
                staging = %staging.display(),
                "regenerating into staging"
            );
            let output = self.generator.generate(definition, staging, &self.root)?;
            tracing::debug!(output = %output.trim_end(), "generator output");
        }
        Ok(())
    }

    fn merge_staging(&self, staging: &Path, report: &mut SyncReport) -> Result<()> {
        if !staging.is_dir() {
            return Ok(());
        }

        report.rewritten += self
            .rewriter
            .rewrite_tree(staging, self.reconciler.formatter())?
            .len();

        let index = if self.config.mask_mode {
            self.marker_index()?
        } else {
            BTreeMap::new()
        };
        for staged in walk::files_with_suffix(staging, ".go")? {
            let new = SourceFile::read(&staged)?;
            let old_path = self.locate_implementation(&new, &index);

            if old_path.is_file() {
                let outcome = self.reconciler.reconcile(&old_path, &new)?;
                if !outcome.is_unchanged() {
                    tracing::info!(
                        path = %old_path.display(),
                        added = outcome.added.len(),
                        demoted = outcome.demoted.len(),
                        reordered = outcome.reordered.len(),
                        "synced service"
                    );
                }
                report.files.push(outcome);
            } else {
                tracing::info!(
                    from = %staged.display(),
                    to = %old_path.display(),
                    "implementation missing, relocating scaffold"
                );
                write_atomic(&old_path, new.code().as_bytes())?;
                report.relocated.push(old_path);
            }
        }

        std::fs::remove_dir_all(staging).map_err(|e| SyncError::io_error(staging, e))?;
        tracing::debug!(staging = %staging.display(), "removed staging directory");
        Ok(())
    }

    fn locate_implementation(&self, new: &SourceFile, index: &BTreeMap<String, PathBuf>) -> PathBuf {
        let by_name = self.service_root().join(new.path().file_name().unwrap_or_default());
        if !self.config.mask_mode {
            return by_name;
        }

        let pattern = self.reconciler.pattern();
        let found = new
            .types()
            .find_map(|decl| pattern.marker_of(decl))
            .and_then(|marker| index.get(marker).map(|path| (marker, path)));
        match found {
            Some((marker, path)) => {
                tracing::debug!(marker, path = %path.display(), "matched by marker");
                path.clone()
            }
            None => {
                tracing::warn!(
                    staged = %new.path().display(),
                    path = %by_name.display(),
                    "no marker match, falling back to file name"
                );
                by_name
            }
        }
    }

    fn remove_empty_staging_parent(&self) -> Result<()> {
        let parent = self.config.staging_parent(&self.root);
        if parent.is_dir() && !walk::has_files(&parent)? {
            std::fs::remove_dir_all(&parent).map_err(|e| SyncError::io_error(&parent, e))?;
            tracing::debug!(path = %parent.display(), "removed empty staging parent");
        }
        Ok(())
    }
}
