//! Run configuration
//!
//! Loaded from an optional `svcsync.toml` in the project root; every field
//! has a default matching the Kratos project layout. Command-line flags are
//! applied on top with the `with_*` builders.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use svcsync_merge::{ImportRewriter, Reconciler, RewriteRule};
use svcsync_source::{CodeFormatter, GofmtFormatter, LayoutFormatter, MarkerPattern};

use crate::error::ConfigError;

/// Name of the configuration file looked up in the project root
pub const CONFIG_FILE: &str = "svcsync.toml";

/// Which formatter rewrites mutated buffers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatterKind {
    /// `gofmt` subprocess
    #[default]
    Gofmt,
    /// Built-in whitespace normalizer
    Layout,
}

impl FormatterKind {
    /// Build the formatter
    #[must_use]
    pub fn build(self) -> Box<dyn CodeFormatter> {
        match self {
            Self::Gofmt => Box::new(GofmtFormatter::new()),
            Self::Layout => Box::new(LayoutFormatter::new()),
        }
    }
}

impl FromStr for FormatterKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gofmt" => Ok(Self::Gofmt),
            "layout" => Ok(Self::Layout),
            other => Err(ConfigError::UnknownFormatter(other.to_string())),
        }
    }
}

impl fmt::Display for FormatterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gofmt => write!(f, "gofmt"),
            Self::Layout => write!(f, "layout"),
        }
    }
}

/// Marker field recognition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerConfig {
    /// Marker type name prefix
    pub prefix: String,
    /// Marker type name suffix
    pub suffix: String,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            prefix: "Unimplemented".to_string(),
            suffix: "Server".to_string(),
        }
    }
}

/// External scaffold generator command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Program to run
    pub program: String,
    /// Arguments placed before `<definition> -t <target>`
    pub args: Vec<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            program: "kratos".to_string(),
            args: vec!["proto".to_string(), "server".to_string()],
        }
    }
}

/// Extra placeholder substitution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriteConfig {
    /// Text emitted by the generator
    pub placeholder: String,
    /// Replacement type reference
    pub canonical: String,
    /// Import path providing the replacement
    pub import: String,
}

/// Synchronization configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Definition directory, relative to the project root
    pub api_dir: PathBuf,
    /// Implementation directory, relative to the project root
    pub service_dir: PathBuf,
    /// Staging parent directory name inside the implementation directory
    pub staging_dir: String,
    /// Associate files by embedded marker instead of file name
    pub mask_mode: bool,
    /// Marker recognition
    pub marker: MarkerConfig,
    /// Scaffold generator command
    pub generator: GeneratorConfig,
    /// Formatter for every write
    pub formatter: FormatterKind,
    /// Placeholder rules added to the built-in table
    pub rewrite: Vec<RewriteConfig>,
}

impl SyncConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file
    ///
    /// # Errors
    /// Returns `ConfigError` if the file cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Load `svcsync.toml` from `root` if present, else defaults
    ///
    /// # Errors
    /// Returns `ConfigError` if the file exists but is invalid
    pub fn discover(root: &Path) -> Result<Self, ConfigError> {
        let path = root.join(CONFIG_FILE);
        if path.is_file() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// With mask mode
    #[inline]
    #[must_use]
    pub fn with_mask_mode(mut self, mask_mode: bool) -> Self {
        self.mask_mode = mask_mode;
        self
    }

    /// With formatter
    #[inline]
    #[must_use]
    pub fn with_formatter(mut self, formatter: FormatterKind) -> Self {
        self.formatter = formatter;
        self
    }

    /// With definition directory
    #[inline]
    #[must_use]
    pub fn with_api_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.api_dir = dir.into();
        self
    }

    /// With implementation directory
    #[inline]
    #[must_use]
    pub fn with_service_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.service_dir = dir.into();
        self
    }

    /// With extra placeholder rule
    #[must_use]
    pub fn with_rewrite(mut self, rule: RewriteConfig) -> Self {
        self.rewrite.push(rule);
        self
    }

    /// Marker pattern
    #[must_use]
    pub fn pattern(&self) -> MarkerPattern {
        MarkerPattern::new(&self.marker.prefix, &self.marker.suffix)
    }

    /// Built-in placeholder table plus configured rules
    #[must_use]
    pub fn rewriter(&self) -> ImportRewriter {
        self.rewrite.iter().fold(ImportRewriter::standard(), |rewriter, rule| {
            rewriter.with_rule(RewriteRule::new(&rule.placeholder, &rule.canonical, &rule.import))
        })
    }

    /// Reconciler with this marker pattern and formatter
    #[must_use]
    pub fn reconciler(&self) -> Reconciler {
        Reconciler::new(self.pattern(), self.formatter.build())
    }

    /// Definition directory under `root`
    #[must_use]
    pub fn api_root(&self, root: &Path) -> PathBuf {
        root.join(&self.api_dir)
    }

    /// Implementation directory under `root`
    #[must_use]
    pub fn service_root(&self, root: &Path) -> PathBuf {
        root.join(&self.service_dir)
    }

    /// Staging parent directory under `root`
    #[must_use]
    pub fn staging_parent(&self, root: &Path) -> PathBuf {
        self.service_root(root).join(&self.staging_dir)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            api_dir: PathBuf::from("api"),
            service_dir: PathBuf::from("internal/service"),
            staging_dir: "tmp".to_string(),
            mask_mode: true,
            marker: MarkerConfig::default(),
            generator: GeneratorConfig::default(),
            formatter: FormatterKind::default(),
            rewrite: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_match_kratos_layout() {
        let config = SyncConfig::default();
        assert_eq!(config.api_dir, PathBuf::from("api"));
        assert_eq!(config.service_dir, PathBuf::from("internal/service"));
        assert!(config.mask_mode);
        assert_eq!(config.formatter, FormatterKind::Gofmt);
        assert_eq!(config.pattern(), MarkerPattern::default());
        assert_eq!(
            config.staging_parent(Path::new("/p")),
            PathBuf::from("/p/internal/service/tmp")
        );
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: SyncConfig = toml::from_str(
            r#"
mask_mode = false
formatter = "layout"

[generator]
program = "/opt/kratos"

[[rewrite]]
placeholder = "pb.google_protobuf_Timestamp"
canonical = "timestamppb.Timestamp"
import = "google.golang.org/protobuf/types/known/timestamppb"
"#,
        )
        .unwrap();

        assert!(!config.mask_mode);
        assert_eq!(config.formatter, FormatterKind::Layout);
        assert_eq!(config.generator.program, "/opt/kratos");
        assert_eq!(config.generator.args, vec!["proto", "server"]);
        assert_eq!(config.api_dir, PathBuf::from("api"));
        assert_eq!(config.rewriter().rules().len(), 3);
    }

    #[test]
    fn discover_without_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(SyncConfig::discover(dir.path()).unwrap(), SyncConfig::default());
    }

    #[test]
    fn invalid_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "mask_mode = \"maybe\"").unwrap();
        let err = SyncConfig::discover(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn formatter_names() {
        assert_eq!("layout".parse::<FormatterKind>().unwrap(), FormatterKind::Layout);
        assert!("clang".parse::<FormatterKind>().is_err());
        assert_eq!(FormatterKind::Gofmt.to_string(), "gofmt");
    }
}
