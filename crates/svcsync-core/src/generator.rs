//! Scaffold generation
//!
//! The generator turns one definition file into one Go source file per
//! declared contract, written into a target directory. It is an external
//! program; [`CommandGenerator`] runs it synchronously and captures its
//! combined output.

use std::fmt;
use std::path::Path;
use std::process::Command;

use crate::config::GeneratorConfig;
use crate::error::GenerateError;

/// Produces scaffold files for a definition
pub trait ScaffoldGenerator: Send + Sync + fmt::Debug {
    /// Generate scaffolds for `definition` into `target`, running in `root`
    ///
    /// Returns the generator's combined output.
    ///
    /// # Errors
    /// Returns `GenerateError` if the generator cannot run or fails
    fn generate(&self, definition: &Path, target: &Path, root: &Path) -> Result<String, GenerateError>;

    /// Generator name (for logging)
    fn name(&self) -> &str;
}

/// Runs `<program> <args...> <definition> -t <target>` in the project root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandGenerator {
    program: String,
    args: Vec<String>,
}

impl CommandGenerator {
    /// Create generator command
    #[must_use]
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// `kratos proto server`
    #[must_use]
    pub fn kratos() -> Self {
        Self::from_config(&GeneratorConfig::default())
    }

    /// Create from configuration
    #[must_use]
    pub fn from_config(config: &GeneratorConfig) -> Self {
        Self::new(config.program.clone(), config.args.clone())
    }
}

impl ScaffoldGenerator for CommandGenerator {
    fn generate(&self, definition: &Path, target: &Path, root: &Path) -> Result<String, GenerateError> {
        let definition = definition.strip_prefix(root).unwrap_or(definition);
        tracing::debug!(
            program = %self.program,
            definition = %definition.display(),
            target = %target.display(),
            "running generator"
        );

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(definition)
            .arg("-t")
            .arg(target)
            .current_dir(root)
            .output()
            .map_err(|source| GenerateError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        if !output.status.success() {
            return Err(GenerateError::Failed {
                program: self.program.clone(),
                status: output.status.to_string(),
                output: combined,
            });
        }
        tracing::debug!(output = %combined.trim_end(), "generator output");
        Ok(combined)
    }

    fn name(&self) -> &str {
        &self.program
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kratos_defaults() {
        let generator = CommandGenerator::kratos();
        assert_eq!(generator.name(), "kratos");
        assert_eq!(generator.args, vec!["proto", "server"]);
    }

    #[test]
    fn missing_program_is_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let generator = CommandGenerator::new("/nonexistent/svcsync-generator", Vec::new());
        let err = generator
            .generate(&dir.path().join("a.proto"), dir.path(), dir.path())
            .unwrap_err();
        assert!(matches!(err, GenerateError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_captures_output() {
        let dir = tempfile::tempdir().unwrap();
        let generator = CommandGenerator::new(
            "sh",
            vec!["-c".to_string(), "echo broken proto >&2; exit 3".to_string(), "sh".to_string()],
        );
        let err = generator
            .generate(&dir.path().join("a.proto"), dir.path(), dir.path())
            .unwrap_err();
        match err {
            GenerateError::Failed { output, .. } => assert!(output.contains("broken proto")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn passes_definition_relative_to_root() {
        let dir = tempfile::tempdir().unwrap();
        let generator = CommandGenerator::new(
            "sh",
            vec!["-c".to_string(), "echo \"$1 $2\"".to_string(), "sh".to_string()],
        );
        let output = generator
            .generate(&dir.path().join("api/a.proto"), Path::new("out"), dir.path())
            .unwrap();
        assert_eq!(output.trim(), "api/a.proto -t");
    }
}
