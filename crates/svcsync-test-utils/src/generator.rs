use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use svcsync_core::{GenerateError, ScaffoldGenerator};

/// One recorded generator invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateCall {
    pub definition: PathBuf,
    pub target: PathBuf,
    pub root: PathBuf,
}

#[derive(Debug, Default)]
struct State {
    outputs: BTreeMap<String, Vec<(String, String)>>,
    calls: Vec<GenerateCall>,
    failure: Option<String>,
}

/// Scaffold generator that writes canned files
///
/// Outputs are keyed by the definition's file name. Existing files in the
/// target are left alone, like `kratos proto server` does. Clones share
/// state, so a test can keep one handle and change the canned scaffold
/// between runs.
#[derive(Debug, Clone, Default)]
pub struct FixtureGenerator {
    state: Arc<Mutex<State>>,
}

impl FixtureGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit `file` with `code` whenever `definition` is generated
    pub fn with_output(self, definition: &str, file: &str, code: impl Into<String>) -> Self {
        self.set_output(definition, file, code);
        self
    }

    /// Replace (or add) one canned file for `definition`
    pub fn set_output(&self, definition: &str, file: &str, code: impl Into<String>) {
        let mut state = self.state.lock();
        let files = state.outputs.entry(definition.to_string()).or_default();
        let code = code.into();
        match files.iter_mut().find(|(name, _)| name == file) {
            Some(entry) => entry.1 = code,
            None => files.push((file.to_string(), code)),
        }
    }

    /// Fail every following invocation with `output`
    pub fn fail_with(&self, output: impl Into<String>) {
        self.state.lock().failure = Some(output.into());
    }

    pub fn calls(&self) -> Vec<GenerateCall> {
        self.state.lock().calls.clone()
    }
}

impl ScaffoldGenerator for FixtureGenerator {
    fn generate(&self, definition: &Path, target: &Path, root: &Path) -> Result<String, GenerateError> {
        let mut state = self.state.lock();
        state.calls.push(GenerateCall {
            definition: definition.to_path_buf(),
            target: target.to_path_buf(),
            root: root.to_path_buf(),
        });

        if let Some(output) = &state.failure {
            return Err(GenerateError::Failed {
                program: "fixture".to_string(),
                status: "exit status: 1".to_string(),
                output: output.clone(),
            });
        }

        let key = definition
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let files = state.outputs.get(&key).cloned().unwrap_or_default();

        std::fs::create_dir_all(target).map_err(|e| GenerateError::io_error(target, e))?;
        let mut output = String::new();
        for (name, code) in files {
            let path = target.join(&name);
            if path.exists() {
                output.push_str(&format!("{} already exists\n", path.display()));
                continue;
            }
            std::fs::write(&path, code).map_err(|e| GenerateError::io_error(&path, e))?;
            output.push_str(&format!("generated {}\n", path.display()));
        }
        Ok(output)
    }

    fn name(&self) -> &str {
        "fixture"
    }
}
