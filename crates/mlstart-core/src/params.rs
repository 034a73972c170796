//! Invocation parameters for a bootstrap run.

use serde::Serialize;
use std::path::PathBuf;

/// Default Python version passed to the template and used for the venv.
pub const DEFAULT_PYTHON_VERSION: &str = "3.11";

/// Sentinel accepted by `--mlcore-path` to disable the local override.
pub const NONE_SENTINEL: &str = "none";

/// Where the template comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceMode {
    /// A template checkout on the local filesystem.
    #[default]
    Local,
    /// A hosted reference such as `gh:owner/repo`.
    Remote,
}

/// How the `mlcore` dependency override was requested.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DependencyOverride {
    /// Not specified: use `MLCORE_LOCAL_PATH`, then a sibling `mlcore/`.
    #[default]
    Auto,
    /// Explicit `none`: never wire a local path.
    Disabled,
    /// Explicit path; must exist.
    Path(PathBuf),
}

impl DependencyOverride {
    /// Parse the raw `--mlcore-path` value (`none` is case-insensitive).
    pub fn from_arg(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("") => Self::Auto,
            Some(v) if v.eq_ignore_ascii_case(NONE_SENTINEL) => Self::Disabled,
            Some(v) => Self::Path(PathBuf::from(v)),
        }
    }
}

/// Interactive shell hand-off options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellOptions {
    pub enter: bool,
    /// Explicit shell program or name (`zsh`, `/bin/fish`, `powershell`).
    pub shell: Option<String>,
    /// Skip user rc/profile files.
    pub clean: bool,
}

impl Default for ShellOptions {
    fn default() -> Self {
        Self {
            enter: true,
            shell: None,
            clean: false,
        }
    }
}

/// Optional template features forwarded as Copier answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TemplateFeatures {
    /// Orchestration flow stubs (`use_prefect`).
    pub flows: bool,
    /// Schema validation tasks (`use_pandera`).
    pub schema_validation: bool,
}

impl Default for TemplateFeatures {
    fn default() -> Self {
        Self {
            flows: true,
            schema_validation: true,
        }
    }
}

/// Everything a bootstrap run needs from its caller.
#[derive(Debug, Clone)]
pub struct BootstrapParams {
    pub name: String,
    pub source: SourceMode,
    pub template_path: Option<PathBuf>,
    /// Remote reference; `None` means the configured default.
    pub remote_ref: Option<String>,
    pub parent_dir: Option<PathBuf>,
    pub mlcore: DependencyOverride,
    pub create_env: bool,
    pub python_version: String,
    /// Insist on an interpreter whose `major.minor` equals `python_version`.
    pub exact_python: bool,
    pub shell: ShellOptions,
    pub features: TemplateFeatures,
}

impl BootstrapParams {
    /// Parameters with every default applied.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: SourceMode::Local,
            template_path: None,
            remote_ref: None,
            parent_dir: None,
            mlcore: DependencyOverride::Auto,
            create_env: true,
            python_version: DEFAULT_PYTHON_VERSION.to_string(),
            exact_python: false,
            shell: ShellOptions::default(),
            features: TemplateFeatures::default(),
        }
    }

    /// Shell hand-off only happens when an environment is created.
    pub fn wants_shell(&self) -> bool {
        self.create_env && self.shell.enter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dependency_override_from_arg() {
        assert_eq!(DependencyOverride::from_arg(None), DependencyOverride::Auto);
        assert_eq!(DependencyOverride::from_arg(Some("NONE")), DependencyOverride::Disabled);
        assert_eq!(
            DependencyOverride::from_arg(Some("../mlcore")),
            DependencyOverride::Path(PathBuf::from("../mlcore"))
        );
    }

    #[test]
    fn test_skip_env_disables_shell() {
        let mut params = BootstrapParams::new("demo");
        assert!(params.wants_shell());
        params.create_env = false;
        params.shell.enter = true;
        assert!(!params.wants_shell());
    }
}
