//! Templating tool (Copier) availability.
//!
//! Resolution order:
//!   1. `copier` on `PATH`
//!   2. `python3 -m copier` / `python -m copier`
//!   3. a private venv under `<cache>/bootstrap/venv` with copier installed
//!
//! The private venv is reused on later runs once its completion marker is
//! present.

use std::fs;
use std::path::{Path, PathBuf};

use mlstart_core::{BootstrapError, Result, Stage};

use crate::locate::ExecutableLocator;
use crate::python;
use crate::runner::{CommandSpec, ProcessRunner};
use crate::venv::{self, VenvHandle};

/// Marker file written once the private environment is fully provisioned.
const PRIVATE_ENV_MARKER: &str = ".mlstart_complete";

/// How the tool was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolOrigin {
    Path,
    PythonModule,
    PrivateEnv,
}

/// A ready-to-invoke templating tool: program plus fixed leading args.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplatingTool {
    pub program: PathBuf,
    pub prefix_args: Vec<String>,
    pub origin: ToolOrigin,
}

impl TemplatingTool {
    pub fn executable(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            prefix_args: Vec::new(),
            origin: ToolOrigin::Path,
        }
    }

    pub fn python_module(python: impl Into<PathBuf>, origin: ToolOrigin) -> Self {
        Self {
            program: python.into(),
            prefix_args: vec!["-m".to_string(), "copier".to_string()],
            origin,
        }
    }

    /// Base command; callers append the subcommand and its arguments.
    pub fn command(&self) -> CommandSpec {
        CommandSpec::new(&self.program).args(self.prefix_args.iter().cloned())
    }
}

/// Capability handed to the orchestrator: yields a usable templating tool,
/// provisioning it if needed.
pub trait TemplatingToolProvider {
    fn ensure(&self) -> Result<TemplatingTool>;
}

/// Default provider backed by `PATH` lookup and a private bootstrap venv.
pub struct TemplatingToolResolver<'a> {
    runner: &'a dyn ProcessRunner,
    locator: &'a dyn ExecutableLocator,
    bootstrap_root: PathBuf,
}

impl<'a> TemplatingToolResolver<'a> {
    /// `bootstrap_root` is the directory that will hold `venv/`.
    pub fn new(
        runner: &'a dyn ProcessRunner,
        locator: &'a dyn ExecutableLocator,
        bootstrap_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            runner,
            locator,
            bootstrap_root: bootstrap_root.into(),
        }
    }

    pub fn private_venv(&self) -> VenvHandle {
        VenvHandle::at(self.bootstrap_root.join("venv"))
    }

    fn module_available(&self, python: &Path) -> bool {
        self.runner
            .run(&CommandSpec::new(python).args(["-m", "copier", "--version"]))
            .map(|o| o.success())
            .unwrap_or(false)
    }

    fn provision_private(&self) -> Result<TemplatingTool> {
        let venv = self.private_venv();
        let marker = venv.root.join(PRIVATE_ENV_MARKER);
        if marker.exists() && venv.exists() {
            tracing::debug!(venv = %venv.root.display(), "reusing private copier environment");
            return Ok(TemplatingTool::python_module(venv.python(), ToolOrigin::PrivateEnv));
        }

        // Half-provisioned leftovers from an interrupted run.
        if venv.root.exists() {
            fs::remove_dir_all(&venv.root).map_err(|e| {
                BootstrapError::io(
                    Stage::TemplateReady,
                    format!("removing incomplete {}", venv.root.display()),
                    e,
                )
            })?;
        }
        fs::create_dir_all(&self.bootstrap_root).map_err(|e| {
            BootstrapError::io(
                Stage::TemplateReady,
                format!("creating {}", self.bootstrap_root.display()),
                e,
            )
        })?;

        let host_python = python::find_python(self.runner, self.locator, "3", false)
            .ok_or_else(|| {
                BootstrapError::external_tool(
                    Stage::TemplateReady,
                    "copier bootstrap",
                    None,
                    "copier is not installed and no Python interpreter was found to provision it; \
                     install it with 'pipx install copier' and retry",
                )
            })?;

        tracing::info!(
            venv = %venv.root.display(),
            "copier not found; provisioning a private copy"
        );
        let to_tool_error = |e: BootstrapError| match e {
            BootstrapError::Environment { message, output } => BootstrapError::external_tool(
                Stage::TemplateReady,
                "copier bootstrap",
                None,
                format!("{message}\n{output}"),
            ),
            other => other,
        };
        venv::create(self.runner, &host_python, &venv.root, None).map_err(to_tool_error)?;
        venv::install_packages(self.runner, &venv, &["pip", "copier"]).map_err(to_tool_error)?;

        if !self.module_available(&venv.python()) {
            return Err(BootstrapError::external_tool(
                Stage::TemplateReady,
                "copier bootstrap",
                None,
                "copier was installed into the private environment but does not run; \
                 install it with 'pipx install copier' and retry",
            ));
        }

        fs::write(&marker, "").map_err(|e| {
            BootstrapError::io(
                Stage::TemplateReady,
                format!("writing {}", marker.display()),
                e,
            )
        })?;
        Ok(TemplatingTool::python_module(venv.python(), ToolOrigin::PrivateEnv))
    }
}

impl TemplatingToolProvider for TemplatingToolResolver<'_> {
    fn ensure(&self) -> Result<TemplatingTool> {
        if let Some(exe) = self.locator.find("copier") {
            tracing::debug!(copier = %exe.display(), "using copier from PATH");
            return Ok(TemplatingTool::executable(exe));
        }
        for name in ["python3", "python"] {
            if let Some(py) = self.locator.find(name) {
                if self.module_available(&py) {
                    tracing::debug!(python = %py.display(), "using copier as a Python module");
                    return Ok(TemplatingTool::python_module(py, ToolOrigin::PythonModule));
                }
            }
        }
        self.provision_private()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeLocator, ScriptedRunner};

    #[test]
    fn test_copier_on_path_wins() {
        let runner = ScriptedRunner::default();
        let locator = FakeLocator::with(&["copier", "python3"]);
        let tool = TemplatingToolResolver::new(&runner, &locator, "/unused")
            .ensure()
            .unwrap();
        assert_eq!(tool, TemplatingTool::executable("/usr/bin/copier"));
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_python_module_is_second_choice() {
        let runner = ScriptedRunner::default();
        let locator = FakeLocator::with(&["python3"]);
        let tool = TemplatingToolResolver::new(&runner, &locator, "/unused")
            .ensure()
            .unwrap();
        assert_eq!(tool.origin, ToolOrigin::PythonModule);
        assert_eq!(
            tool.command().arg("copy").display(),
            "/usr/bin/python3 -m copier copy"
        );
    }

    #[cfg(not(windows))]
    #[test]
    fn test_private_env_is_provisioned_then_reused() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("bootstrap");
        let venv_python = root.join("venv").join("bin").join("python");
        let create_python = venv_python.clone();
        let runner = ScriptedRunner::default()
            .respond("/usr/bin/python3 -m copier --version", 1, "")
            .on("/usr/bin/python3 -m venv", move |_| {
                fs::create_dir_all(create_python.parent().unwrap()).unwrap();
                fs::write(&create_python, "").unwrap();
            });
        let locator = FakeLocator::with(&["python3"]);
        let resolver = TemplatingToolResolver::new(&runner, &locator, &root);

        let tool = resolver.ensure().unwrap();
        assert_eq!(tool.origin, ToolOrigin::PrivateEnv);
        assert_eq!(tool.program, venv_python);
        assert!(root.join("venv").join(PRIVATE_ENV_MARKER).exists());
        let first_run = runner.calls().len();
        assert!(runner
            .displayed_calls()
            .iter()
            .any(|c| c.ends_with("-m pip install --upgrade --disable-pip-version-check pip copier")));

        let again = resolver.ensure().unwrap();
        assert_eq!(again, tool);
        // Only the PATH-module probe runs the second time.
        assert_eq!(runner.calls().len(), first_run + 1);
    }

    #[cfg(not(windows))]
    #[test]
    fn test_private_env_failure_is_external_tool_error() {
        let tmp = tempfile::tempdir().unwrap();
        let runner = ScriptedRunner::default()
            .respond("/usr/bin/python3 -m copier --version", 1, "")
            .respond("/usr/bin/python3 -m venv", 1, "ensurepip missing");
        let locator = FakeLocator::with(&["python3"]);
        let err = TemplatingToolResolver::new(&runner, &locator, tmp.path())
            .ensure()
            .unwrap_err();
        assert!(matches!(
            err,
            BootstrapError::ExternalTool {
                stage: Stage::TemplateReady,
                ..
            }
        ));
    }

    #[test]
    fn test_no_python_at_all_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let runner = ScriptedRunner::default();
        let locator = FakeLocator::with(&[]);
        let err = TemplatingToolResolver::new(&runner, &locator, tmp.path())
            .ensure()
            .unwrap_err();
        assert!(err.tool_output().unwrap().contains("pipx install copier"));
    }
}
