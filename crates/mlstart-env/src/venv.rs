//! Python virtual environments: create, upgrade pip, editable installs.

use std::path::{Path, PathBuf};

use mlstart_core::{BootstrapError, Result};

use crate::runner::{CommandSpec, ProcessRunner};

/// A created virtual environment. Only built after `python -m venv`
/// succeeded; there is no teardown besides deleting the directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VenvHandle {
    pub root: PathBuf,
}

impl VenvHandle {
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `bin/` on Unix, `Scripts/` on Windows.
    pub fn bin_dir(&self) -> PathBuf {
        if cfg!(windows) {
            self.root.join("Scripts")
        } else {
            self.root.join("bin")
        }
    }

    pub fn python(&self) -> PathBuf {
        if cfg!(windows) {
            self.bin_dir().join("python.exe")
        } else {
            self.bin_dir().join("python")
        }
    }

    /// Activation script for a given file name (`activate`, `activate.fish`,
    /// `activate.bat`, `Activate.ps1`).
    pub fn activate_script(&self, file: &str) -> PathBuf {
        self.bin_dir().join(file)
    }

    /// Whether the interpreter is present.
    pub fn exists(&self) -> bool {
        self.python().exists()
    }
}

/// `<python> -m venv <root>`.
pub fn create(
    runner: &dyn ProcessRunner,
    python: &Path,
    root: &Path,
    cwd: Option<&Path>,
) -> Result<VenvHandle> {
    let mut cmd = CommandSpec::new(python)
        .args(["-m", "venv"])
        .arg(root.to_string_lossy());
    if let Some(dir) = cwd {
        cmd = cmd.current_dir(dir);
    }
    run_env_step(runner, &cmd, "creating virtual environment")?;
    Ok(VenvHandle::at(root))
}

/// `python -m pip install -U pip` inside the venv.
pub fn upgrade_pip(runner: &dyn ProcessRunner, venv: &VenvHandle) -> Result<()> {
    let cmd = pip(venv).args(["install", "-U", "pip"]);
    run_env_step(runner, &cmd, "upgrading pip")
}

/// `python -m pip install -e <path>`; `cwd` lets callers pass `.`.
pub fn install_editable(
    runner: &dyn ProcessRunner,
    venv: &VenvHandle,
    path: &str,
    cwd: Option<&Path>,
) -> Result<()> {
    let mut cmd = pip(venv).args(["install", "-e", path]);
    if let Some(dir) = cwd {
        cmd = cmd.current_dir(dir);
    }
    run_env_step(runner, &cmd, &format!("editable install of {path}"))
}

/// `python -m pip install <packages…>`.
pub fn install_packages(
    runner: &dyn ProcessRunner,
    venv: &VenvHandle,
    packages: &[&str],
) -> Result<()> {
    let cmd = pip(venv)
        .args(["install", "--upgrade", "--disable-pip-version-check"])
        .args(packages.iter().copied());
    run_env_step(runner, &cmd, &format!("installing {}", packages.join(" ")))
}

fn pip(venv: &VenvHandle) -> CommandSpec {
    CommandSpec::new(venv.python()).args(["-m", "pip"])
}

fn run_env_step(runner: &dyn ProcessRunner, cmd: &CommandSpec, what: &str) -> Result<()> {
    tracing::info!("[cmd] {}", cmd.display());
    let out = runner.run(cmd).map_err(|e| {
        BootstrapError::environment(
            format!("{what} failed"),
            format!("failed to execute {}: {e}", cmd.program.display()),
        )
    })?;
    if !out.success() {
        let code = out
            .code
            .map_or_else(|| "signal".to_string(), |c| c.to_string());
        return Err(BootstrapError::environment(
            format!("{what} failed (exit {code})"),
            out.combined(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedRunner;

    #[test]
    fn test_handle_paths_follow_platform_layout() {
        let venv = VenvHandle::at("/p/.venv");
        if cfg!(windows) {
            assert_eq!(venv.python(), PathBuf::from("/p/.venv/Scripts/python.exe"));
        } else {
            assert_eq!(venv.python(), PathBuf::from("/p/.venv/bin/python"));
            assert_eq!(
                venv.activate_script("activate.fish"),
                PathBuf::from("/p/.venv/bin/activate.fish")
            );
        }
    }

    #[cfg(not(windows))]
    #[test]
    fn test_install_sequence_uses_venv_python() {
        let runner = ScriptedRunner::default();
        let venv = create(&runner, Path::new("/usr/bin/python3"), Path::new("/p/.venv"), None)
            .unwrap();
        upgrade_pip(&runner, &venv).unwrap();
        install_editable(&runner, &venv, ".", Some(Path::new("/p"))).unwrap();
        assert_eq!(
            runner.displayed_calls(),
            vec![
                "/usr/bin/python3 -m venv /p/.venv",
                "/p/.venv/bin/python -m pip install -U pip",
                "/p/.venv/bin/python -m pip install -e .",
            ]
        );
        assert_eq!(runner.calls()[2].cwd.as_deref(), Some(Path::new("/p")));
    }

    #[cfg(not(windows))]
    #[test]
    fn test_failed_install_is_environment_error() {
        let runner = ScriptedRunner::default().respond("/p/.venv/bin/python -m pip install -e", 1, "");
        let err = install_editable(&runner, &VenvHandle::at("/p/.venv"), ".", None).unwrap_err();
        assert!(matches!(err, BootstrapError::Environment { .. }));
        assert!(err.to_string().contains("editable install of . failed (exit 1)"));
    }
}
