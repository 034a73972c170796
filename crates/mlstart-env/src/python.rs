//! Python interpreter discovery.

use std::path::{Path, PathBuf};

use crate::locate::ExecutableLocator;
use crate::runner::{CommandSpec, ProcessRunner};

const VERSION_PROBE: &str = "import sys; print(f'{sys.version_info[0]}.{sys.version_info[1]}')";
const EXECUTABLE_PROBE: &str = "import sys; print(sys.executable)";

/// Candidate program names for `version`, most specific first.
pub fn candidate_names(version: &str) -> Vec<String> {
    vec![
        format!("python{version}"),
        "python3".to_string(),
        "python".to_string(),
    ]
}

/// Pick an interpreter for `version` (`major.minor`).
///
/// Without `exact`, the first candidate on `PATH` wins. With `exact`, the
/// Windows `py` launcher is asked first, then every candidate is asked for
/// its version; if none matches, the first candidate on `PATH` is returned
/// with a warning. `None` means no Python at all.
pub fn find_python(
    runner: &dyn ProcessRunner,
    locator: &dyn ExecutableLocator,
    version: &str,
    exact: bool,
) -> Option<PathBuf> {
    let found: Vec<PathBuf> = candidate_names(version)
        .iter()
        .filter_map(|n| locator.find(n))
        .collect();

    if !exact {
        return found.into_iter().next();
    }

    if cfg!(windows) {
        if let Some(exe) = via_py_launcher(runner, locator, version) {
            return Some(exe);
        }
    }

    for exe in &found {
        match probe_version(runner, exe) {
            Some(v) if v == version => return Some(exe.clone()),
            Some(v) => tracing::debug!(python = %exe.display(), found = %v, "version mismatch"),
            None => tracing::debug!(python = %exe.display(), "version probe failed"),
        }
    }

    let fallback = found.into_iter().next();
    if let Some(exe) = &fallback {
        tracing::warn!(
            "no Python {version} interpreter found; falling back to {}",
            exe.display()
        );
    }
    fallback
}

/// `major.minor` reported by the interpreter, if it runs.
pub fn probe_version(runner: &dyn ProcessRunner, python: &Path) -> Option<String> {
    let out = runner
        .run(&CommandSpec::new(python).args(["-c", VERSION_PROBE]))
        .ok()?;
    out.success().then(|| out.stdout.trim().to_string())
}

fn via_py_launcher(
    runner: &dyn ProcessRunner,
    locator: &dyn ExecutableLocator,
    version: &str,
) -> Option<PathBuf> {
    let py = locator.find("py")?;
    let out = runner
        .run(&CommandSpec::new(py).args([format!("-{version}"), "-c".into(), EXECUTABLE_PROBE.into()]))
        .ok()?;
    let exe = PathBuf::from(out.stdout.trim());
    (out.success() && exe.exists()).then_some(exe)
}
