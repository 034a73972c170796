//! `mlstart new`: render a project from the template next to it and set up
//! its environment.
//!
//! Flow:
//!   1. Resolve name, template, parent directory and the `mlcore` override
//!   2. Refuse to touch an existing target
//!   3. Make sure Copier is available (PATH, python -m, private venv)
//!   4. Render, then check the answers file and notebooks
//!   5. Wire `mlcore` into `pyproject.toml`
//!   6. Create `.venv` and install editable
//!   7. Optionally open a shell inside the project

pub mod pipeline;
pub mod post_render;
pub mod render;
pub mod summary;
pub mod wiring;

use anyhow::Result;

use mlstart_core::config::CacheConfig;
use mlstart_core::params::BootstrapParams;
use mlstart_core::paths::ResolveContext;
use mlstart_core::Stage;
use mlstart_env::{PathLocator, Platform, ShellEnv, SystemRunner, TemplatingToolResolver};

pub use pipeline::{BootstrapReport, Orchestrator, Services};
pub use wiring::Wiring;

/// `mlstart new --name <NAME> ...`
pub fn cmd_new(params: BootstrapParams) -> Result<()> {
    let ctx = ResolveContext::from_env()?;
    let runner = SystemRunner;
    let locator = PathLocator;
    let tools =
        TemplatingToolResolver::new(&runner, &locator, CacheConfig::cache_dir().join("bootstrap"));
    let services = Services {
        runner: &runner,
        locator: &locator,
        tools: &tools,
    };

    let mut orchestrator = Orchestrator::new(params, ctx, services)
        .with_shell_env(ShellEnv::from_env(), Platform::current());
    let report = match orchestrator.run() {
        Ok(report) => report,
        Err(e) => {
            if e.stage() > Stage::Rendered {
                if let Some(target) = orchestrator.target_dir() {
                    eprintln!("[info] The generated project was kept at {}", target.display());
                }
            }
            return Err(e.into());
        }
    };

    if !report.entered_shell() {
        summary::print(&report);
    }
    Ok(())
}
