//! Copier invocation.

use mlstart_core::config::env_keys::dependency::MLCORE_LOCAL_PATH;
use mlstart_core::params::BootstrapParams;
use mlstart_core::paths::ResolvedPaths;
use mlstart_core::{BootstrapError, Result, Stage};
use mlstart_env::{run_checked, CommandSpec, ProcessRunner, TemplatingTool};

/// `copier copy` for this run. The destination is the parent directory;
/// the template itself creates the `{{ project_slug }}` folder.
pub fn copier_command(
    tool: &TemplatingTool,
    params: &BootstrapParams,
    paths: &ResolvedPaths,
) -> CommandSpec {
    let data = [
        ("project_name", params.name.trim().to_string()),
        ("project_slug", paths.package_name.clone()),
        ("package_name", paths.package_name.clone()),
        ("python_version", params.python_version.clone()),
        ("use_prefect", yes_no(params.features.flows)),
        ("use_pandera", yes_no(params.features.schema_validation)),
    ];

    let mut cmd = tool
        .command()
        .args(["copy", "--trust", "--defaults", "--vcs-ref=HEAD"]);
    for (key, value) in data {
        cmd = cmd.arg("--data").arg(format!("{key}={value}"));
    }
    cmd = cmd
        .arg(paths.template.reference())
        .arg(paths.parent_dir.to_string_lossy());

    // The template's own hooks read MLCORE_LOCAL_PATH; only the resolved
    // override may reach them.
    match &paths.mlcore {
        Some(dep) => cmd.env(MLCORE_LOCAL_PATH, dep.path.to_string_lossy()),
        None => cmd.env_remove(MLCORE_LOCAL_PATH),
    }
}

fn yes_no(flag: bool) -> String {
    if flag { "true" } else { "false" }.to_string()
}

/// Render the project. The target directory must exist afterwards.
pub fn render(
    runner: &dyn ProcessRunner,
    tool: &TemplatingTool,
    params: &BootstrapParams,
    paths: &ResolvedPaths,
) -> Result<()> {
    tracing::info!(
        "Generating project via Copier -> {} (slug={})",
        paths.parent_dir.display(),
        paths.package_name
    );
    let cmd = copier_command(tool, params, paths);
    run_checked(runner, &cmd, Stage::Rendered, "copier")?;

    if !paths.target_dir.is_dir() {
        return Err(BootstrapError::external_tool(
            Stage::Rendered,
            "copier",
            Some(0),
            format!(
                "copier exited successfully but {} was not created; check the template's \
                 project_slug and that copier >= 9.2 is installed",
                paths.target_dir.display()
            ),
        ));
    }
    Ok(())
}
