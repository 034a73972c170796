//! Path resolution: template location, parent directory, target directory
//! and the optional `mlcore` override.
//!
//! Resolution never touches the filesystem beyond existence checks, so a
//! failure here leaves no trace.

use std::path::{Path, PathBuf};

use crate::config::schema::PathsConfig;
use crate::config::env_keys;
use crate::error::{BootstrapError, Result};
use crate::naming;
use crate::params::{BootstrapParams, DependencyOverride, SourceMode};

/// Files that mark a directory as a Copier template root.
pub const TEMPLATE_MARKERS: &[&str] = &["copier.yml", "copier.yaml"];

/// Checkout name of the template next to the working directory.
pub const TEMPLATE_DIR_NAME: &str = "ml-project-template";

/// Directory name of the sibling library checkout.
pub const MLCORE_DIR_NAME: &str = "mlcore";

/// Ambient inputs to resolution, injectable for tests.
#[derive(Debug, Clone)]
pub struct ResolveContext {
    pub cwd: PathBuf,
    /// Directory holding the running binary, searched last for a template.
    pub exe_dir: Option<PathBuf>,
    pub config: PathsConfig,
}

impl ResolveContext {
    pub fn from_env() -> Result<Self> {
        let cwd = std::env::current_dir().map_err(|e| {
            BootstrapError::configuration(format!("cannot read current directory: {e}"))
        })?;
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf));
        Ok(Self {
            cwd,
            exe_dir,
            config: PathsConfig::from_env(),
        })
    }
}

/// Template reference handed to the templating tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    Local(PathBuf),
    Remote(String),
}

impl TemplateSource {
    /// The argument passed to `copier copy`.
    pub fn reference(&self) -> String {
        match self {
            TemplateSource::Local(p) => p.to_string_lossy().into_owned(),
            TemplateSource::Remote(r) => r.clone(),
        }
    }

    pub fn local_dir(&self) -> Option<&Path> {
        match self {
            TemplateSource::Local(p) => Some(p),
            TemplateSource::Remote(_) => None,
        }
    }
}

/// Where the `mlcore` override came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideOrigin {
    Flag,
    Environment,
    Sibling,
}

/// A resolved local dependency override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalDependency {
    pub path: PathBuf,
    pub origin: OverrideOrigin,
}

/// Output of parameter resolution.
#[derive(Debug, Clone)]
pub struct ResolvedPaths {
    pub template: TemplateSource,
    pub parent_dir: PathBuf,
    pub package_name: String,
    /// Always `<parent_dir>/<package_name>`.
    pub target_dir: PathBuf,
    pub mlcore: Option<LocalDependency>,
}

impl ResolvedPaths {
    pub fn venv_dir(&self) -> PathBuf {
        self.target_dir.join(".venv")
    }
}

/// Resolve every path a run needs. Pure apart from existence checks.
///
/// # Errors
///
/// `ConfigurationError` for an invalid name, a missing explicit path, an
/// undetectable template in local mode, or a target that would land inside
/// the template.
pub fn resolve(params: &BootstrapParams, ctx: &ResolveContext) -> Result<ResolvedPaths> {
    let package_name = naming::package_name(&params.name)?;

    let template = match params.source {
        SourceMode::Local => TemplateSource::Local(resolve_template_dir(params, ctx)?),
        SourceMode::Remote => TemplateSource::Remote(
            params
                .remote_ref
                .clone()
                .filter(|r| !r.trim().is_empty())
                .unwrap_or_else(|| ctx.config.remote_ref.clone()),
        ),
    };

    let parent_dir = match (&params.parent_dir, &template) {
        (Some(explicit), _) => existing_dir(&ctx.cwd, explicit, "parent directory")?,
        (None, TemplateSource::Local(dir)) => dir
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| {
                BootstrapError::configuration(format!(
                    "template at {} has no parent directory; pass --parent-dir",
                    dir.display()
                ))
            })?,
        (None, TemplateSource::Remote(_)) => ctx.cwd.clone(),
    };

    let target_dir = parent_dir.join(&package_name);
    if let Some(template_dir) = template.local_dir() {
        if target_dir.starts_with(template_dir) {
            return Err(BootstrapError::configuration(format!(
                "target {} would be nested inside the template {}; choose a parent directory outside it",
                target_dir.display(),
                template_dir.display()
            )));
        }
    }

    let mlcore = resolve_override(&params.mlcore, &parent_dir, ctx)?;

    Ok(ResolvedPaths {
        template,
        parent_dir,
        package_name,
        target_dir,
        mlcore,
    })
}

/// Stage 2: the target must not exist yet.
pub fn ensure_target_absent(paths: &ResolvedPaths) -> Result<()> {
    // symlink_metadata also catches dangling links at the target path.
    if paths.target_dir.symlink_metadata().is_ok() {
        return Err(BootstrapError::path_conflict(&paths.target_dir));
    }
    Ok(())
}

fn resolve_template_dir(params: &BootstrapParams, ctx: &ResolveContext) -> Result<PathBuf> {
    if let Some(explicit) = &params.template_path {
        return existing_dir(&ctx.cwd, explicit, "template path");
    }
    if let Some(configured) = &ctx.config.template_path {
        return existing_dir(
            &ctx.cwd,
            configured,
            env_keys::template::MLSTART_TEMPLATE_PATH,
        );
    }
    detect_template(ctx).ok_or_else(|| {
        BootstrapError::configuration(format!(
            "no template found in {} or its parents, nor in ./{TEMPLATE_DIR_NAME} (looked for {}); pass --template-path or use --source remote",
            ctx.cwd.display(),
            TEMPLATE_MARKERS.join(" / ")
        ))
    })
}

/// Default template lookup, in order: the working directory and its
/// ancestors, a `ml-project-template` checkout inside the working directory,
/// then the ancestors of the installed binary.
fn detect_template(ctx: &ResolveContext) -> Option<PathBuf> {
    find_template_root(&ctx.cwd)
        .or_else(|| {
            let child = ctx.cwd.join(TEMPLATE_DIR_NAME);
            is_template_root(&child)
                .then(|| child.canonicalize().ok())
                .flatten()
        })
        .or_else(|| ctx.exe_dir.as_deref().and_then(find_template_root))
}

/// Nearest ancestor of `start` (inclusive) carrying a template marker.
pub fn find_template_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| is_template_root(dir))
        .and_then(|dir| dir.canonicalize().ok())
}

pub fn is_template_root(dir: &Path) -> bool {
    TEMPLATE_MARKERS.iter().any(|m| dir.join(m).is_file())
}

fn resolve_override(
    requested: &DependencyOverride,
    parent_dir: &Path,
    ctx: &ResolveContext,
) -> Result<Option<LocalDependency>> {
    match requested {
        DependencyOverride::Disabled => Ok(None),
        DependencyOverride::Path(p) => Ok(Some(LocalDependency {
            path: existing_dir(&ctx.cwd, p, "mlcore path")?,
            origin: OverrideOrigin::Flag,
        })),
        DependencyOverride::Auto => {
            if let Some(p) = &ctx.config.mlcore_local_path {
                return Ok(Some(LocalDependency {
                    path: existing_dir(&ctx.cwd, p, env_keys::dependency::MLCORE_LOCAL_PATH)?,
                    origin: OverrideOrigin::Environment,
                }));
            }
            let sibling = parent_dir.join(MLCORE_DIR_NAME);
            if sibling.is_dir() {
                return Ok(Some(LocalDependency {
                    path: sibling,
                    origin: OverrideOrigin::Sibling,
                }));
            }
            Ok(None)
        }
    }
}

/// Absolute, canonical form of an existing directory; relative paths are
/// taken from `cwd`.
fn existing_dir(cwd: &Path, path: &Path, what: &str) -> Result<PathBuf> {
    let full = if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    };
    match full.canonicalize() {
        Ok(p) if p.is_dir() => Ok(p),
        Ok(p) => Err(BootstrapError::configuration(format!(
            "{what} is not a directory: {}",
            p.display()
        ))),
        Err(_) => Err(BootstrapError::configuration(format!(
            "{what} not found: {}",
            full.display()
        ))),
    }
}
