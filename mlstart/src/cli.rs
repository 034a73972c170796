use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use mlstart_core::params::{
    BootstrapParams, DependencyOverride, ShellOptions, SourceMode, TemplateFeatures,
    DEFAULT_PYTHON_VERSION,
};
use mlstart_core::{BootstrapError, Result};

/// mlstart - bootstrap an ML project from its Copier template
#[derive(Parser, Debug)]
#[command(name = "mlstart")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Debug logging (RUST_LOG / MLSTART_LOG_LEVEL still win)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render a new project next to the template, create its venv and enter it
    New(NewArgs),
}

#[derive(Args, Debug)]
pub struct NewArgs {
    /// Project name; the package and directory name are derived from it
    #[arg(long, value_name = "NAME")]
    pub name: Option<String>,

    /// Where the template comes from
    #[arg(long, value_enum, ignore_case = true, default_value_t = SourceArg::Local)]
    pub source: SourceArg,

    /// Template checkout (default: MLSTART_TEMPLATE_PATH, the nearest ancestor with copier.yml, or ./ml-project-template)
    #[arg(long, value_name = "DIR")]
    pub template_path: Option<PathBuf>,

    /// Hosted template reference for --source remote
    #[arg(long, value_name = "REF")]
    pub remote_ref: Option<String>,

    /// Directory the project is created in (default: the template's parent)
    #[arg(long, value_name = "DIR")]
    pub parent_dir: Option<PathBuf>,

    /// Local mlcore checkout to install editable, or 'none' to use the published package
    #[arg(long, value_name = "DIR|none")]
    pub mlcore_path: Option<String>,

    /// Render only: no venv, no installs, no shell
    #[arg(long)]
    pub skip_venv: bool,

    /// Open a shell in the project with the venv activated (default)
    #[arg(long, overrides_with = "no_enter")]
    pub enter: bool,

    /// Do not open a shell after setup
    #[arg(long, overrides_with = "enter")]
    pub no_enter: bool,

    /// Shell to spawn (bash, zsh, fish, tcsh, cmd, powershell)
    #[arg(long, value_name = "SHELL")]
    pub shell: Option<String>,

    /// Start the shell without user rc files
    #[arg(long)]
    pub clean: bool,

    /// Python version for the template and the venv
    #[arg(long, value_name = "X.Y", default_value = DEFAULT_PYTHON_VERSION)]
    pub python: String,

    /// Require an interpreter reporting exactly --python when one exists
    #[arg(long)]
    pub exact_python: bool,

    /// Leave out orchestration flow stubs
    #[arg(long)]
    pub no_flows: bool,

    /// Leave out schema validation tasks
    #[arg(long)]
    pub no_schema_validation: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceArg {
    /// Template checkout on disk
    Local,
    /// Hosted reference (--remote-ref or MLSTART_REMOTE_REF)
    #[value(alias = "gh")]
    Remote,
}

impl From<SourceArg> for SourceMode {
    fn from(arg: SourceArg) -> Self {
        match arg {
            SourceArg::Local => SourceMode::Local,
            SourceArg::Remote => SourceMode::Remote,
        }
    }
}

impl NewArgs {
    pub fn into_params(self) -> Result<BootstrapParams> {
        let name = self
            .name
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| BootstrapError::configuration("--name is required"))?;
        if !is_version(&self.python) {
            return Err(BootstrapError::configuration(format!(
                "--python expects MAJOR.MINOR (e.g. 3.11), got '{}'",
                self.python
            )));
        }

        let mut params = BootstrapParams::new(name);
        params.source = self.source.into();
        params.template_path = self.template_path;
        params.remote_ref = self.remote_ref;
        params.parent_dir = self.parent_dir;
        params.mlcore = DependencyOverride::from_arg(self.mlcore_path.as_deref());
        params.create_env = !self.skip_venv;
        params.python_version = self.python;
        params.exact_python = self.exact_python;
        params.shell = ShellOptions {
            enter: !self.no_enter,
            shell: self.shell,
            clean: self.clean,
        };
        params.features = TemplateFeatures {
            flows: !self.no_flows,
            schema_validation: !self.no_schema_validation,
        };
        Ok(params)
    }
}

fn is_version(v: &str) -> bool {
    matches!(
        v.split_once('.'),
        Some((major, minor))
            if !major.is_empty()
                && !minor.is_empty()
                && major.chars().all(|c| c.is_ascii_digit())
                && minor.chars().all(|c| c.is_ascii_digit())
    )
}
