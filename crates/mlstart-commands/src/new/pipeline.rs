//! The bootstrap pipeline as an explicit state machine.
//!
//! ```text
//! Start → ParamsResolved → TargetValidated → TemplateReady → Rendered
//!       → DependencyWired → EnvironmentReady → ShellActive → Finished
//! ```
//!
//! Each transition is one method. Stages are recorded in the trail as they
//! complete; `DependencyWired` only counts when a local override was wired,
//! `EnvironmentReady` only when a venv was created, `ShellActive` only when
//! a shell was launched. Nothing is retried and nothing is rolled back: a
//! failure after rendering leaves the target on disk.

use std::path::{Path, PathBuf};

use mlstart_core::observability;
use mlstart_core::params::BootstrapParams;
use mlstart_core::paths::{self, ResolveContext, ResolvedPaths, TemplateSource};
use mlstart_core::{BootstrapError, Result, Stage};
use mlstart_env::{
    python, shell_command, venv, ExecutableLocator, Platform, ProcessRunner, ShellEnv,
    TemplatingTool, TemplatingToolProvider, VenvHandle,
};

use super::post_render;
use super::render;
use super::wiring::{self, Wiring};

/// External collaborators of a run.
#[derive(Clone, Copy)]
pub struct Services<'a> {
    pub runner: &'a dyn ProcessRunner,
    pub locator: &'a dyn ExecutableLocator,
    pub tools: &'a dyn TemplatingToolProvider,
}

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct BootstrapReport {
    pub target_dir: PathBuf,
    pub package_name: String,
    pub template: TemplateSource,
    pub wiring: Wiring,
    pub venv: Option<VenvHandle>,
    /// `Some(exit code)` when an interactive shell was launched.
    pub shell_exit: Option<Option<i32>>,
    pub stages: Vec<Stage>,
}

impl BootstrapReport {
    pub fn entered_shell(&self) -> bool {
        self.shell_exit.is_some()
    }
}

enum State {
    Start,
    ParamsResolved(ResolvedPaths),
    TargetValidated(ResolvedPaths),
    TemplateReady(ResolvedPaths, TemplatingTool),
    Rendered(ResolvedPaths),
    DependencyWired(ResolvedPaths, Wiring),
    EnvironmentReady(ResolvedPaths, Wiring, Option<VenvHandle>),
    Finished(Box<BootstrapReport>),
}

pub struct Orchestrator<'a> {
    params: BootstrapParams,
    ctx: ResolveContext,
    services: Services<'a>,
    shell_env: ShellEnv,
    platform: Platform,
    trail: Vec<Stage>,
    target: Option<PathBuf>,
}

impl<'a> Orchestrator<'a> {
    pub fn new(params: BootstrapParams, ctx: ResolveContext, services: Services<'a>) -> Self {
        Self {
            params,
            ctx,
            services,
            shell_env: ShellEnv::default(),
            platform: Platform::current(),
            trail: Vec::new(),
            target: None,
        }
    }

    /// Shell selection inputs (`$SHELL`, `%ComSpec%`) and platform rules.
    pub fn with_shell_env(mut self, shell_env: ShellEnv, platform: Platform) -> Self {
        self.shell_env = shell_env;
        self.platform = platform;
        self
    }

    /// Stages reached so far, in order. Valid after success or failure.
    pub fn trail(&self) -> &[Stage] {
        &self.trail
    }

    /// Computed target directory, once parameters are resolved.
    pub fn target_dir(&self) -> Option<&Path> {
        self.target.as_deref()
    }

    /// Drive the pipeline to completion.
    pub fn run(&mut self) -> Result<BootstrapReport> {
        let mut state = State::Start;
        loop {
            state = match state {
                State::Start => self.resolve_params()?,
                State::ParamsResolved(p) => self.validate_target(p)?,
                State::TargetValidated(p) => self.prepare_template(p)?,
                State::TemplateReady(p, tool) => self.render(p, &tool)?,
                State::Rendered(p) => self.wire_dependency(p)?,
                State::DependencyWired(p, w) => self.create_environment(p, w)?,
                State::EnvironmentReady(p, w, v) => self.enter_shell(p, w, v)?,
                State::Finished(report) => return Ok(*report),
            };
        }
    }

    fn reach(&mut self, stage: Stage, target: &Path) {
        self.trail.push(stage);
        observability::audit_stage_reached(stage, target);
    }

    fn resolve_params(&mut self) -> Result<State> {
        let resolved = paths::resolve(&self.params, &self.ctx)?;
        tracing::info!(
            template = %resolved.template.reference(),
            target = %resolved.target_dir.display(),
            mlcore = ?resolved.mlcore.as_ref().map(|d| d.path.display().to_string()),
            "parameters resolved"
        );
        self.target = Some(resolved.target_dir.clone());
        self.reach(Stage::ParamsResolved, &resolved.target_dir);
        Ok(State::ParamsResolved(resolved))
    }

    fn validate_target(&mut self, resolved: ResolvedPaths) -> Result<State> {
        paths::ensure_target_absent(&resolved)?;
        self.reach(Stage::TargetValidated, &resolved.target_dir);
        Ok(State::TargetValidated(resolved))
    }

    fn prepare_template(&mut self, resolved: ResolvedPaths) -> Result<State> {
        let tool = self.services.tools.ensure()?;
        tracing::debug!(tool = %tool.program.display(), origin = ?tool.origin, "templating tool ready");
        self.reach(Stage::TemplateReady, &resolved.target_dir);
        Ok(State::TemplateReady(resolved, tool))
    }

    fn render(&mut self, resolved: ResolvedPaths, tool: &TemplatingTool) -> Result<State> {
        render::render(self.services.runner, tool, &self.params, &resolved)?;
        post_render::check_answers(&resolved.target_dir, &resolved.package_name);
        post_render::ensure_notebooks(
            &resolved.target_dir,
            &resolved.template,
            &resolved.package_name,
        );
        self.reach(Stage::Rendered, &resolved.target_dir);
        Ok(State::Rendered(resolved))
    }

    fn wire_dependency(&mut self, resolved: ResolvedPaths) -> Result<State> {
        let wiring = wiring::wire_dependency(&resolved.target_dir, resolved.mlcore.as_ref())?;
        if matches!(wiring, Wiring::Local(_)) {
            self.reach(Stage::DependencyWired, &resolved.target_dir);
        }
        Ok(State::DependencyWired(resolved, wiring))
    }

    fn create_environment(&mut self, resolved: ResolvedPaths, wiring: Wiring) -> Result<State> {
        if !self.params.create_env {
            tracing::info!("skipping venv creation and installs (--skip-venv)");
            return Ok(State::EnvironmentReady(resolved, wiring, None));
        }

        let runner = self.services.runner;
        let target = resolved.target_dir.as_path();
        let interpreter = python::find_python(
            runner,
            self.services.locator,
            &self.params.python_version,
            self.params.exact_python,
        )
        .ok_or_else(|| {
            BootstrapError::environment(
                "no Python interpreter found on PATH",
                format!(
                    "looked for {}",
                    python::candidate_names(&self.params.python_version).join(", ")
                ),
            )
        })?;

        tracing::info!("Creating venv with: {}", interpreter.display());
        let env = venv::create(runner, &interpreter, &resolved.venv_dir(), Some(target))?;
        venv::upgrade_pip(runner, &env)?;
        match &wiring {
            Wiring::Local(path) => {
                tracing::info!("Installing local mlcore editable: {}", path.display());
                venv::install_editable(runner, &env, &path.to_string_lossy(), Some(target))?;
            }
            Wiring::Pinned => {
                tracing::info!("No local mlcore path provided/detected; skipping editable install")
            }
        }
        tracing::info!("Installing generated project (editable)");
        venv::install_editable(runner, &env, ".", Some(target))?;

        self.reach(Stage::EnvironmentReady, target);
        Ok(State::EnvironmentReady(resolved, wiring, Some(env)))
    }

    fn enter_shell(
        &mut self,
        resolved: ResolvedPaths,
        wiring: Wiring,
        env: Option<VenvHandle>,
    ) -> Result<State> {
        let shell_exit = match (&env, self.params.wants_shell()) {
            (Some(handle), true) => {
                let cmd = shell_command(
                    &self.params.shell,
                    handle,
                    &resolved.target_dir,
                    &self.shell_env,
                    self.platform,
                );
                eprintln!("\n[enter] Opening an interactive shell in the project with venv activated...");
                self.reach(Stage::ShellActive, &resolved.target_dir);
                let status = match self.services.runner.run_interactive(&cmd) {
                    Ok(code) => code,
                    Err(e) => {
                        tracing::warn!("could not launch {}: {e}", cmd.program.display());
                        None
                    }
                };
                tracing::info!(exit_code = ?status, "shell exited");
                Some(status)
            }
            _ => None,
        };

        Ok(State::Finished(Box::new(BootstrapReport {
            target_dir: resolved.target_dir,
            package_name: resolved.package_name,
            template: resolved.template,
            wiring,
            venv: env,
            shell_exit,
            stages: self.trail.clone(),
        })))
    }
}
