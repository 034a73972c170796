//! Subprocess invocation behind a narrow trait.
//!
//! `ProcessRunner` takes a [`CommandSpec`] (program, args, working directory,
//! environment edits) and returns the exit code plus captured output. The
//! interactive variant inherits the terminal and only reports the exit code.

use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Instant;

use mlstart_core::observability;
use mlstart_core::{BootstrapError, Stage};

/// A fully described external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub env: Vec<(String, String)>,
    /// Variables removed from the inherited environment.
    pub env_remove: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            env: Vec::new(),
            env_remove: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn env_remove(mut self, key: impl Into<String>) -> Self {
        self.env_remove.push(key.into());
        self
    }

    /// File name of the program, for diagnostics.
    pub fn program_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.program.to_string_lossy().into_owned())
    }

    /// Shell-like rendering used in `[cmd]` log lines.
    pub fn display(&self) -> String {
        let mut out = self.program.to_string_lossy().into_owned();
        for a in &self.args {
            out.push(' ');
            if a.is_empty() || a.contains(char::is_whitespace) {
                out.push_str(&format!("'{a}'"));
            } else {
                out.push_str(a);
            }
        }
        out
    }

    fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }
        for key in &self.env_remove {
            cmd.env_remove(key);
        }
        for (k, v) in &self.env {
            cmd.env(k, v);
        }
        cmd
    }
}

/// Exit status and captured streams of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// `None` when the process was terminated by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// stdout followed by stderr, for verbatim pass-through in errors.
    pub fn combined(&self) -> String {
        match (self.stdout.trim().is_empty(), self.stderr.trim().is_empty()) {
            (true, _) => self.stderr.clone(),
            (false, true) => self.stdout.clone(),
            (false, false) => format!("{}\n{}", self.stdout.trim_end(), self.stderr),
        }
    }
}

/// Spawns external programs.
pub trait ProcessRunner {
    /// Run to completion, capturing stdout and stderr.
    fn run(&self, cmd: &CommandSpec) -> io::Result<ProcessOutput>;

    /// Run attached to the current terminal; blocks until it exits.
    fn run_interactive(&self, cmd: &CommandSpec) -> io::Result<Option<i32>>;
}

/// Runs commands with `std::process`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, cmd: &CommandSpec) -> io::Result<ProcessOutput> {
        let program = cmd.program_name();
        observability::audit_process_started(&program, &cmd.args, cmd.cwd.as_deref());
        let started = Instant::now();
        let result = cmd
            .to_command()
            .stdin(Stdio::null())
            .output()
            .map(|out| ProcessOutput {
                code: out.status.code(),
                stdout: String::from_utf8_lossy(&out.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&out.stderr).into_owned(),
            });
        let code = result.as_ref().ok().and_then(|o| o.code);
        observability::audit_process_finished(&program, code, elapsed_ms(started));
        result
    }

    fn run_interactive(&self, cmd: &CommandSpec) -> io::Result<Option<i32>> {
        let program = cmd.program_name();
        observability::audit_process_started(&program, &cmd.args, cmd.cwd.as_deref());
        let started = Instant::now();
        let result = cmd.to_command().status().map(|s| s.code());
        let code = result.as_ref().ok().copied().flatten();
        observability::audit_process_finished(&program, code, elapsed_ms(started));
        result
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Run `cmd` and turn a spawn failure or non-zero exit into an
/// `ExternalToolError` attributed to `stage`.
pub fn run_checked(
    runner: &dyn ProcessRunner,
    cmd: &CommandSpec,
    stage: Stage,
    tool: &str,
) -> Result<ProcessOutput, BootstrapError> {
    tracing::info!("[cmd] {}{}", cmd.display(), cwd_suffix(cmd.cwd.as_deref()));
    let out = runner.run(cmd).map_err(|e| {
        BootstrapError::external_tool(
            stage,
            tool,
            None,
            format!("failed to execute {}: {e}", cmd.program.display()),
        )
    })?;
    if !out.success() {
        return Err(BootstrapError::external_tool(
            stage,
            tool,
            out.code,
            out.combined(),
        ));
    }
    if !out.stdout.trim().is_empty() {
        tracing::debug!(tool, "{}", out.stdout.trim_end());
    }
    Ok(out)
}

fn cwd_suffix(cwd: Option<&Path>) -> String {
    cwd.map(|c| format!("  (cwd={})", c.display()))
        .unwrap_or_default()
}
