//! Environment layer: everything that spawns or locates external programs.
//!
//! Callers hand in a [`runner::ProcessRunner`] and a
//! [`locate::ExecutableLocator`]; nothing in here reaches for ambient process
//! state on its own, so tests can substitute both.

pub mod locate;
pub mod python;
pub mod runner;
pub mod shell;
pub mod templating;
pub mod venv;

pub use locate::{ExecutableLocator, PathLocator};
pub use runner::{run_checked, CommandSpec, ProcessOutput, ProcessRunner, SystemRunner};
pub use shell::{shell_command, Platform, ShellEnv, ShellFamily};
pub use templating::{TemplatingTool, TemplatingToolProvider, TemplatingToolResolver, ToolOrigin};
pub use venv::VenvHandle;

#[cfg(test)]
pub(crate) mod testing;
