//! Pipeline stages of a bootstrap run, in execution order.

use std::fmt;

/// A state the bootstrap pipeline can reach. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    ParamsResolved,
    TargetValidated,
    TemplateReady,
    Rendered,
    DependencyWired,
    EnvironmentReady,
    ShellActive,
}

impl Stage {
    /// Short name used in diagnostics and log fields.
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::ParamsResolved => "params",
            Stage::TargetValidated => "target",
            Stage::TemplateReady => "template-tool",
            Stage::Rendered => "render",
            Stage::DependencyWired => "dependency-wiring",
            Stage::EnvironmentReady => "environment",
            Stage::ShellActive => "shell",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
