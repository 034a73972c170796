//! Error taxonomy for bootstrap runs.
//!
//! Every fatal condition maps to one variant; the binary turns the variant
//! into a one-line diagnostic and a category-specific exit code.

use std::path::PathBuf;
use thiserror::Error;

use crate::stage::Stage;

pub type Result<T, E = BootstrapError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Missing or contradictory parameters, or a named path that does not
    /// exist. Raised before any side effect.
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// The computed target directory already exists.
    #[error("target directory already exists: {}", path.display())]
    PathConflict { path: PathBuf },

    /// The templating tool, installer or environment creator exited non-zero
    /// (or could not be spawned). `output` is the tool's own diagnostics.
    #[error("{tool} failed{}", exit_suffix(*code))]
    ExternalTool {
        stage: Stage,
        tool: String,
        code: Option<i32>,
        output: String,
    },

    /// Environment creation or installation failed after rendering. The
    /// target directory stays on disk.
    #[error("environment setup failed: {message}")]
    Environment {
        message: String,
        output: String,
    },

    /// Unexpected filesystem failure while performing a stage.
    #[error("{message}: {source}")]
    Io {
        stage: Stage,
        message: String,
        #[source]
        source: std::io::Error,
    },
}

fn exit_suffix(code: Option<i32>) -> String {
    match code {
        Some(c) => format!(" with exit code {c}"),
        None => " (terminated by signal)".to_string(),
    }
}

impl BootstrapError {
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn path_conflict(path: impl Into<PathBuf>) -> Self {
        Self::PathConflict { path: path.into() }
    }

    #[must_use]
    pub fn external_tool(
        stage: Stage,
        tool: impl Into<String>,
        code: Option<i32>,
        output: impl Into<String>,
    ) -> Self {
        Self::ExternalTool {
            stage,
            tool: tool.into(),
            code,
            output: output.into(),
        }
    }

    #[must_use]
    pub fn environment(message: impl Into<String>, output: impl Into<String>) -> Self {
        Self::Environment {
            message: message.into(),
            output: output.into(),
        }
    }

    #[must_use]
    pub fn io(stage: Stage, message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            stage,
            message: message.into(),
            source,
        }
    }

    /// Stage the failure belongs to.
    pub fn stage(&self) -> Stage {
        match self {
            Self::Configuration { .. } => Stage::ParamsResolved,
            Self::PathConflict { .. } => Stage::TargetValidated,
            Self::ExternalTool { stage, .. } | Self::Io { stage, .. } => *stage,
            Self::Environment { .. } => Stage::EnvironmentReady,
        }
    }

    /// Verbatim output of the failing external tool, if any.
    pub fn tool_output(&self) -> Option<&str> {
        match self {
            Self::ExternalTool { output, .. } | Self::Environment { output, .. }
                if !output.trim().is_empty() =>
            {
                Some(output.as_str())
            }
            _ => None,
        }
    }

    /// Process exit code for this error category.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Configuration { .. } => 2,
            Self::PathConflict { .. } => 3,
            Self::ExternalTool { .. } => 4,
            Self::Environment { .. } => 5,
            Self::Io { .. } => 1,
        }
    }

    /// Category name, as used in user-facing diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => "ConfigurationError",
            Self::PathConflict { .. } => "PathConflictError",
            Self::ExternalTool { .. } => "ExternalToolError",
            Self::Environment { .. } => "EnvironmentError",
            Self::Io { .. } => "IoError",
        }
    }
}
