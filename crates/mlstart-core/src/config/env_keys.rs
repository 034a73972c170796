//! Environment variable keys.
//!
//! Primary keys use the `MLSTART_*` prefix. `MLCORE_LOCAL_PATH` is shared with
//! the template's own post-generation hook and keeps its historical name.

/// Template location and remote reference.
pub mod template {
    pub const MLSTART_TEMPLATE_PATH: &str = "MLSTART_TEMPLATE_PATH";
    pub const TEMPLATE_PATH_ALIASES: &[&str] = &["ML_PROJECT_TEMPLATE_PATH"];

    pub const MLSTART_REMOTE_REF: &str = "MLSTART_REMOTE_REF";
    pub const REMOTE_REF_ALIASES: &[&str] = &["ML_PROJECT_TEMPLATE_GH_SPEC"];
}

/// Local library override.
pub mod dependency {
    /// Read by the bootstrap and exported to the Copier subprocess.
    pub const MLCORE_LOCAL_PATH: &str = "MLCORE_LOCAL_PATH";
}

/// Private bootstrap environment.
pub mod cache {
    pub const MLSTART_CACHE_DIR: &str = "MLSTART_CACHE_DIR";
    pub const CACHE_DIR_ALIASES: &[&str] = &[];
}

/// Logging and audit trail.
pub mod observability {
    pub const MLSTART_QUIET: &str = "MLSTART_QUIET";
    pub const QUIET_ALIASES: &[&str] = &[];

    pub const MLSTART_LOG_LEVEL: &str = "MLSTART_LOG_LEVEL";
    pub const LOG_LEVEL_ALIASES: &[&str] = &[];

    pub const MLSTART_LOG_JSON: &str = "MLSTART_LOG_JSON";
    pub const LOG_JSON_ALIASES: &[&str] = &[];

    pub const MLSTART_AUDIT_LOG: &str = "MLSTART_AUDIT_LOG";
    pub const AUDIT_LOG_ALIASES: &[&str] = &[];
}

/// Shell detection.
pub mod shell {
    pub const SHELL: &str = "SHELL";
    pub const COMSPEC: &str = "ComSpec";
}
