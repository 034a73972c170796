//! Configuration structs grouped by concern, loaded from the environment.

use super::env_keys::{cache as cache_keys, dependency, observability as obv_keys, template};
use super::loader::{env_bool, env_optional, env_or};
use std::path::PathBuf;

/// Default hosted template reference used in `remote` mode.
pub const DEFAULT_REMOTE_REF: &str = "gh:tristan-day-research/ml-project-template";

/// Logging configuration: quiet, log_level, log_json, audit_log.
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    pub quiet: bool,
    pub log_level: String,
    pub log_json: bool,
    pub audit_log: Option<String>,
}

impl ObservabilityConfig {
    /// Loaded once per process.
    pub fn from_env() -> &'static Self {
        use std::sync::OnceLock;
        static CACHE: OnceLock<ObservabilityConfig> = OnceLock::new();
        CACHE.get_or_init(|| {
            super::loader::load_dotenv();
            Self {
                quiet: env_bool(obv_keys::MLSTART_QUIET, obv_keys::QUIET_ALIASES, false),
                log_level: env_or(
                    obv_keys::MLSTART_LOG_LEVEL,
                    obv_keys::LOG_LEVEL_ALIASES,
                    || "mlstart=info".to_string(),
                ),
                log_json: env_bool(obv_keys::MLSTART_LOG_JSON, obv_keys::LOG_JSON_ALIASES, false),
                audit_log: env_optional(obv_keys::MLSTART_AUDIT_LOG, obv_keys::AUDIT_LOG_ALIASES),
            }
        })
    }
}

/// Ambient path defaults. CLI flags take precedence over every field here.
#[derive(Debug, Clone, Default)]
pub struct PathsConfig {
    pub template_path: Option<PathBuf>,
    pub remote_ref: String,
    /// `MLCORE_LOCAL_PATH`, if set.
    pub mlcore_local_path: Option<PathBuf>,
}

impl PathsConfig {
    pub fn from_env() -> Self {
        super::loader::load_dotenv();
        Self {
            template_path: env_optional(
                template::MLSTART_TEMPLATE_PATH,
                template::TEMPLATE_PATH_ALIASES,
            )
            .map(PathBuf::from),
            remote_ref: env_or(template::MLSTART_REMOTE_REF, template::REMOTE_REF_ALIASES, || {
                DEFAULT_REMOTE_REF.to_string()
            }),
            mlcore_local_path: env_optional(dependency::MLCORE_LOCAL_PATH, &[]).map(PathBuf::from),
        }
    }
}

/// Location of the private bootstrap environment.
#[derive(Debug, Clone)]
pub struct CacheConfig;

impl CacheConfig {
    /// `MLSTART_CACHE_DIR`, else `<system cache>/mlstart`, else `./.cache/mlstart`.
    pub fn cache_dir() -> PathBuf {
        super::loader::load_dotenv();
        env_optional(cache_keys::MLSTART_CACHE_DIR, cache_keys::CACHE_DIR_ALIASES)
            .map(PathBuf::from)
            .or_else(|| dirs::cache_dir().map(|d| d.join("mlstart")))
            .unwrap_or_else(|| PathBuf::from(".").join(".cache").join("mlstart"))
    }
}
