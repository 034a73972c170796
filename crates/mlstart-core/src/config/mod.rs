//! mlstart configuration layer.
//!
//! Every environment variable read goes through this module; callers use the
//! typed structs in `schema` instead of calling `std::env::var` directly.
//!
//! - `loader`: `env_or`, `env_optional`, `env_bool`, `.env` loading
//! - `schema`: `ObservabilityConfig`, `PathsConfig`, `CacheConfig`
//! - `env_keys`: key constants and their aliases

pub mod env_keys;
pub mod loader;
pub mod schema;

pub use loader::{env_bool, env_optional, env_or, load_dotenv, load_dotenv_from_dir};
pub use schema::{CacheConfig, ObservabilityConfig, PathsConfig};
