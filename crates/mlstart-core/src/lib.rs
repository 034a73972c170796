pub mod config;
pub mod error;
pub mod naming;
pub mod observability;
pub mod params;
pub mod paths;
pub mod stage;

pub use error::{BootstrapError, Result};
pub use stage::Stage;
