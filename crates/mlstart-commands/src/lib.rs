//! Commands behind the `mlstart` binary.

pub mod new;
