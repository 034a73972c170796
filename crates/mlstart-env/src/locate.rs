//! Executable lookup on `PATH`.

use std::path::PathBuf;

/// Finds programs by name.
pub trait ExecutableLocator {
    fn find(&self, name: &str) -> Option<PathBuf>;
}

/// Searches the process `PATH` via the `which` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct PathLocator;

impl ExecutableLocator for PathLocator {
    fn find(&self, name: &str) -> Option<PathBuf> {
        which::which(name).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn test_path_locator_finds_sh() {
        let sh = PathLocator.find("sh").unwrap();
        assert!(sh.is_absolute());
    }

    #[test]
    fn test_path_locator_misses_unknown_program() {
        assert!(PathLocator.find("mlstart-no-such-program-xyz").is_none());
    }
}
