//! Project name → package name derivation.
//!
//! The package name doubles as the target directory name and the Python
//! import name, so it must be both filesystem-safe and import-safe.

use regex::Regex;
use std::sync::OnceLock;

use crate::error::{BootstrapError, Result};

/// Python keywords; a package with one of these names cannot be imported.
const PYTHON_KEYWORDS: &[&str] = &[
    "false", "none", "true", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global", "if",
    "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return", "try",
    "while", "with", "yield",
];

fn separator_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-z0-9]+").expect("static regex"))
}

/// Lowercase the name and collapse every run of other characters into `_`.
///
/// Deterministic and total; use [`package_name`] for the validated form.
pub fn normalize(name: &str) -> String {
    let lower = name.trim().to_lowercase();
    separator_run()
        .replace_all(&lower, "_")
        .trim_matches('_')
        .to_string()
}

/// Derive the import-safe package name for a project name.
///
/// # Errors
///
/// `ConfigurationError` when the name is empty, normalizes to nothing,
/// starts with a digit, or is a Python keyword.
pub fn package_name(project_name: &str) -> Result<String> {
    if project_name.trim().is_empty() {
        return Err(BootstrapError::configuration("project name is required"));
    }
    let pkg = normalize(project_name);
    if pkg.is_empty() {
        return Err(BootstrapError::configuration(format!(
            "project name '{project_name}' has no letters or digits"
        )));
    }
    if pkg.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(BootstrapError::configuration(format!(
            "package name '{pkg}' (from '{project_name}') must not start with a digit"
        )));
    }
    if PYTHON_KEYWORDS.contains(&pkg.as_str()) {
        return Err(BootstrapError::configuration(format!(
            "package name '{pkg}' is a Python keyword"
        )));
    }
    Ok(pkg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kebab_case_becomes_snake_case() {
        assert_eq!(package_name("my-new-project").unwrap(), "my_new_project");
    }

    #[test]
    fn test_mixed_separators_and_case() {
        assert_eq!(package_name("  My New.Project--v2 ").unwrap(), "my_new_project_v2");
        assert_eq!(normalize("__already_snake__"), "already_snake");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for name in ["my-new-project", "A B C", "x__y", "Élan-ml"] {
            let once = normalize(name);
            assert_eq!(normalize(&once), once);
        }
    }

    #[test]
    fn test_rejects_empty_and_symbol_only_names() {
        assert!(matches!(
            package_name("   "),
            Err(BootstrapError::Configuration { .. })
        ));
        assert!(matches!(
            package_name("---"),
            Err(BootstrapError::Configuration { .. })
        ));
    }

    #[test]
    fn test_rejects_leading_digit_and_keywords() {
        assert!(package_name("2fast").is_err());
        assert!(package_name("Import").is_err());
        assert!(package_name("class-").is_err());
    }
}
