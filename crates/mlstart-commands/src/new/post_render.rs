//! Sanity checks on the rendered project. Nothing here is fatal.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;

use mlstart_core::paths::TemplateSource;

pub const ANSWERS_FILE: &str = ".copier-answers.yml";

/// Fields of `.copier-answers.yml` the bootstrap cares about.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct CopierAnswers {
    #[serde(rename = "_commit")]
    pub commit: Option<String>,
    #[serde(rename = "_src_path")]
    pub src_path: Option<String>,
    pub package_name: Option<String>,
}

/// Read the answers file; warn when it is missing or unreadable.
pub fn check_answers(target: &Path, package_name: &str) -> Option<CopierAnswers> {
    let file = target.join(ANSWERS_FILE);
    let content = match fs::read_to_string(&file) {
        Ok(c) => c,
        Err(_) => {
            tracing::warn!(
                "{ANSWERS_FILE} not found in the generated project; Copier may not have run as \
                 expected (verify `copier --version` is >= 9.2)"
            );
            return None;
        }
    };
    let answers: CopierAnswers = match serde_yaml::from_str(&content) {
        Ok(a) => a,
        Err(e) => {
            tracing::warn!("could not parse {}: {e}", file.display());
            return None;
        }
    };
    tracing::debug!(
        commit = answers.commit.as_deref().unwrap_or("-"),
        src = answers.src_path.as_deref().unwrap_or("-"),
        "copier answers"
    );
    if let Some(recorded) = answers.package_name.as_deref() {
        if recorded != package_name {
            tracing::warn!(
                "{ANSWERS_FILE} records package_name '{recorded}', expected '{package_name}'"
            );
        }
    }
    Some(answers)
}

fn package_placeholder() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{\s*package_name\s*\}\}").expect("static regex"))
}

/// Template-side notebooks directory for a local template.
pub fn template_notebooks_dir(template_root: &Path) -> PathBuf {
    template_root
        .join("template")
        .join("{{ project_slug }}")
        .join("lab")
        .join("notebooks")
}

/// Write `lab/notebooks/*.ipynb` from the template's `*.ipynb.j2` when Copier
/// skipped them. Returns the number of notebooks written.
pub fn ensure_notebooks(target: &Path, template: &TemplateSource, package_name: &str) -> usize {
    let notebooks = target.join("lab").join("notebooks");
    if notebooks.exists() {
        return 0;
    }
    let Some(root) = template.local_dir() else {
        tracing::warn!(
            "notebooks directory missing and the template is remote; the fallback render needs a local template"
        );
        return 0;
    };
    let source = template_notebooks_dir(root);
    if !source.is_dir() {
        tracing::warn!(
            "template notebooks not found at {}; skipping fallback render",
            source.display()
        );
        return 0;
    }
    match render_notebooks(&source, &notebooks, package_name) {
        Ok(n) => {
            tracing::warn!(
                "notebooks directory was missing; wrote {n} fallback notebook(s) to {}",
                notebooks.display()
            );
            n
        }
        Err(e) => {
            tracing::warn!("could not create fallback notebooks: {e}");
            0
        }
    }
}

fn render_notebooks(source: &Path, dest: &Path, package_name: &str) -> io::Result<usize> {
    fs::create_dir_all(dest)?;
    let mut written = 0;
    for entry in fs::read_dir(source)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Some(stem) = name.strip_suffix(".j2").filter(|s| s.ends_with(".ipynb")) else {
            continue;
        };
        let text = fs::read_to_string(&path)?;
        let rendered = package_placeholder().replace_all(&text, package_name);
        fs::write(dest.join(stem), rendered.as_bytes())?;
        written += 1;
    }
    Ok(written)
}
