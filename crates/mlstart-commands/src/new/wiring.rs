//! Wiring the `mlcore` dependency into the generated `pyproject.toml`.
//!
//! With a local override the requirement becomes a `file://` direct
//! reference and a `[tool.uv.sources]` entry is added, so both pip and uv
//! resolve the checkout. Without one, any direct reference left by the
//! template is replaced by the published version range.

use std::fs;
use std::path::{Path, PathBuf};

use toml_edit::{value, Array, DocumentMut, InlineTable, Item, Table, Value};
use url::Url;

use mlstart_core::paths::LocalDependency;
use mlstart_core::{BootstrapError, Result, Stage};

pub const PYPROJECT: &str = "pyproject.toml";

/// Requirement used when no local checkout is wired.
pub const PINNED_REQUIREMENT: &str = "mlcore>=0.1,<0.2";

const PACKAGE: &str = "mlcore";

/// How `mlcore` ended up referenced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Wiring {
    Local(PathBuf),
    Pinned,
}

impl Wiring {
    pub fn local_path(&self) -> Option<&Path> {
        match self {
            Wiring::Local(p) => Some(p),
            Wiring::Pinned => None,
        }
    }
}

/// Rewrite `<target>/pyproject.toml` for the resolved override.
///
/// # Errors
///
/// `ExternalToolError` when an override is present but the template did not
/// produce a readable `pyproject.toml`.
pub fn wire_dependency(target: &Path, mlcore: Option<&LocalDependency>) -> Result<Wiring> {
    let file = target.join(PYPROJECT);

    let Some(dep) = mlcore else {
        if let Err(e) = pin_file(&file) {
            tracing::warn!("could not normalize the mlcore requirement: {e}");
        }
        return Ok(Wiring::Pinned);
    };

    if !file.is_file() {
        return Err(rendered_unexpectedly(format!(
            "{} was not generated; cannot wire local mlcore at {}",
            file.display(),
            dep.path.display()
        )));
    }
    let mut doc = read(&file)?;
    apply_local(&mut doc, &dep.path);
    write(&file, &doc)?;
    tracing::info!(mlcore = %dep.path.display(), "wired local mlcore into {PYPROJECT}");
    Ok(Wiring::Local(dep.path.clone()))
}

fn pin_file(file: &Path) -> Result<()> {
    if !file.is_file() {
        tracing::warn!("{} not found; skipping dependency normalization", file.display());
        return Ok(());
    }
    let mut doc = read(file)?;
    if apply_pinned(&mut doc) {
        write(file, &doc)?;
        tracing::info!("replaced mlcore direct reference with {PINNED_REQUIREMENT}");
    }
    Ok(())
}

fn read(file: &Path) -> Result<DocumentMut> {
    let content = fs::read_to_string(file).map_err(|e| {
        BootstrapError::io(
            Stage::DependencyWired,
            format!("reading {}", file.display()),
            e,
        )
    })?;
    content
        .parse::<DocumentMut>()
        .map_err(|e| rendered_unexpectedly(format!("{} is not valid TOML: {e}", file.display())))
}

fn write(file: &Path, doc: &DocumentMut) -> Result<()> {
    fs::write(file, doc.to_string()).map_err(|e| {
        BootstrapError::io(
            Stage::DependencyWired,
            format!("writing {}", file.display()),
            e,
        )
    })
}

fn rendered_unexpectedly(message: String) -> BootstrapError {
    BootstrapError::external_tool(Stage::DependencyWired, "copier", None, message)
}

/// `mlcore`, `mlcore>=0.1`, `mlcore @ file:///x`, `mlcore[extra]; python_version>'3'`
/// but not `mlcore-utils`.
pub fn is_mlcore_requirement(req: &str) -> bool {
    let req = req.trim();
    let Some(rest) = req
        .get(..PACKAGE.len())
        .filter(|head| head.eq_ignore_ascii_case(PACKAGE))
        .map(|_| &req[PACKAGE.len()..])
    else {
        return false;
    };
    !rest
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

fn is_direct_reference(req: &str) -> bool {
    is_mlcore_requirement(req) && req.contains('@')
}

/// Percent-encoded `file://` URL for an absolute path.
pub fn file_url(path: &Path) -> String {
    match Url::from_file_path(path) {
        Ok(url) => url.into(),
        // Only relative paths land here.
        Err(()) => format!("file://{}", path.to_string_lossy().replace('\\', "/")),
    }
}

/// Point `mlcore` at `path`. Only the requirement, `[tool.uv.sources]` and
/// `[tool.hatch.metadata]` are touched; everything else keeps its layout.
pub fn apply_local(doc: &mut DocumentMut, path: &Path) {
    let requirement = format!("{PACKAGE} @ {}", file_url(path));
    let deps = dependencies_mut(ensure_table(doc.as_table_mut(), "project"));
    let existing = deps
        .iter()
        .position(|v| v.as_str().is_some_and(is_mlcore_requirement));
    match existing {
        Some(i) => {
            deps.replace(i, requirement);
        }
        None => deps.push(requirement),
    }

    let mut source = InlineTable::new();
    source.insert("path", Value::from(path.to_string_lossy().into_owned()));
    source.insert("editable", Value::from(true));
    let tool = ensure_table(doc.as_table_mut(), "tool");
    ensure_table(ensure_table(tool, "uv"), "sources").insert(PACKAGE, value(source));

    // hatchling rejects direct references unless told otherwise.
    let uses_hatchling = doc
        .get("build-system")
        .and_then(|b| b.get("build-backend"))
        .and_then(Item::as_str)
        .is_some_and(|b| b.contains("hatchling"));
    if uses_hatchling {
        let tool = ensure_table(doc.as_table_mut(), "tool");
        ensure_table(ensure_table(tool, "hatch"), "metadata")
            .insert("allow-direct-references", value(true));
    }
}

/// Replace direct `mlcore` references with [`PINNED_REQUIREMENT`] and drop
/// the uv source entry. Returns whether anything changed.
pub fn apply_pinned(doc: &mut DocumentMut) -> bool {
    let mut changed = false;

    if let Some(deps) = doc
        .get_mut("project")
        .and_then(|p| p.get_mut("dependencies"))
        .and_then(Item::as_array_mut)
    {
        for i in 0..deps.len() {
            if deps.get(i).and_then(Value::as_str).is_some_and(is_direct_reference) {
                deps.replace(i, PINNED_REQUIREMENT);
                changed = true;
            }
        }
    }

    if let Some(tool) = doc.get_mut("tool").and_then(Item::as_table_like_mut) {
        if let Some(uv) = tool.get_mut("uv").and_then(Item::as_table_like_mut) {
            if let Some(sources) = uv.get_mut("sources").and_then(Item::as_table_like_mut) {
                changed |= sources.remove(PACKAGE).is_some();
                if sources.is_empty() {
                    uv.remove("sources");
                }
            }
            if uv.is_empty() {
                tool.remove("uv");
            }
        }
        if tool.is_empty() {
            doc.remove("tool");
        }
    }
    changed
}

/// `parent[key]` as a standard table. Inline tables are promoted, anything
/// else is replaced; new tables are implicit so no empty headers appear.
fn ensure_table<'a>(parent: &'a mut Table, key: &str) -> &'a mut Table {
    let slot = parent.entry(key).or_insert(Item::None);
    *slot = match std::mem::take(slot) {
        Item::Table(t) => Item::Table(t),
        Item::Value(Value::InlineTable(t)) => Item::Table(t.into_table()),
        _ => {
            let mut t = Table::new();
            t.set_implicit(true);
            Item::Table(t)
        }
    };
    match slot {
        Item::Table(t) => t,
        _ => unreachable!("slot was just replaced by a table"),
    }
}

fn dependencies_mut(project: &mut Table) -> &mut Array {
    let slot = project.entry("dependencies").or_insert(Item::None);
    if !slot.is_array() {
        *slot = value(Array::new());
    }
    match slot.as_array_mut() {
        Some(a) => a,
        None => unreachable!("slot was just replaced by an array"),
    }
}
