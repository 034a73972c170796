//! Final report printed when no shell is entered.

use std::fmt::Write;

use super::pipeline::BootstrapReport;

/// Human-readable summary of a finished run.
pub fn render(report: &BootstrapReport) -> String {
    let mut out = String::new();
    let Some(venv) = &report.venv else {
        let _ = writeln!(out, "[done] Project created at: {}", report.target_dir.display());
        return out;
    };

    let activate = if cfg!(windows) {
        venv.activate_script("activate").display().to_string()
    } else {
        format!("source {}", venv.activate_script("activate").display())
    };
    let _ = writeln!(out, "\n[done] Project ready!");
    let _ = writeln!(out, "  Location:     {}", report.target_dir.display());
    let _ = writeln!(out, "  Venv:         {}", venv.root.display());
    let _ = writeln!(out, "  Activate:     {activate}");
    if let Some(path) = report.wiring.local_path() {
        let _ = writeln!(out, "  mlcore:       {} (editable)", path.display());
    }
    let _ = writeln!(out, "  Run tests:    pytest -q");
    let _ = writeln!(out, "  Try a flow:   python -m scripts.cli run train-eval");
    let _ = writeln!(out, "  Update later: copier update");
    out
}

pub fn print(report: &BootstrapReport) {
    print!("{}", render(report));
}
