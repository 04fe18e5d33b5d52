//! Debug bundle writer for inspecting every stage of a composite run.
//!
//! The bundle is a markdown file under `debug/` listing, per indicator, the
//! column statistics behind each country's z-scores and the sign-aligned
//! series that went into the average.

use std::fmt::Write as _;
use std::fs::{File, create_dir_all};
use std::io::Write;
use std::path::PathBuf;

use chrono::Local;

use crate::app::pipeline::CompositeRun;
use crate::domain::IndicatorPanel;
use crate::error::AppError;
use crate::math::column_stats;
use crate::report::fmt_value;

pub fn write_debug_bundle(run: &CompositeRun, source: &str) -> Result<PathBuf, AppError> {
    let dir = PathBuf::from("debug");
    create_dir_all(&dir).map_err(|e| AppError::new(4, format!("Failed to create debug dir: {e}")))?;

    let ts = Local::now().format("%Y%m%d_%H%M%S");
    let path = dir.join(format!(
        "fiscal_debug_{}_{}.md",
        run.selection.years(),
        ts
    ));

    let body = render_bundle(run, source);
    let mut file = File::create(&path)
        .map_err(|e| AppError::new(4, format!("Failed to create debug file: {e}")))?;
    file.write_all(body.as_bytes())
        .map_err(|e| AppError::new(4, format!("Failed to write debug bundle: {e}")))?;

    tracing::info!(path = %path.display(), "Wrote debug bundle.");
    Ok(path)
}

/// Markdown body of the bundle (no I/O).
pub fn render_bundle(run: &CompositeRun, source: &str) -> String {
    let mut out = String::new();
    let years = run.selection.years();
    let codes: Vec<&str> = run.countries.iter().map(|c| c.code.as_str()).collect();

    // Writing to a String cannot fail.
    let _ = writeln!(out, "# fiscal debug bundle");
    let _ = writeln!(out, "- generated: {}", Local::now().to_rfc3339());
    let _ = writeln!(out, "- source: {source}");
    let _ = writeln!(out, "- years: {years}");
    let _ = writeln!(out, "- countries: {}", codes.join(", "));
    let _ = writeln!(out, "- indicators (K): {}", run.stages.len());

    for stage in &run.stages {
        let ind = &stage.indicator;
        let _ = writeln!(out, "\n## {} ({})", ind.code, ind.name);
        let _ = writeln!(out, "polarity: {}", ind.polarity.label());

        let _ = writeln!(out, "\n### Column stats (raw)");
        let _ = writeln!(out, "| country | n | mean | std | degenerate |");
        let _ = writeln!(out, "| - | - | - | - | - |");
        for (code, column) in stage.raw.countries().iter().zip(stage.raw.columns()) {
            match column_stats(column) {
                Some(s) => {
                    let _ = writeln!(
                        out,
                        "| {code} | {} | {:.6} | {:.6} | {} |",
                        s.count,
                        s.mean,
                        s.std_dev,
                        s.is_degenerate()
                    );
                }
                None => {
                    let _ = writeln!(out, "| {code} | 0 | - | - | no data |");
                }
            }
        }

        let _ = writeln!(out, "\n### Aligned z-scores (z x {:+.0})", ind.polarity.sign());
        write_panel_table(&mut out, &stage.aligned);
    }

    let _ = writeln!(out, "\n## Composite");
    let mut header = String::from("| year |");
    let mut rule = String::from("| - |");
    for code in &codes {
        let _ = write!(header, " {code} |");
        rule.push_str(" - |");
    }
    let _ = writeln!(out, "{header}");
    let _ = writeln!(out, "{rule}");
    for (row, year) in years.years().enumerate() {
        let mut line = format!("| {year} |");
        for col in 0..codes.len() {
            let _ = write!(line, " {:.4} |", run.composite.values()[(row, col)]);
        }
        let _ = writeln!(out, "{line}");
    }

    out
}

fn write_panel_table(out: &mut String, panel: &IndicatorPanel) {
    let mut header = String::from("| year |");
    let mut rule = String::from("| - |");
    for code in panel.countries() {
        let _ = write!(header, " {code} |");
        rule.push_str(" - |");
    }
    let _ = writeln!(out, "{header}");
    let _ = writeln!(out, "{rule}");

    for (row, year) in panel.years().years().enumerate() {
        let mut line = format!("| {year} |");
        for column in panel.columns() {
            let _ = write!(line, " {} |", fmt_value(column[row], 4, ""));
        }
        let _ = writeln!(out, "{line}");
    }
}
