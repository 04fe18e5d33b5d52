//! Formatted terminal output for engine runs.
//!
//! We keep formatting code in one place so:
//! - the engine stays free of presentation concerns
//! - output changes are localized (golden tests below)

use crate::app::pipeline::RunOutput;
use crate::domain::{GapPolicy, SeriesTable};
use crate::report::{IndicatorCoverage, panel_coverage, stage_coverage};

/// Header block: request, source, and per-indicator coverage.
///
/// `notes` are provider remarks printed under the source line.
pub fn format_run_summary(output: &RunOutput, source: &str, notes: &[String]) -> String {
    let mut out = String::new();
    let selection = output.selection();

    match output {
        RunOutput::Composite(run) => {
            out.push_str("=== fiscal - Fiscal Space Composite ===\n");
            push_source(&mut out, source, notes);
            out.push_str(&format!(
                "Years: {} ({} years)\n",
                selection.years(),
                selection.years().len()
            ));
            let countries: Vec<String> = run
                .countries
                .iter()
                .map(|c| format!("{} ({})", c.code, c.name))
                .collect();
            out.push_str(&format!("Countries: {}\n", countries.join(", ")));
            out.push_str(&format!(
                "Composite: mean of {} sign-aligned z-scores (missing = 0)\n",
                run.stages.len()
            ));

            out.push_str("\nIndicator coverage:\n");
            for cov in stage_coverage(&run.stages) {
                out.push_str(&format_coverage_line(&cov));
            }
        }
        RunOutput::Individual(run) => {
            let ind = &run.display.indicator;
            out.push_str("=== fiscal - Individual Indicator ===\n");
            push_source(&mut out, source, notes);
            out.push_str(&format!("Indicator: {} ({})\n", ind.code, ind.name));
            if !ind.unit.is_empty() {
                out.push_str(&format!("Unit: {}\n", ind.unit));
            }
            out.push_str(&format!(
                "Years: {} ({} years)\n",
                selection.years(),
                selection.years().len()
            ));
            out.push_str("\nCoverage:\n");
            out.push_str(&format_coverage_line(&panel_coverage(&run.raw, &ind.name, None)));
        }
    }
    out.push('\n');
    out
}

fn push_source(out: &mut String, source: &str, notes: &[String]) {
    out.push_str(&format!("Source: {source}\n"));
    for note in notes {
        out.push_str(&format!("  {note}\n"));
    }
}

fn format_coverage_line(cov: &IndicatorCoverage) -> String {
    let polarity = cov.polarity.map(|p| p.label()).unwrap_or("");
    let mut out = format!(
        "- {:<20} {:<8} {:>5}/{:<5} ({:>3.0}%)  {}",
        cov.code,
        polarity,
        cov.observed,
        cov.cells,
        cov.share() * 100.0,
        cov.name
    );
    out.push('\n');
    if !cov.empty.is_empty() {
        out.push_str(&format!("    no data: {}\n", cov.empty.join(", ")));
    }
    if !cov.degenerate.is_empty() {
        out.push_str(&format!("    no variation: {}\n", cov.degenerate.join(", ")));
    }
    out
}

/// Year × country table. Missing cells print as `-`.
pub fn format_table(table: &SeriesTable) -> String {
    let decimals = table_decimals(table.gap_policy);
    let cells: Vec<Vec<String>> = table
        .series
        .iter()
        .map(|s| {
            s.values
                .iter()
                .map(|v| fmt_value(*v, decimals, &table.suffix))
                .collect()
        })
        .collect();

    let widths: Vec<usize> = table
        .series
        .iter()
        .zip(&cells)
        .map(|(s, col)| {
            col.iter()
                .map(|c| c.chars().count())
                .chain(std::iter::once(s.code.chars().count()))
                .max()
                .unwrap_or(1)
        })
        .collect();

    let mut out = String::new();
    out.push_str(&table.title);
    if !table.y_label.is_empty() {
        out.push_str(&format!(" [{}]", table.y_label));
    }
    out.push('\n');

    let mut header = format!("{:<6}", "year");
    let mut rule = format!("{:-<6}", "");
    for (s, w) in table.series.iter().zip(&widths) {
        header.push_str(&format!(" {:>w$}", s.code, w = *w));
        rule.push_str(&format!(" {:-<w$}", "", w = *w));
    }
    out.push_str(header.trim_end());
    out.push('\n');
    out.push_str(rule.trim_end());
    out.push('\n');

    for (row, year) in table.years.iter().enumerate() {
        let mut line = format!("{year:<6}");
        for (col, w) in cells.iter().zip(&widths) {
            line.push_str(&format!(" {:>w$}", col[row], w = *w));
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

/// Final-year value per series; series whose final cell is missing are left out.
pub fn format_latest(table: &SeriesTable) -> String {
    let Some(&last_year) = table.years.last() else {
        return String::new();
    };

    let rows: Vec<String> = table
        .series
        .iter()
        .filter_map(|s| {
            let v = s.values.last().copied().flatten()?;
            Some(format!(
                "  {:<6} {}",
                s.code,
                fmt_value(Some(v), 2, &table.suffix)
            ))
        })
        .collect();

    if rows.is_empty() {
        return format!("Latest ({last_year}): no values\n");
    }
    let mut out = format!("Latest ({last_year}):\n");
    for row in rows {
        out.push_str(&row);
        out.push('\n');
    }
    out
}

fn table_decimals(policy: GapPolicy) -> usize {
    match policy {
        GapPolicy::ZeroFill => 3,
        GapPolicy::Preserve => 2,
    }
}

pub fn fmt_value(v: Option<f64>, decimals: usize, suffix: &str) -> String {
    match v {
        Some(x) => format!("{x:.decimals$}{suffix}"),
        None => "-".to_string(),
    }
}
