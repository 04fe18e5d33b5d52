//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! One glyph per country marks each present value; consecutive present
//! values are joined with `.`. A missing cell breaks the line, so gaps in the
//! individual view stay visible.

use crate::domain::SeriesTable;

/// Marker glyphs, cycled per series.
const GLYPHS: [char; 8] = ['*', 'o', '+', 'x', '#', '@', '%', '&'];

pub fn glyph_for(index: usize) -> char {
    GLYPHS[index % GLYPHS.len()]
}

/// Render every series of `table` on one grid, with a header and a legend.
pub fn render_series_plot(table: &SeriesTable, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let (x_min, x_max) = match (table.years.first(), table.years.last()) {
        (Some(&a), Some(&b)) if b > a => (a as f64, b as f64),
        (Some(&a), _) => (a as f64, a as f64 + 1.0),
        _ => (0.0, 1.0),
    };
    let (y_min, y_max) = match table.value_range() {
        Some((lo, hi)) if hi > lo => (lo, hi),
        Some((lo, _)) => (lo - 1.0, lo + 1.0),
        None => (0.0, 1.0),
    };
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];
    let cell = |year: i32, v: f64| {
        (
            map_x(year as f64, x_min, x_max, width),
            map_y(v, y_min, y_max, height),
        )
    };

    // Lines first so markers overlay them.
    for series in &table.series {
        let mut prev = None;
        for (&year, v) in table.years.iter().zip(&series.values) {
            match v {
                Some(v) => {
                    let (x, y) = cell(year, *v);
                    if let Some((x0, y0)) = prev {
                        draw_line(&mut grid, x0, y0, x, y, '.');
                    }
                    prev = Some((x, y));
                }
                None => prev = None,
            }
        }
    }
    for (idx, series) in table.series.iter().enumerate() {
        for (&year, v) in table.years.iter().zip(&series.values) {
            if let Some(v) = v {
                let (x, y) = cell(year, *v);
                grid[y][x] = glyph_for(idx);
            }
        }
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: {} | years=[{}, {}] | y=[{y_min:.2}, {y_max:.2}]{}\n",
        table.title,
        table.years.first().copied().unwrap_or_default(),
        table.years.last().copied().unwrap_or_default(),
        table.suffix
    ));
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
    for (idx, series) in table.series.iter().enumerate() {
        out.push_str(&format!("  {} {} {}\n", glyph_for(idx), series.code, series.name));
    }
    out
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(t: f64, t_min: f64, t_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((t - t_min) / (t_max - t_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

/// Integer line drawing (Bresenham-ish). Never overwrites a non-blank cell.
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}
