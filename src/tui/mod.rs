//! Ratatui-based terminal UI.
//!
//! A settings panel chooses the view (composite or one raw indicator), the
//! year range, and which countries to include; the chart shows one colored
//! line per country. Nothing is recomputed until the user asks (Enter / `r`).

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph},
};

use crate::app::pipeline::{Engine, RunOutput};
use crate::data::IndicatorProvider;
use crate::domain::{Country, Indicator, IndicatorSelection, SeriesTable, Selection, YearRange};
use crate::error::AppError;

mod plotters_chart;

use plotters_chart::{ChartLine, FiscalPlottersChart, palette_color};

/// Fields above the country rows: view, start, end.
const FIXED_FIELDS: usize = 3;

/// Start the TUI with `initial` preselected.
pub fn run<P: IndicatorProvider>(engine: Engine<P>, source: &str, initial: &Selection) -> Result<(), AppError> {
    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(engine, source, initial);
    app.recompute();
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

#[derive(Debug, Clone, PartialEq)]
enum View {
    Composite,
    Indicator(Indicator),
}

impl View {
    fn label(&self) -> String {
        match self {
            View::Composite => "Fiscal space (composite)".to_string(),
            View::Indicator(ind) => ind.name.clone(),
        }
    }

    fn selection(&self) -> IndicatorSelection {
        match self {
            View::Composite => IndicatorSelection::Composite,
            View::Indicator(ind) => IndicatorSelection::Single(ind.code.clone()),
        }
    }
}

struct App<P: IndicatorProvider> {
    engine: Engine<P>,
    source: String,
    views: Vec<View>,
    view: usize,
    start: i32,
    end: i32,
    countries: Vec<(Country, bool)>,
    selected_field: usize,
    status: String,
    run: Option<RunOutput>,
}

impl<P: IndicatorProvider> App<P> {
    fn new(engine: Engine<P>, source: &str, initial: &Selection) -> Self {
        let config = engine.config();
        let mut views = vec![View::Composite];
        views.extend(config.indicators.all().iter().cloned().map(View::Indicator));

        let view = match initial.indicator() {
            IndicatorSelection::Composite => 0,
            IndicatorSelection::Single(code) => views
                .iter()
                .position(|v| matches!(v, View::Indicator(ind) if ind.code.eq_ignore_ascii_case(code)))
                .unwrap_or(0),
        };

        let countries = config
            .countries
            .all()
            .iter()
            .map(|c| {
                let on = initial
                    .countries()
                    .iter()
                    .any(|s| s.eq_ignore_ascii_case(&c.code));
                (c.clone(), on)
            })
            .collect();

        Self {
            source: source.to_string(),
            views,
            view,
            start: initial.years().start(),
            end: initial.years().end(),
            countries,
            selected_field: 0,
            status: "Press Enter or r to compute.".to_string(),
            run: None,
            engine,
        }
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn field_count(&self) -> usize {
        FIXED_FIELDS + self.countries.len()
    }

    /// Returns `true` when the user asked to quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Up => {
                self.selected_field = self.selected_field.saturating_sub(1);
            }
            KeyCode::Down => {
                if self.selected_field + 1 < self.field_count() {
                    self.selected_field += 1;
                }
            }
            KeyCode::Left => self.adjust_field(-1),
            KeyCode::Right => self.adjust_field(1),
            KeyCode::Char(' ') => self.toggle_country(),
            KeyCode::Enter | KeyCode::Char('r') => self.recompute(),
            KeyCode::Char('d') => self.write_debug_bundle(),
            _ => {}
        }
        false
    }

    fn adjust_field(&mut self, delta: i32) {
        let bounds = self.engine.config().year_bounds;
        match self.selected_field {
            0 => {
                let n = self.views.len() as i32;
                self.view = (self.view as i32 + delta).rem_euclid(n) as usize;
                self.status = format!("view: {}", self.views[self.view].label());
            }
            1 => {
                self.start = (self.start + delta).clamp(bounds.min, self.end);
                self.status = format!("start: {}", self.start);
            }
            2 => {
                self.end = (self.end + delta).clamp(self.start, bounds.max);
                self.status = format!("end: {}", self.end);
            }
            _ => self.toggle_country(),
        }
    }

    fn toggle_country(&mut self) {
        let Some(idx) = self.selected_field.checked_sub(FIXED_FIELDS) else {
            return;
        };
        if let Some((country, on)) = self.countries.get_mut(idx) {
            *on = !*on;
            self.status = format!("{}: {}", country.code, if *on { "on" } else { "off" });
        }
    }

    fn checked_codes(&self) -> Vec<String> {
        self.countries
            .iter()
            .filter(|(_, on)| *on)
            .map(|(c, _)| c.code.clone())
            .collect()
    }

    fn recompute(&mut self) {
        let codes = self.checked_codes();
        if codes.is_empty() {
            self.status = "Select at least one country.".to_string();
            return;
        }

        let view = self.views[self.view].clone();
        let result = YearRange::new(self.start, self.end)
            .and_then(|years| Selection::new(codes, years, view.selection()))
            .and_then(|selection| self.engine.run(&selection));

        match result {
            Ok(run) => {
                self.status = format!(
                    "{} | {} | {} countries",
                    view.label(),
                    run.selection().years(),
                    run.selection().countries().len()
                );
                self.run = Some(run);
            }
            Err(err) => {
                tracing::warn!(error = %err, "TUI recompute failed.");
                self.status = format!("Error: {err}");
                self.run = None;
            }
        }
    }

    fn write_debug_bundle(&mut self) {
        self.status = match &self.run {
            Some(RunOutput::Composite(run)) => match crate::debug::write_debug_bundle(run, &self.source) {
                Ok(path) => format!("Wrote debug bundle: {}", path.display()),
                Err(err) => format!("Debug write failed: {err}"),
            },
            Some(RunOutput::Individual(_)) => "Debug bundles cover the composite view only.".to_string(),
            None => "Nothing computed yet.".to_string(),
        };
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut lines: Vec<Line> = Vec::new();
        lines.push(Line::from(vec![
            Span::styled("fiscal", Style::default().fg(Color::Cyan)),
            Span::raw(" - fiscal space and individual indicators"),
        ]));
        lines.push(Line::from(Span::styled(
            format!(
                "source: {} | view: {} | years: {}-{}",
                self.source,
                self.views[self.view].label(),
                self.start,
                self.end
            ),
            Style::default().fg(Color::Gray),
        )));

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(40)])
            .split(area);

        self.draw_chart(frame, chunks[0]);
        self.draw_settings(frame, chunks[1]);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let Some(run) = &self.run else {
            let block = Block::default().title("Chart").borders(Borders::ALL);
            let inner = block.inner(area);
            frame.render_widget(block, area);
            let msg = Paragraph::new("No result. Adjust settings and press Enter.")
                .style(Style::default().fg(Color::Yellow));
            frame.render_widget(msg, inner);
            return;
        };

        let table = run.to_table();
        let block = Block::default().title(table.title.clone()).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let (lines, x_bounds, y_bounds) = chart_lines(&table, &self.countries);
        let (chart_rect, insets) = chart_layout(inner);
        let widget = FiscalPlottersChart {
            lines: &lines,
            x_bounds,
            y_bounds,
            x_label: "year",
            y_label: table.y_label.clone(),
            fmt_x: fmt_axis_year,
            fmt_y: fmt_axis_value,
        };

        frame.render_widget(widget, chart_rect);
        if let Some(insets) = insets {
            draw_axis_ticks(frame, inner, chart_rect, insets, x_bounds, y_bounds, &table.y_label);
        }
    }

    fn draw_settings(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let table = self.run.as_ref().map(|r| r.to_table());

        let mut items = Vec::new();
        items.push(ListItem::new(format!("View: {}", self.views[self.view].label())));
        items.push(ListItem::new(format!("Start: {}", self.start)));
        items.push(ListItem::new(format!("End: {}", self.end)));
        for (idx, (country, on)) in self.countries.iter().enumerate() {
            let latest = table
                .as_ref()
                .and_then(|t| latest_label(t, &country.code))
                .unwrap_or_default();
            let (r, g, b) = palette_color(idx);
            items.push(ListItem::new(Line::from(vec![
                Span::raw(if *on { "[x] " } else { "[ ] " }),
                Span::styled(country.name.clone(), Style::default().fg(Color::Rgb(r, g, b))),
                Span::raw(format!(" {latest}")),
            ])));
        }

        let list = List::new(items)
            .block(Block::default().title("Settings").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ratatui::widgets::ListState::default();
        state.select(Some(self.selected_field));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "↑/↓ select  ←/→ adjust  space toggle  Enter/r compute  d debug  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

/// Final-year value for one country, omitted when that cell is missing.
fn latest_label(table: &SeriesTable, code: &str) -> Option<String> {
    let series = table.series.iter().find(|s| s.code == code)?;
    let v = series.values.last().copied().flatten()?;
    Some(format!("{v:.2}{}", table.suffix))
}

/// Color keyed to the country's row in the settings list, which doubles as the legend.
fn country_color(countries: &[(Country, bool)], code: &str) -> Option<(u8, u8, u8)> {
    countries
        .iter()
        .position(|(c, _)| c.code.eq_ignore_ascii_case(code))
        .map(palette_color)
}

/// Chart lines (colored by settings row) plus padded bounds.
fn chart_lines(table: &SeriesTable, countries: &[(Country, bool)]) -> (Vec<ChartLine>, [f64; 2], [f64; 2]) {
    let lines = table
        .series
        .iter()
        .enumerate()
        .map(|(idx, s)| {
            let mut segments: Vec<Vec<(f64, f64)>> = Vec::new();
            let mut current = Vec::new();
            for (&year, v) in table.years.iter().zip(&s.values) {
                match v {
                    Some(v) => current.push((year as f64, *v)),
                    None if !current.is_empty() => segments.push(std::mem::take(&mut current)),
                    None => {}
                }
            }
            if !current.is_empty() {
                segments.push(current);
            }
            ChartLine {
                color: country_color(countries, &s.code).unwrap_or(palette_color(idx)),
                segments,
            }
        })
        .collect();

    let x_bounds = match (table.years.first(), table.years.last()) {
        (Some(&a), Some(&b)) if b > a => [a as f64, b as f64],
        (Some(&a), _) => [a as f64 - 0.5, a as f64 + 0.5],
        _ => [0.0, 1.0],
    };

    let (mut y_min, mut y_max) = table.value_range().unwrap_or((0.0, 1.0));
    if y_max <= y_min {
        y_min -= 1.0;
        y_max += 1.0;
    }
    let pad = ((y_max - y_min).abs() * 0.05).max(1e-12);
    let y_bounds = [y_min - pad, y_max + pad];

    (lines, x_bounds, y_bounds)
}

fn fmt_axis_year(v: f64) -> String {
    format!("{v:.0}")
}

fn fmt_axis_value(v: f64) -> String {
    if v.abs() >= 1e9 {
        format!("{:.1}B", v / 1e9)
    } else {
        format!("{v:.1}")
    }
}

#[derive(Debug, Clone, Copy)]
struct AxisInsets {
    left: u16,
    right: u16,
    top: u16,
    bottom: u16,
}

fn chart_layout(inner: Rect) -> (Rect, Option<AxisInsets>) {
    let insets = AxisInsets {
        left: 9,
        right: 2,
        top: 1,
        bottom: 2,
    };

    if inner.width <= insets.left + insets.right + 10
        || inner.height <= insets.top + insets.bottom + 5
    {
        return (inner, None);
    }

    let rect = Rect {
        x: inner.x + insets.left,
        y: inner.y + insets.top,
        width: inner.width - insets.left - insets.right,
        height: inner.height - insets.top - insets.bottom,
    };

    (rect, Some(insets))
}

fn draw_axis_ticks(
    frame: &mut ratatui::Frame<'_>,
    inner: Rect,
    chart: Rect,
    insets: AxisInsets,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
    y_label: &str,
) {
    let ticks = 5usize;
    let style = Style::default().fg(Color::Gray);

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let x_val = x_bounds[0] + u * (x_bounds[1] - x_bounds[0]);
        let x = chart.x + ((chart.width - 1) as f64 * u).round() as u16;
        let label = fmt_axis_year(x_val);
        let label_len = label.len() as u16;
        let start = x.saturating_sub((label.len() / 2) as u16);
        let y = chart.y + chart.height;
        if y >= inner.y + inner.height - 1 {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let y_val = y_bounds[0] + u * (y_bounds[1] - y_bounds[0]);
        let y = chart.y + (chart.height - 1) - ((chart.height - 1) as f64 * u).round() as u16;
        let label = fmt_axis_value(y_val);
        let label_len = label.len() as u16;
        let x = inner.x + insets.left.saturating_sub(1);
        let start = x.saturating_sub(label.len() as u16);
        if start < inner.x {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    let x_label = Paragraph::new("year")
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Gray));
    let x_rect = Rect {
        x: chart.x,
        y: chart.y + chart.height + 1,
        width: chart.width,
        height: 1,
    };
    if x_rect.y < inner.y + inner.height {
        frame.render_widget(x_label, x_rect);
    }

    let y_label = Paragraph::new(y_label.to_string())
        .style(Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD));
    let y_rect = Rect {
        x: inner.x,
        y: inner.y,
        width: chart.width.saturating_add(insets.left),
        height: 1,
    };
    frame.render_widget(y_label, y_rect);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{RawObservation, RawResponse};
    use crate::domain::{
        CountryRegistry, EngineConfig, GapPolicy, IndicatorRegistry, LabeledSeries, Polarity,
        YearBounds,
    };

    struct StaticProvider;

    impl IndicatorProvider for StaticProvider {
        fn name(&self) -> &str {
            "static"
        }

        fn fetch(
            &self,
            _indicator: &str,
            countries: &[String],
            years: &YearRange,
        ) -> Result<RawResponse, AppError> {
            Ok(countries
                .iter()
                .flat_map(|c| {
                    years
                        .years()
                        .map(|y| RawObservation::new(c, &y.to_string(), Some(y as f64)))
                        .collect::<Vec<_>>()
                })
                .collect())
        }
    }

    fn app() -> App<StaticProvider> {
        let config = EngineConfig::new(
            CountryRegistry::new(vec![Country::new("X", "Xland"), Country::new("Y", "Yland")]).unwrap(),
            IndicatorRegistry::new(vec![Indicator::new("A", "Alpha", "", "", Polarity::Positive)]).unwrap(),
            YearBounds { min: 2000, max: 2005 },
        )
        .unwrap();
        let initial = Selection::new(
            vec!["X".into()],
            YearRange::new(2001, 2003).unwrap(),
            IndicatorSelection::Composite,
        )
        .unwrap();
        App::new(Engine::new(config, StaticProvider), "static", &initial)
    }

    #[test]
    fn starts_from_initial_selection() {
        let app = app();
        assert_eq!(app.views.len(), 2);
        assert_eq!((app.start, app.end), (2001, 2003));
        assert_eq!(app.checked_codes(), vec!["X".to_string()]);
        assert!(app.run.is_none());
    }

    #[test]
    fn year_fields_stay_ordered_and_in_bounds() {
        let mut app = app();
        app.selected_field = 1;
        for _ in 0..5 {
            app.handle_key(KeyCode::Left);
        }
        assert_eq!(app.start, 2000);
        for _ in 0..10 {
            app.handle_key(KeyCode::Right);
        }
        assert_eq!(app.start, 2003);

        app.selected_field = 2;
        app.handle_key(KeyCode::Left);
        assert_eq!(app.end, 2003);
        for _ in 0..10 {
            app.handle_key(KeyCode::Right);
        }
        assert_eq!(app.end, 2005);
    }

    #[test]
    fn empty_country_set_does_not_call_the_engine() {
        let mut app = app();
        app.selected_field = FIXED_FIELDS;
        app.handle_key(KeyCode::Char(' '));
        assert!(app.checked_codes().is_empty());

        app.handle_key(KeyCode::Enter);
        assert!(app.run.is_none());
        assert_eq!(app.status, "Select at least one country.");
    }

    #[test]
    fn recompute_switches_views() {
        let mut app = app();
        app.handle_key(KeyCode::Char('r'));
        assert!(matches!(app.run, Some(RunOutput::Composite(_))));

        app.selected_field = 0;
        app.handle_key(KeyCode::Right);
        app.handle_key(KeyCode::Enter);
        let Some(RunOutput::Individual(run)) = &app.run else {
            panic!("expected individual run");
        };
        assert_eq!(run.display.series[0].latest(), Some((2003, 2003.0)));
        assert!(app.handle_key(KeyCode::Char('q')));
    }

    #[test]
    fn chart_lines_break_at_gaps() {
        let table = SeriesTable {
            title: "T".into(),
            y_label: String::new(),
            suffix: String::new(),
            years: vec![2000, 2001, 2002, 2003],
            gap_policy: GapPolicy::Preserve,
            series: vec![LabeledSeries {
                code: "X".into(),
                name: "Xland".into(),
                values: vec![Some(1.0), None, Some(2.0), Some(3.0)],
            }],
        };
        let (lines, x_bounds, y_bounds) = chart_lines(&table, &[]);
        assert_eq!(
            lines[0].segments,
            vec![vec![(2000.0, 1.0)], vec![(2002.0, 2.0), (2003.0, 3.0)]]
        );
        assert_eq!(x_bounds, [2000.0, 2003.0]);
        assert!(y_bounds[0] < 1.0 && y_bounds[1] > 3.0);
        assert_eq!(latest_label(&table, "X"), Some("3.00".to_string()));
    }

    #[test]
    fn line_colors_follow_settings_rows_when_earlier_countries_are_unchecked() {
        let mut app = app();
        app.countries[0].1 = false;
        app.countries[1].1 = true;
        app.recompute();

        let table = app.run.as_ref().unwrap().to_table();
        let (lines, _, _) = chart_lines(&table, &app.countries);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].color, palette_color(1));
        assert_ne!(lines[0].color, palette_color(0));
    }
}
