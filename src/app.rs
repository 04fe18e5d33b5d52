//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and sets up logging
//! - builds the engine configuration and the indicator provider
//! - runs the composite or individual path
//! - prints reports/plots and writes optional exports

use clap::Parser;

use crate::cli::{Command, ListArgs, RunArgs};
use crate::domain::{EngineConfig, FetchMode, IndicatorSelection, RunConfig, Selection, YearRange};
use crate::error::AppError;

pub mod pipeline;

use pipeline::{Engine, RunOutput};

/// Entry point for the `fiscal` binary.
pub fn run() -> Result<(), AppError> {
    // `fiscal` and `fiscal -c ARG` behave like `fiscal tui ...`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    let default_level = match cli.command {
        Command::Tui(_) => "warn",
        _ => "info",
    };
    crate::logging::init_logging(cli.log_level.as_deref(), default_level)?;

    match cli.command {
        Command::Composite(args) => handle_run(run_config_from_args(&args, IndicatorSelection::Composite)),
        Command::Indicator(args) => handle_run(run_config_from_args(
            &args.run,
            IndicatorSelection::Single(args.code.clone()),
        )),
        Command::List(args) => handle_list(&args),
        Command::Tui(args) => handle_tui(run_config_from_args(&args, IndicatorSelection::Composite)),
    }
}

fn handle_run(config: RunConfig) -> Result<(), AppError> {
    let engine_config = crate::io::registry::load_engine_config(config.registry.as_deref())?;
    let selection = selection_from_config(&config, &engine_config)?;
    let provider = crate::data::build_provider(&config)?;
    let source = provider.name().to_string();
    let notes = provider.notes();
    let engine = Engine::new(engine_config, provider).with_fetch_mode(config.fetch_mode);

    let output = engine.run(&selection)?;
    let table = output.to_table();

    println!("{}", crate::report::format_run_summary(&output, &source, &notes));
    println!("{}", crate::report::format_table(&table));
    println!("{}", crate::report::format_latest(&table));

    if config.plot {
        let plot = crate::plot::render_series_plot(&table, config.plot_width, config.plot_height);
        println!("{plot}");
    }

    // Optional exports.
    if let Some(path) = &config.export_csv {
        crate::io::export::write_table_csv(path, &table)?;
    }
    if let Some(path) = &config.export_json {
        crate::io::snapshot::write_output_json(path, &output, &source)?;
    }
    if config.debug_bundle {
        match &output {
            RunOutput::Composite(run) => {
                let path = crate::debug::write_debug_bundle(run, &source)?;
                println!("Debug bundle: {}", path.display());
            }
            RunOutput::Individual(_) => {
                tracing::warn!("--debug-bundle applies to the composite path only; skipped.");
            }
        }
    }

    Ok(())
}

fn handle_tui(config: RunConfig) -> Result<(), AppError> {
    let engine_config = crate::io::registry::load_engine_config(config.registry.as_deref())?;
    let selection = selection_from_config(&config, &engine_config)?;
    let provider = crate::data::build_provider(&config)?;
    let source = provider.name().to_string();
    let engine = Engine::new(engine_config, provider).with_fetch_mode(config.fetch_mode);
    crate::tui::run(engine, &source, &selection)
}

fn handle_list(args: &ListArgs) -> Result<(), AppError> {
    let config = crate::io::registry::load_engine_config(args.registry.as_deref())?;
    print!("{}", format_registries(&config));
    Ok(())
}

fn format_registries(config: &EngineConfig) -> String {
    let mut out = String::new();
    out.push_str("Countries:\n");
    for c in config.countries.all() {
        out.push_str(&format!("  {:<6} {}\n", c.code, c.name));
    }
    out.push_str("\nIndicators:\n");
    for i in config.indicators.all() {
        out.push_str(&format!(
            "  {:<20} {:<8} {} [{}]\n",
            i.code,
            i.polarity.label(),
            i.name,
            i.unit
        ));
    }
    out.push_str(&format!(
        "\nYears: {}-{}\n",
        config.year_bounds.min, config.year_bounds.max
    ));
    out
}

pub fn run_config_from_args(args: &RunArgs, indicator: IndicatorSelection) -> RunConfig {
    RunConfig {
        countries: args.countries.clone(),
        start: args.start,
        end: args.end,
        indicator,
        source: args.source,
        input: args.input.clone(),
        seed: args.seed,
        missing_prob: args.missing_prob,
        registry: args.registry.clone(),
        fetch_mode: if args.parallel {
            FetchMode::Parallel
        } else {
            FetchMode::Sequential
        },
        plot: args.plot && !args.no_plot,
        plot_width: args.width,
        plot_height: args.height,
        export_csv: args.export.clone(),
        export_json: args.export_json.clone(),
        debug_bundle: args.debug_bundle,
    }
}

/// Resolve CLI country tokens (codes or names) and default the year range.
///
/// No countries means every registry country; missing years default to the bounds.
pub fn selection_from_config(config: &RunConfig, engine: &EngineConfig) -> Result<Selection, AppError> {
    let countries = if config.countries.is_empty() {
        engine.countries.codes()
    } else {
        config
            .countries
            .iter()
            .map(|token| engine.countries.resolve(token).map(|c| c.code.clone()))
            .collect::<Result<Vec<_>, _>>()?
    };

    let years = YearRange::new(
        config.start.unwrap_or(engine.year_bounds.min),
        config.end.unwrap_or(engine.year_bounds.max),
    )?;

    Selection::new(countries, years, config.indicator.clone())
}

/// Rewrite argv so `fiscal` defaults to `fiscal tui`.
///
/// Rules:
/// - `fiscal`                      -> `fiscal tui`
/// - `fiscal -c ARG ...`           -> `fiscal tui -c ARG ...`
/// - `fiscal --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "composite" | "indicator" | "list" | "tui");
    if is_subcommand {
        return argv;
    }

    // `--log-level` is global; look past it for a subcommand.
    if arg1 == "--log-level" {
        let rest_has_subcommand = argv
            .get(3)
            .is_some_and(|a| matches!(a.as_str(), "composite" | "indicator" | "list" | "tui"));
        if !rest_has_subcommand {
            let at = argv.len().min(3);
            argv.insert(at, "tui".to_string());
        }
        return argv;
    }

    // If the first token is a flag, treat it as "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    argv
}
