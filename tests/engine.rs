use fiscal_space::app::pipeline::{Engine, RunOutput};
use fiscal_space::data::{IndicatorProvider, RawObservation, RawResponse, SyntheticProvider};
use fiscal_space::domain::{
    EngineConfig, FetchMode, IndicatorSelection, Selection, YearRange,
};
use fiscal_space::error::AppError;
use fiscal_space::io::ingest::CsvProvider;
use fiscal_space::io::registry::parse_engine_config;

fn selection(countries: &[&str], start: i32, end: i32, indicator: IndicatorSelection) -> Selection {
    Selection::new(
        countries.iter().map(|c| c.to_string()).collect(),
        YearRange::new(start, end).unwrap(),
        indicator,
    )
    .unwrap()
}

#[test]
fn synthetic_composite_is_centered_per_country() {
    let provider = SyntheticProvider::new(11, 0.0).unwrap();
    let engine = Engine::new(EngineConfig::reference(), provider).with_fetch_mode(FetchMode::Parallel);

    let run = engine
        .composite(&selection(&["ARG", "BRA", "URY"], 2000, 2020, IndicatorSelection::Composite))
        .unwrap();

    assert_eq!(run.stages.len(), 5);
    assert_eq!(run.composite.values().shape(), (21, 3));
    for country in ["ARG", "BRA", "URY"] {
        let series = run.composite.series(country).unwrap();
        assert!(series.iter().all(|v| v.is_finite()));
        let mean = series.iter().sum::<f64>() / series.len() as f64;
        assert!(mean.abs() < 1e-9, "{country} mean {mean}");
    }
}

#[test]
fn csv_individual_path_keeps_gaps() {
    let path = std::env::temp_dir().join(format!("fiscal_engine_it_{}.csv", std::process::id()));
    std::fs::write(
        &path,
        "indicator,country,year,value\n\
         T,X,YR2000,10\n\
         T,X,YR2002,12\n\
         T,Y,2001,\n",
    )
    .unwrap();

    let config = parse_engine_config(
        r#"{"countries": [{"code": "X", "name": "Xland"}, {"code": "Y", "name": "Yland"}],
            "indicators": [{"code": "T", "name": "Tax", "unit": "% of GDP", "suffix": "%",
                            "polarity": "positive"}],
            "year_bounds": {"min": 2000, "max": 2002}}"#,
    )
    .unwrap();
    let engine = Engine::new(config, CsvProvider::load(&path).unwrap());

    let out = engine
        .run(&selection(&["X", "Y"], 2000, 2002, IndicatorSelection::Single("T".into())))
        .unwrap();
    let table = out.to_table();
    assert_eq!(table.series[0].values, vec![Some(10.0), None, Some(12.0)]);
    assert_eq!(table.series[1].values, vec![None, None, None]);
    assert_eq!(table.suffix, "%");

    let _ = std::fs::remove_file(&path);
}

struct Unreachable;

impl IndicatorProvider for Unreachable {
    fn name(&self) -> &str {
        "unreachable"
    }

    fn fetch(&self, indicator: &str, _: &[String], _: &YearRange) -> Result<RawResponse, AppError> {
        if indicator == "GC.TAX.TOTL.GD.ZS" {
            return Err(AppError::new(4, "connection refused"));
        }
        Ok(RawResponse::new(vec![RawObservation::new("ARG", "YR2000", Some(1.0))]))
    }
}

#[test]
fn one_failed_indicator_fails_the_whole_composite() {
    let engine = Engine::new(EngineConfig::reference(), Unreachable);
    let err = engine
        .run(&selection(&["ARG"], 2000, 2001, IndicatorSelection::Composite))
        .unwrap_err();
    assert_eq!(err.indicator(), Some("GC.TAX.TOTL.GD.ZS"));
    assert_eq!(err.exit_code(), 4);

    let ok = engine
        .run(&selection(&["ARG"], 2000, 2001, IndicatorSelection::Single("NY.GDP.MKTP.CD".into())))
        .unwrap();
    assert!(matches!(ok, RunOutput::Individual(_)));
}
