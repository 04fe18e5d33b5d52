//! Indicator data providers.
//!
//! - `provider`: the provider trait and raw observation types
//! - `worldbank`: live World Bank v2 API client
//! - `sample`: deterministic synthetic series
//!
//! The CSV-file provider lives in `io::ingest`.

pub mod provider;
pub mod sample;
pub mod worldbank;

pub use provider::*;
pub use sample::SyntheticProvider;
pub use worldbank::WorldBankClient;

use crate::domain::{DataSource, RunConfig};
use crate::error::AppError;

/// Build the provider selected by `--source`.
pub fn build_provider(config: &RunConfig) -> Result<Box<dyn IndicatorProvider>, AppError> {
    let provider: Box<dyn IndicatorProvider> = match config.source {
        DataSource::Worldbank => Box::new(WorldBankClient::from_env()?),
        DataSource::Synthetic => Box::new(SyntheticProvider::new(config.seed, config.missing_prob)?),
        DataSource::Csv => {
            let path = match &config.input {
                Some(path) => path.clone(),
                None => crate::cli::picker::prompt_for_csv_path()?,
            };
            Box::new(crate::io::ingest::CsvProvider::load(&path)?)
        }
    };
    tracing::info!(source = provider.name(), "Using indicator provider.");
    Ok(provider)
}
