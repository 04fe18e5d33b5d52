//! Structured logging setup.
//!
//! Logs go to stderr so table/plot output on stdout stays clean. `RUST_LOG`
//! wins over `--log-level`; `default` applies when neither is set.

use tracing_subscriber::EnvFilter;

use crate::error::AppError;

pub fn init_logging(level: Option<&str>, default: &str) -> Result<(), AppError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => {
            let directive = level.unwrap_or(default);
            EnvFilter::try_new(directive).map_err(|e| {
                AppError::new(2, format!("Invalid log level '{directive}': {e}"))
            })?
        }
    };

    // A second init (tests, embedded use) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unparseable_level() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        assert!(init_logging(Some("fiscal=loud"), "warn").is_err());
        assert!(init_logging(Some("debug"), "warn").is_ok());
    }
}
