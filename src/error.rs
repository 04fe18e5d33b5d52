//! Application error type.
//!
//! Every failure carries the process exit code it maps to:
//!
//! - `2`: usage, configuration, or input-file problems
//! - `3`: the request produced no usable data
//! - `4`: runtime failures (provider, terminal, internal shape mismatch)

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
    indicator: Option<String>,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
            indicator: None,
        }
    }

    /// A provider fetch failed; the whole request is aborted.
    pub fn data_unavailable(indicator: &str, detail: impl std::fmt::Display) -> Self {
        Self {
            exit_code: 4,
            message: format!("Data unavailable for indicator {indicator}: {detail}"),
            indicator: Some(indicator.to_string()),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    /// Indicator code named by a "data unavailable" error.
    pub fn indicator(&self) -> Option<&str> {
        self.indicator.as_deref()
    }

    pub fn is_data_unavailable(&self) -> bool {
        self.indicator.is_some()
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .field("indicator", &self.indicator)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_unavailable_names_indicator() {
        let err = AppError::data_unavailable("GC.DOD.TOTL.GD.ZS", "connection reset");
        assert_eq!(err.exit_code(), 4);
        assert_eq!(err.indicator(), Some("GC.DOD.TOTL.GD.ZS"));
        assert!(err.to_string().contains("GC.DOD.TOTL.GD.ZS"));
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn plain_errors_have_no_indicator() {
        let err = AppError::new(2, "bad flag");
        assert!(!err.is_data_unavailable());
        assert_eq!(err.to_string(), "bad flag");
    }
}
