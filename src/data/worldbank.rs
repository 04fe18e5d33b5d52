//! World Bank v2 API integration for WDI indicator series.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::data::{IndicatorProvider, RawObservation, RawResponse};
use crate::domain::YearRange;
use crate::error::AppError;

const DEFAULT_BASE_URL: &str = "https://api.worldbank.org/v2";
const PER_PAGE: usize = 1000;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Guard against a misbehaving `pages` field.
const MAX_PAGES: u64 = 100;

pub struct WorldBankClient {
    client: Client,
    base_url: String,
}

impl WorldBankClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::new(4, format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Uses `WORLDBANK_API_BASE` from the environment (`.env` honored) when set.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        let base_url =
            std::env::var("WORLDBANK_API_BASE").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::new(base_url)
    }

    fn fetch_page(
        &self,
        indicator: &str,
        countries: &[String],
        years: &YearRange,
        page: u64,
    ) -> Result<(PageMeta, Vec<RawObservation>), AppError> {
        let url = format!(
            "{}/country/{}/indicator/{}",
            self.base_url,
            countries.join(";"),
            indicator
        );

        let resp = self
            .client
            .get(&url)
            .query(&[
                ("format", "json".to_string()),
                ("date", format!("{}:{}", years.start(), years.end())),
                ("per_page", PER_PAGE.to_string()),
                ("page", page.to_string()),
            ])
            .send()
            .map_err(|e| AppError::new(4, format!("World Bank request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AppError::new(
                4,
                format!("World Bank request failed with status {}.", resp.status()),
            ));
        }

        let body: Value = resp
            .json()
            .map_err(|e| AppError::new(4, format!("Failed to parse World Bank response: {e}")))?;

        parse_page(body)
    }
}

impl IndicatorProvider for WorldBankClient {
    fn name(&self) -> &str {
        "worldbank"
    }

    fn fetch(
        &self,
        indicator: &str,
        countries: &[String],
        years: &YearRange,
    ) -> Result<RawResponse, AppError> {
        let mut out = Vec::new();
        let mut page = 1u64;
        loop {
            let (meta, observations) = self.fetch_page(indicator, countries, years, page)?;
            out.extend(observations);
            tracing::debug!(indicator, page, pages = meta.pages, "Fetched World Bank page.");
            if page >= meta.pages.min(MAX_PAGES) {
                break;
            }
            page += 1;
        }
        Ok(RawResponse::new(out))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PageMeta {
    pages: u64,
}

#[derive(Debug, Deserialize)]
struct Observation {
    #[serde(default)]
    countryiso3code: String,
    country: Reference,
    date: String,
    value: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Reference {
    id: String,
}

/// Split a `[meta, rows]` payload. API errors arrive as `[{"message": [...]}]`.
fn parse_page(body: Value) -> Result<(PageMeta, Vec<RawObservation>), AppError> {
    let Value::Array(mut parts) = body else {
        return Err(AppError::new(4, "Unexpected World Bank payload (not an array)."));
    };
    if parts.is_empty() {
        return Err(AppError::new(4, "Empty World Bank payload."));
    }

    let rows = if parts.len() > 1 { parts.remove(1) } else { Value::Null };
    let meta = parts.remove(0);

    if let Some(messages) = meta.get("message") {
        return Err(AppError::new(
            4,
            format!("World Bank API error: {}", api_message(messages)),
        ));
    }

    let pages = meta.get("pages").and_then(json_u64).unwrap_or(1);

    let observations = match rows {
        Value::Null => Vec::new(),
        rows => {
            let parsed: Vec<Observation> = serde_json::from_value(rows)
                .map_err(|e| AppError::new(4, format!("Invalid World Bank observation: {e}")))?;
            parsed
                .into_iter()
                .map(|obs| {
                    let country = if obs.countryiso3code.trim().is_empty() {
                        obs.country.id
                    } else {
                        obs.countryiso3code
                    };
                    RawObservation {
                        country,
                        year_label: obs.date,
                        value: obs.value,
                    }
                })
                .collect()
        }
    };

    Ok((PageMeta { pages }, observations))
}

/// The API mixes numeric and string-encoded counters (`"per_page": "50"`).
fn json_u64(v: &Value) -> Option<u64> {
    v.as_u64().or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
}

fn api_message(messages: &Value) -> String {
    messages
        .as_array()
        .map(|items| {
            items
                .iter()
                .map(|m| {
                    let key = m.get("key").and_then(Value::as_str).unwrap_or("error");
                    let value = m.get("value").and_then(Value::as_str).unwrap_or("");
                    format!("{key}: {value}").trim_end_matches(": ").to_string()
                })
                .collect::<Vec<_>>()
                .join("; ")
        })
        .unwrap_or_else(|| messages.to_string())
}
