//! Generic JSON-over-HTTP gateway.
//!
//! Expects the provider to answer a batched query with one JSON object
//! keyed by identifier:
//!
//! ```json
//! {
//!   "BTC": {
//!     "timestamp": "2026-08-30T12:00:00Z",
//!     "metrics": { "price": 45000.10, "volume": "1234.5" }
//!   },
//!   "DOGE": { "error": "unknown symbol" }
//! }
//! ```
//!
//! Metric values may be JSON numbers or decimal strings. A missing
//! `timestamp` falls back to the fetch time.

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::Deserialize;

use async_trait::async_trait;
use sentra_core::types::Timestamp;
use sentra_engine::gateway::{DataSourceGateway, FetchResult, FetchedValue, GatewayError};

const API_KEY_HEADER: &str = "x-api-key";

/// Connection settings for one provider endpoint.
#[derive(Debug, Clone)]
pub struct HttpGatewayConfig {
    /// Batch-quote endpoint; identifiers are passed as the `ids` query
    /// parameter, comma-separated.
    pub url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

/// [`DataSourceGateway`] over a JSON HTTP endpoint.
pub struct HttpJsonGateway {
    client: reqwest::Client,
    config: HttpGatewayConfig,
}

#[derive(Deserialize)]
struct ProviderEntry {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    timestamp: Option<Timestamp>,
    #[serde(default)]
    metrics: HashMap<String, serde_json::Value>,
}

impl HttpJsonGateway {
    pub fn new(config: HttpGatewayConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl DataSourceGateway for HttpJsonGateway {
    async fn fetch_batch(
        &self,
        identifiers: &[String],
    ) -> Result<HashMap<String, FetchResult>, GatewayError> {
        let mut request = self
            .client
            .get(&self.config.url)
            .query(&[("ids", identifiers.join(","))])
            .timeout(self.config.timeout);
        if let Some(key) = &self.config.api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        let response = request.send().await.map_err(|err| {
            if err.is_timeout() {
                GatewayError::Timeout(self.config.timeout)
            } else {
                GatewayError::Transport(err.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Transport(format!(
                "{} returned {status}",
                self.config.url
            )));
        }

        let entries: HashMap<String, ProviderEntry> = response.json().await.map_err(|err| {
            if err.is_timeout() {
                GatewayError::Timeout(self.config.timeout)
            } else {
                GatewayError::Transport(format!("malformed response body: {err}"))
            }
        })?;

        Ok(parse_entries(entries, chrono::Utc::now()))
    }
}

/// Fold provider entries into per-identifier results.
///
/// Entries carrying an `error` field, and entries with values that do
/// not parse as decimals, come back as [`FetchResult::Failure`] so the
/// scheduler isolates them from the rest of the batch.
fn parse_entries(
    entries: HashMap<String, ProviderEntry>,
    now: Timestamp,
) -> HashMap<String, FetchResult> {
    entries
        .into_iter()
        .map(|(identifier, entry)| {
            let result = parse_entry(entry, now);
            (identifier, result)
        })
        .collect()
}

fn parse_entry(entry: ProviderEntry, now: Timestamp) -> FetchResult {
    if let Some(reason) = entry.error {
        return FetchResult::Failure(reason);
    }

    let timestamp = entry.timestamp.unwrap_or(now);
    let mut values = Vec::with_capacity(entry.metrics.len());
    for (metric_name, raw) in entry.metrics {
        let value = match decode_decimal(&raw) {
            Some(value) => value,
            None => {
                return FetchResult::Failure(format!(
                    "metric {metric_name} has non-numeric value {raw}"
                ));
            }
        };
        values.push(FetchedValue {
            metric_name,
            value,
            timestamp,
        });
    }
    FetchResult::Success(values)
}

/// Accept both JSON numbers and decimal strings without a round-trip
/// through binary floats.
fn decode_decimal(raw: &serde_json::Value) -> Option<Decimal> {
    match raw {
        serde_json::Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        serde_json::Value::String(s) => Decimal::from_str(s).ok(),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
