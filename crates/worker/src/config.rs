//! Worker configuration loaded from environment variables.

use std::time::Duration;

/// One external data-source endpoint, registered under `code`.
#[derive(Debug, Clone)]
pub struct DataSourceConfig {
    pub code: String,
    pub url: String,
    pub api_key: Option<String>,
}

/// Worker configuration.
///
/// All fields except `database_url` have defaults suitable for local
/// development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub database_url: String,
    /// Connection pool size (default: `10`).
    pub db_max_connections: u32,
    /// Tick interval of the ingestion scheduler (default: `10` seconds).
    pub ingestion_interval: Duration,
    /// Tick interval of the evaluation engine (default: `30` seconds).
    pub evaluation_interval: Duration,
    /// Per-request timeout for data-source fetches (default: `10` seconds).
    pub source_timeout: Duration,
    /// Endpoints parsed from comma-separated `code=url` pairs.
    pub data_sources: Vec<DataSourceConfig>,
}

impl WorkerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default          |
    /// |----------------------------|------------------|
    /// | `DATABASE_URL`             | (required)       |
    /// | `DB_MAX_CONNECTIONS`       | `10`             |
    /// | `INGESTION_INTERVAL_SECS`  | `10`             |
    /// | `EVALUATION_INTERVAL_SECS` | `30`             |
    /// | `SOURCE_TIMEOUT_SECS`      | `10`             |
    /// | `DATA_SOURCES`             | (empty)          |
    ///
    /// `DATA_SOURCES` is a comma-separated list of `code=url` pairs,
    /// e.g. `binance=https://api.example.com/quotes`. A per-source API
    /// key is read from `DATA_SOURCE_API_KEY_<CODE>` (code uppercased).
    pub fn from_env() -> Self {
        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let db_max_connections: u32 = std::env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".into())
            .parse()
            .expect("DB_MAX_CONNECTIONS must be a valid u32");

        let ingestion_interval_secs: u64 = std::env::var("INGESTION_INTERVAL_SECS")
            .unwrap_or_else(|_| "10".into())
            .parse()
            .expect("INGESTION_INTERVAL_SECS must be a valid u64");

        let evaluation_interval_secs: u64 = std::env::var("EVALUATION_INTERVAL_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("EVALUATION_INTERVAL_SECS must be a valid u64");

        let source_timeout_secs: u64 = std::env::var("SOURCE_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".into())
            .parse()
            .expect("SOURCE_TIMEOUT_SECS must be a valid u64");

        let data_sources = std::env::var("DATA_SOURCES")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(parse_data_source)
            .collect();

        Self {
            database_url,
            db_max_connections,
            ingestion_interval: Duration::from_secs(ingestion_interval_secs),
            evaluation_interval: Duration::from_secs(evaluation_interval_secs),
            source_timeout: Duration::from_secs(source_timeout_secs),
            data_sources,
        }
    }
}

fn parse_data_source(pair: &str) -> DataSourceConfig {
    let (code, url) = pair
        .split_once('=')
        .unwrap_or_else(|| panic!("DATA_SOURCES entry '{pair}' must be code=url"));

    let key_var = format!("DATA_SOURCE_API_KEY_{}", code.to_ascii_uppercase());
    DataSourceConfig {
        code: code.to_string(),
        url: url.to_string(),
        api_key: std::env::var(key_var).ok(),
    }
}
