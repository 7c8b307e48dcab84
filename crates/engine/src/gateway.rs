//! The batched-fetch contract over external data providers, and the
//! registry the ingestion scheduler resolves providers from.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;

use sentra_core::types::Timestamp;

/// One fetched measurement for an identifier.
#[derive(Debug, Clone)]
pub struct FetchedValue {
    /// Provider-side metric name; matched case-insensitively against
    /// the asset's metric definitions.
    pub metric_name: String,
    pub value: Decimal,
    /// Source-reported timestamp.
    pub timestamp: Timestamp,
}

/// Outcome of a batch fetch for a single identifier.
///
/// Individual-identifier failures must come back as [`FetchResult::Failure`],
/// not as an `Err` from the call; only transport-level problems are a
/// [`GatewayError`], and the scheduler treats those as a failure for
/// every identifier in the batch.
#[derive(Debug, Clone)]
pub enum FetchResult {
    Success(Vec<FetchedValue>),
    Failure(String),
}

/// Transport-level gateway failure (connection, protocol, timeout).
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("fetch timed out after {0:?}")]
    Timeout(Duration),
}

/// Uniform batched-fetch abstraction over one external provider.
#[async_trait]
pub trait DataSourceGateway: Send + Sync {
    /// Fetch all identifiers in one upstream call.
    ///
    /// An identifier absent from the returned map is treated by the
    /// scheduler as a failure for that identifier.
    async fn fetch_batch(
        &self,
        identifiers: &[String],
    ) -> Result<HashMap<String, FetchResult>, GatewayError>;
}

/// Registry of gateways keyed by data-source code (case-insensitive).
#[derive(Default)]
pub struct DataSourceRegistry {
    gateways: HashMap<String, Arc<dyn DataSourceGateway>>,
}

impl DataSourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a gateway under a source code. Re-registering a code
    /// replaces the previous gateway.
    pub fn register(&mut self, code: impl Into<String>, gateway: Arc<dyn DataSourceGateway>) {
        self.gateways.insert(code.into().to_ascii_lowercase(), gateway);
    }

    /// Resolve a gateway by code, or `None` if the code is unregistered.
    pub fn resolve(&self, code: &str) -> Option<Arc<dyn DataSourceGateway>> {
        self.gateways.get(&code.to_ascii_lowercase()).cloned()
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.gateways.keys().map(String::as_str)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    struct NullGateway;

    #[async_trait]
    impl DataSourceGateway for NullGateway {
        async fn fetch_batch(
            &self,
            _identifiers: &[String],
        ) -> Result<HashMap<String, FetchResult>, GatewayError> {
            Ok(HashMap::new())
        }
    }

    #[test]
    fn resolve_is_case_insensitive() {
        let mut registry = DataSourceRegistry::new();
        registry.register("Binance", Arc::new(NullGateway));

        assert!(registry.resolve("binance").is_some());
        assert!(registry.resolve("BINANCE").is_some());
        assert!(registry.resolve("kraken").is_none());
    }
}
