//! Concrete data-source gateways.
//!
//! Providers implement the engine's batched-fetch contract; the worker
//! registers them in a `DataSourceRegistry` by source code.

pub mod http;

pub use http::{HttpGatewayConfig, HttpJsonGateway};
