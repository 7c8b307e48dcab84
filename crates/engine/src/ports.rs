//! Storage ports consumed by the engines.
//!
//! Reads go through per-entity repository traits; writes are staged on
//! a [`UnitOfWork`] and flushed by its single `commit`, which is the
//! one transactional boundary of a cycle. Implementations live in
//! `sentra-db`; tests use in-memory fakes.

use async_trait::async_trait;

use sentra_core::asset::{Asset, CursorAdvance};
use sentra_core::metric::{Metric, MetricDataPoint, NewMetricDataPoint};
use sentra_core::rule::Rule;
use sentra_core::signal::{NewNotification, Signal, SignalState};
use sentra_core::tenant::TenantScope;
use sentra_core::types::{EntityId, TenantId, Timestamp};

/// Failure inside a storage backend.
#[derive(Debug, thiserror::Error)]
#[error("storage failure: {0}")]
pub struct StoreError(#[source] pub Box<dyn std::error::Error + Send + Sync>);

impl StoreError {
    pub fn new(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self(Box::new(err))
    }

    pub fn message(msg: impl Into<String>) -> Self {
        Self(msg.into().into())
    }
}

/// An asset due for ingestion, with its active metric definitions
/// eagerly loaded so the fan-out needs no further reads.
#[derive(Debug, Clone)]
pub struct DueAsset {
    pub asset: Asset,
    pub metrics: Vec<Metric>,
}

/// Selection filter for [`RuleRepository::get_active`].
#[derive(Debug, Clone)]
pub struct RuleFilter {
    /// Tenant scope; the evaluation engine is a system batch job and
    /// passes [`TenantScope::All`] by default.
    pub scope: TenantScope,
    /// Restrict to rules carrying this evaluation-frequency code.
    pub frequency: Option<String>,
}

impl Default for RuleFilter {
    fn default() -> Self {
        Self {
            scope: TenantScope::All,
            frequency: None,
        }
    }
}

#[async_trait]
pub trait AssetRepository: Send + Sync {
    /// All active assets whose cursor is unset or has passed `now`.
    async fn get_due_for_ingestion(&self, now: Timestamp) -> Result<Vec<DueAsset>, StoreError>;
}

#[async_trait]
pub trait MetricDataRepository: Send + Sync {
    /// Latest data point for an asset's metric, matched by name
    /// case-insensitively. `None` when the series is empty.
    async fn get_latest_by_asset_and_name(
        &self,
        asset_id: EntityId,
        metric_name: &str,
    ) -> Result<Option<MetricDataPoint>, StoreError>;
}

#[async_trait]
pub trait RuleRepository: Send + Sync {
    async fn get_active(&self, filter: &RuleFilter) -> Result<Vec<Rule>, StoreError>;
}

#[async_trait]
pub trait SignalStateRepository: Send + Sync {
    /// The breach-counter row for a rule, if one has been created.
    ///
    /// Absence means the rule has never been evaluated; the engine
    /// starts from [`SignalState::initial`] and the state row is
    /// created by the cycle's commit (lazy creation, upserted).
    async fn get(
        &self,
        tenant_id: TenantId,
        rule_id: EntityId,
    ) -> Result<Option<SignalState>, StoreError>;
}

/// Staged writes for one engine cycle.
///
/// Staging is in-memory; nothing reaches storage until `commit`, which
/// must apply everything in a single transaction. Dropping the unit of
/// work without committing discards all staged writes, which is how
/// cancellation stays all-or-nothing.
#[async_trait]
pub trait UnitOfWork: Send {
    fn add_points(&mut self, points: Vec<NewMetricDataPoint>);
    fn update_cursor(&mut self, advance: CursorAdvance);
    fn put_signal_state(&mut self, state: SignalState);
    fn add_signal(&mut self, signal: Signal);
    fn add_notification(&mut self, notification: NewNotification);

    /// Flush all staged writes atomically.
    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}

/// Creates a fresh [`UnitOfWork`] per cycle.
pub trait UnitOfWorkProvider: Send + Sync {
    fn begin(&self) -> Box<dyn UnitOfWork>;
}
