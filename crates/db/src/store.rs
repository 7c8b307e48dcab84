//! `PgStore`: the Postgres-backed implementation of every read port
//! plus the unit-of-work provider, handed to both engines by the worker.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use sentra_core::metric::{Metric, MetricDataPoint};
use sentra_core::rule::Rule;
use sentra_core::signal::SignalState;
use sentra_core::types::{EntityId, TenantId, Timestamp};
use sentra_engine::ports::{
    AssetRepository, DueAsset, MetricDataRepository, RuleFilter, RuleRepository,
    SignalStateRepository, StoreError, UnitOfWork, UnitOfWorkProvider,
};

use crate::repositories::{AssetRepo, MetricDataRepo, RuleRepo, SignalStateRepo};
use crate::unit_of_work::PgUnitOfWork;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AssetRepository for PgStore {
    async fn get_due_for_ingestion(&self, now: Timestamp) -> Result<Vec<DueAsset>, StoreError> {
        let assets = AssetRepo::get_due(&self.pool, now)
            .await
            .map_err(StoreError::new)?;
        if assets.is_empty() {
            return Ok(Vec::new());
        }

        let asset_ids: Vec<Uuid> = assets.iter().map(|a| a.id).collect();
        let metric_rows = AssetRepo::get_active_metrics(&self.pool, &asset_ids)
            .await
            .map_err(StoreError::new)?;

        let mut by_asset: HashMap<Uuid, Vec<Metric>> = HashMap::new();
        for row in metric_rows {
            by_asset
                .entry(row.asset_id)
                .or_default()
                .push(Metric::from(row));
        }

        Ok(assets
            .into_iter()
            .map(|row| {
                let metrics = by_asset.remove(&row.id).unwrap_or_default();
                DueAsset {
                    asset: row.into(),
                    metrics,
                }
            })
            .collect())
    }
}

#[async_trait]
impl MetricDataRepository for PgStore {
    async fn get_latest_by_asset_and_name(
        &self,
        asset_id: EntityId,
        metric_name: &str,
    ) -> Result<Option<MetricDataPoint>, StoreError> {
        let row = MetricDataRepo::get_latest_by_asset_and_name(&self.pool, asset_id, metric_name)
            .await
            .map_err(StoreError::new)?;
        Ok(row.map(MetricDataPoint::from))
    }
}

#[async_trait]
impl RuleRepository for PgStore {
    async fn get_active(&self, filter: &RuleFilter) -> Result<Vec<Rule>, StoreError> {
        let rows = RuleRepo::get_active(
            &self.pool,
            filter.scope.tenant_id(),
            filter.frequency.as_deref(),
        )
        .await
        .map_err(StoreError::new)?;

        rows.into_iter()
            .map(|row| Rule::try_from(row).map_err(StoreError::new))
            .collect()
    }
}

#[async_trait]
impl SignalStateRepository for PgStore {
    async fn get(
        &self,
        tenant_id: TenantId,
        rule_id: EntityId,
    ) -> Result<Option<SignalState>, StoreError> {
        let row = SignalStateRepo::get(&self.pool, tenant_id, rule_id)
            .await
            .map_err(StoreError::new)?;
        Ok(row.map(SignalState::from))
    }
}

impl UnitOfWorkProvider for PgStore {
    fn begin(&self) -> Box<dyn UnitOfWork> {
        Box::new(PgUnitOfWork::new(self.pool.clone()))
    }
}
