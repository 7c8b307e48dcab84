//! The ingestion scheduler: selects due assets, batches external
//! fetches per data source, fans results out into tenant-scoped data
//! points, and advances cursors, all committed once per cycle.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use sentra_core::metric::NewMetricDataPoint;
use sentra_core::types::Timestamp;

use crate::gateway::{DataSourceRegistry, FetchResult, FetchedValue};
use crate::ports::{AssetRepository, DueAsset, UnitOfWorkProvider};
use crate::CycleError;

/// Summary counters for one ingestion cycle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestionReport {
    /// Assets whose fetch succeeded and whose cursor advanced.
    pub assets_processed: usize,
    /// Data points staged and committed this cycle.
    pub data_points_created: usize,
    /// Per-asset failures (fetch failure, unregistered source).
    pub errors: usize,
}

pub struct IngestionScheduler {
    assets: Arc<dyn AssetRepository>,
    registry: Arc<DataSourceRegistry>,
    uow: Arc<dyn UnitOfWorkProvider>,
}

impl IngestionScheduler {
    pub fn new(
        assets: Arc<dyn AssetRepository>,
        registry: Arc<DataSourceRegistry>,
        uow: Arc<dyn UnitOfWorkProvider>,
    ) -> Self {
        Self {
            assets,
            registry,
            uow,
        }
    }

    /// Run one ingestion cycle at `now`.
    ///
    /// Failures are isolated per asset: a failed fetch leaves that
    /// asset's cursor untouched so it is retried next cycle, while the
    /// rest of the group proceeds. Only a storage failure (including
    /// the final commit) or cancellation aborts the cycle, and then
    /// nothing is persisted.
    pub async fn run_cycle(
        &self,
        now: Timestamp,
        cancel: &CancellationToken,
    ) -> Result<IngestionReport, CycleError> {
        let due = self.assets.get_due_for_ingestion(now).await?;
        if due.is_empty() {
            tracing::debug!("Ingestion: no assets due");
            return Ok(IngestionReport::default());
        }

        // Batch by data source, not by tenant: one upstream call per
        // source regardless of how many tenants monitor an identifier.
        let mut groups: BTreeMap<String, Vec<DueAsset>> = BTreeMap::new();
        for asset in due {
            groups
                .entry(asset.asset.source_code.to_ascii_lowercase())
                .or_default()
                .push(asset);
        }

        let mut report = IngestionReport::default();
        let mut uow = self.uow.begin();

        for (source_code, group) in &groups {
            if cancel.is_cancelled() {
                return Err(CycleError::Cancelled);
            }

            let Some(gateway) = self.registry.resolve(source_code) else {
                tracing::warn!(
                    source_code,
                    assets = group.len(),
                    "Ingestion: no gateway registered for source, skipping group"
                );
                report.errors += group.len();
                continue;
            };

            let identifiers: Vec<String> = group
                .iter()
                .map(|a| a.asset.external_id.clone())
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect();

            let results = match gateway.fetch_batch(&identifiers).await {
                Ok(results) => results,
                Err(e) => {
                    // Transport-level failure: no results for anyone in
                    // this group; cursors stay put.
                    tracing::warn!(
                        source_code,
                        assets = group.len(),
                        error = %e,
                        "Ingestion: batch fetch failed for group"
                    );
                    report.errors += group.len();
                    continue;
                }
            };

            for due_asset in group {
                let asset = &due_asset.asset;
                match results.get(&asset.external_id) {
                    Some(FetchResult::Success(values)) => {
                        let points = fan_out(due_asset, values);
                        report.data_points_created += points.len();
                        uow.add_points(points);
                        uow.update_cursor(asset.cursor_after(now));
                        report.assets_processed += 1;
                    }
                    Some(FetchResult::Failure(msg)) => {
                        tracing::warn!(
                            asset_id = %asset.id,
                            external_id = %asset.external_id,
                            source_code,
                            error = %msg,
                            "Ingestion: fetch failed for asset"
                        );
                        report.errors += 1;
                    }
                    None => {
                        tracing::warn!(
                            asset_id = %asset.id,
                            external_id = %asset.external_id,
                            source_code,
                            "Ingestion: gateway returned no result for identifier"
                        );
                        report.errors += 1;
                    }
                }
            }
        }

        if cancel.is_cancelled() {
            return Err(CycleError::Cancelled);
        }

        uow.commit().await?;

        tracing::info!(
            assets_processed = report.assets_processed,
            data_points_created = report.data_points_created,
            errors = report.errors,
            "Ingestion cycle complete"
        );
        Ok(report)
    }
}

/// Turn one asset's fetched values into staged data points.
///
/// Fetched metric names are matched case-insensitively against the
/// asset's active metric definitions; unmatched values are dropped
/// without error (the source may expose metrics the tenant has not
/// defined). Every point carries the asset's own tenant id, so a
/// shared identifier fans out into independent tenant-scoped rows.
fn fan_out(due_asset: &DueAsset, values: &[FetchedValue]) -> Vec<NewMetricDataPoint> {
    let asset = &due_asset.asset;
    let mut points = Vec::new();

    for value in values {
        let matched = due_asset
            .metrics
            .iter()
            .find(|m| m.active && m.matches_name(&value.metric_name));

        match matched {
            Some(metric) => points.push(NewMetricDataPoint {
                tenant_id: asset.tenant_id,
                metric_id: metric.id,
                value: value.value,
                timestamp: value.timestamp,
            }),
            None => {
                tracing::debug!(
                    asset_id = %asset.id,
                    metric_name = %value.metric_name,
                    "Ingestion: fetched metric has no matching definition, dropped"
                );
            }
        }
    }

    points
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use sentra_core::asset::Asset;
    use sentra_core::metric::Metric;

    fn due_asset_with_metrics(names: &[&str]) -> DueAsset {
        let tenant = uuid::Uuid::now_v7();
        let asset = Asset::new(tenant, "BTC", "binance", 60).unwrap();
        let metrics = names
            .iter()
            .map(|n| Metric::new(tenant, asset.id, *n, None).unwrap())
            .collect();
        DueAsset { asset, metrics }
    }

    fn fetched(name: &str) -> FetchedValue {
        FetchedValue {
            metric_name: name.to_string(),
            value: dec!(45000),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn fan_out_matches_names_case_insensitively() {
        let due = due_asset_with_metrics(&["Price"]);
        let points = fan_out(&due, &[fetched("PRICE")]);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].tenant_id, due.asset.tenant_id);
        assert_eq!(points[0].metric_id, due.metrics[0].id);
    }

    #[test]
    fn fan_out_drops_unmatched_values_silently() {
        let due = due_asset_with_metrics(&["price"]);
        let points = fan_out(&due, &[fetched("price"), fetched("volume")]);
        assert_eq!(points.len(), 1);
    }

    #[test]
    fn fan_out_skips_inactive_metrics() {
        let mut due = due_asset_with_metrics(&["price"]);
        due.metrics[0].active = false;
        let points = fan_out(&due, &[fetched("price")]);
        assert!(points.is_empty());
    }
}
