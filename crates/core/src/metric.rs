//! Metric definitions and their append-only time series.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{EntityId, TenantId, Timestamp};

/// A named measurement definition belonging to an asset (e.g. "price").
///
/// Unique per (asset_id, name); names are matched case-insensitively
/// against values fetched from the data source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metric {
    pub id: EntityId,
    pub tenant_id: TenantId,
    pub asset_id: EntityId,
    pub name: String,
    pub unit: Option<String>,
    pub active: bool,
}

impl Metric {
    pub fn new(
        tenant_id: TenantId,
        asset_id: EntityId,
        name: impl Into<String>,
        unit: Option<String>,
    ) -> Result<Self, CoreError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(CoreError::Validation("metric name must not be empty".into()));
        }
        Ok(Self {
            id: uuid::Uuid::now_v7(),
            tenant_id,
            asset_id,
            name,
            unit,
            active: true,
        })
    }

    /// Case-insensitive name match, used when fanning fetched values out
    /// into metric definitions.
    pub fn matches_name(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

/// One timestamped value in a metric's append-only series.
///
/// Immutable once written; `timestamp` is source-reported, `inserted_at`
/// is set by storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricDataPoint {
    pub tenant_id: TenantId,
    pub metric_id: EntityId,
    pub value: Decimal,
    pub timestamp: Timestamp,
    pub inserted_at: Timestamp,
}

/// A new data point staged for insertion during an ingestion cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMetricDataPoint {
    pub tenant_id: TenantId,
    pub metric_id: EntityId,
    pub value: Decimal,
    pub timestamp: Timestamp,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_match_is_case_insensitive() {
        let metric = Metric::new(
            uuid::Uuid::now_v7(),
            uuid::Uuid::now_v7(),
            "Price",
            Some("USD".into()),
        )
        .unwrap();

        assert!(metric.matches_name("price"));
        assert!(metric.matches_name("PRICE"));
        assert!(!metric.matches_name("volume"));
    }

    #[test]
    fn empty_name_is_rejected() {
        let err = Metric::new(uuid::Uuid::now_v7(), uuid::Uuid::now_v7(), "", None).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }
}
