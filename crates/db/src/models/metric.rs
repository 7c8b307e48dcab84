//! Metric definition and data point row models.

use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

use sentra_core::metric::{Metric, MetricDataPoint};
use sentra_core::types::Timestamp;

/// A row from the `metrics` table.
#[derive(Debug, Clone, FromRow)]
pub struct MetricRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub asset_id: Uuid,
    pub name: String,
    pub unit: Option<String>,
    pub active: bool,
}

impl From<MetricRow> for Metric {
    fn from(row: MetricRow) -> Self {
        Metric {
            id: row.id,
            tenant_id: row.tenant_id,
            asset_id: row.asset_id,
            name: row.name,
            unit: row.unit,
            active: row.active,
        }
    }
}

/// A row from the `metric_data_points` table (append-only time series).
#[derive(Debug, Clone, FromRow)]
pub struct MetricDataPointRow {
    pub tenant_id: Uuid,
    pub metric_id: Uuid,
    pub value: Decimal,
    pub timestamp: Timestamp,
    pub inserted_at: Timestamp,
}

impl From<MetricDataPointRow> for MetricDataPoint {
    fn from(row: MetricDataPointRow) -> Self {
        MetricDataPoint {
            tenant_id: row.tenant_id,
            metric_id: row.metric_id,
            value: row.value,
            timestamp: row.timestamp,
            inserted_at: row.inserted_at,
        }
    }
}
