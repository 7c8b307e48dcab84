//! Repository for the `metric_data_points` table (append-only time-series).

use sqlx::PgPool;
use uuid::Uuid;

use sentra_core::metric::NewMetricDataPoint;

use crate::models::metric::MetricDataPointRow;

/// Column list for `metric_data_points` SELECT queries.
const COLUMNS: &str = "tenant_id, metric_id, value, timestamp, inserted_at";

/// Column list for INSERT statements (excludes auto-generated columns).
const INSERT_COLUMNS: &str = "tenant_id, metric_id, value, timestamp";

/// Provides query operations for metric data points.
pub struct MetricDataRepo;

impl MetricDataRepo {
    /// Batch-insert data points inside the cycle transaction.
    ///
    /// Uses a single multi-row INSERT.
    pub async fn insert_batch(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        points: &[NewMetricDataPoint],
    ) -> Result<(), sqlx::Error> {
        if points.is_empty() {
            return Ok(());
        }

        // Build a multi-row VALUES clause.
        let mut query = format!("INSERT INTO metric_data_points ({INSERT_COLUMNS}) VALUES ");
        let mut param_idx = 1u32;
        for (i, _) in points.iter().enumerate() {
            if i > 0 {
                query.push_str(", ");
            }
            query.push('(');
            for j in 0..4 {
                if j > 0 {
                    query.push_str(", ");
                }
                query.push('$');
                query.push_str(&param_idx.to_string());
                param_idx += 1;
            }
            query.push(')');
        }

        let mut q = sqlx::query(&query);
        for p in points {
            q = q
                .bind(p.tenant_id)
                .bind(p.metric_id)
                .bind(p.value)
                .bind(p.timestamp);
        }
        q.execute(&mut **tx).await?;
        Ok(())
    }

    /// Latest data point for an asset's metric, matched by name
    /// case-insensitively. `None` when the series is empty or no such
    /// metric is defined.
    pub async fn get_latest_by_asset_and_name(
        pool: &PgPool,
        asset_id: Uuid,
        metric_name: &str,
    ) -> Result<Option<MetricDataPointRow>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM metric_data_points p \
             JOIN metrics m ON m.id = p.metric_id \
             WHERE m.asset_id = $1 AND LOWER(m.name) = LOWER($2) AND m.active \
             ORDER BY p.timestamp DESC \
             LIMIT 1",
            columns_qualified("p")
        );
        sqlx::query_as::<_, MetricDataPointRow>(&query)
            .bind(asset_id)
            .bind(metric_name)
            .fetch_optional(pool)
            .await
    }
}

/// Qualify the column list with a table alias for joined queries.
fn columns_qualified(alias: &str) -> String {
    COLUMNS
        .split(", ")
        .map(|c| format!("{alias}.{c}"))
        .collect::<Vec<_>>()
        .join(", ")
}
