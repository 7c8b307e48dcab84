//! Repository for the `assets` table and its ingestion cursor.

use sqlx::PgPool;
use uuid::Uuid;

use sentra_core::asset::CursorAdvance;
use sentra_core::types::Timestamp;

use crate::models::asset::AssetRow;
use crate::models::metric::MetricRow;

/// Column list for `assets` queries.
const COLUMNS: &str = "\
    id, tenant_id, external_id, source_code, interval_secs, \
    last_ingested_at, next_ingested_at, active";

/// Column list for `metrics` queries (eager load with the due set).
const METRIC_COLUMNS: &str = "id, tenant_id, asset_id, name, unit, active";

/// Provides query operations for assets.
pub struct AssetRepo;

impl AssetRepo {
    /// All active assets whose cursor is unset or has passed `now`.
    ///
    /// An asset with no cursor has never been ingested and is always due.
    pub async fn get_due(pool: &PgPool, now: Timestamp) -> Result<Vec<AssetRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM assets \
             WHERE active AND (next_ingested_at IS NULL OR next_ingested_at <= $1) \
             ORDER BY source_code, external_id"
        );
        sqlx::query_as::<_, AssetRow>(&query)
            .bind(now)
            .fetch_all(pool)
            .await
    }

    /// Active metric definitions for a set of assets, in one query.
    pub async fn get_active_metrics(
        pool: &PgPool,
        asset_ids: &[Uuid],
    ) -> Result<Vec<MetricRow>, sqlx::Error> {
        let query = format!(
            "SELECT {METRIC_COLUMNS} FROM metrics \
             WHERE active AND asset_id = ANY($1)"
        );
        sqlx::query_as::<_, MetricRow>(&query)
            .bind(asset_ids)
            .fetch_all(pool)
            .await
    }

    /// Advance one asset's ingestion cursor inside the cycle transaction.
    pub async fn update_cursor(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        advance: &CursorAdvance,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE assets \
             SET last_ingested_at = $2, next_ingested_at = $3, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(advance.asset_id)
        .bind(advance.last_ingested_at)
        .bind(advance.next_ingested_at)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}
