//! Asset row model.

use sqlx::FromRow;
use uuid::Uuid;

use sentra_core::asset::Asset;
use sentra_core::types::Timestamp;

/// A row from the `assets` table.
#[derive(Debug, Clone, FromRow)]
pub struct AssetRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub external_id: String,
    pub source_code: String,
    pub interval_secs: i64,
    pub last_ingested_at: Option<Timestamp>,
    pub next_ingested_at: Option<Timestamp>,
    pub active: bool,
}

impl From<AssetRow> for Asset {
    fn from(row: AssetRow) -> Self {
        Asset {
            id: row.id,
            tenant_id: row.tenant_id,
            external_id: row.external_id,
            source_code: row.source_code,
            interval_secs: row.interval_secs,
            last_ingested_at: row.last_ingested_at,
            next_ingested_at: row.next_ingested_at,
            active: row.active,
        }
    }
}
