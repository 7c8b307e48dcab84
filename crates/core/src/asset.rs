//! Monitored assets and their ingestion cursor.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{EntityId, TenantId, Timestamp};

/// Minimum allowed ingestion interval in seconds.
pub const MIN_INGESTION_INTERVAL_SECS: i64 = 10;

/// A tenant's pointer to an externally-sourced thing to monitor
/// (e.g. a crypto symbol on an exchange).
///
/// The cursor pair (`last_ingested_at`, `next_ingested_at`) governs
/// due-ness. `next_ingested_at = None` means the asset has never been
/// ingested and is due immediately. Once set, `next_ingested_at` is
/// always `last_ingested_at + interval_secs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub id: EntityId,
    pub tenant_id: TenantId,
    /// Identifier understood by the external data source (e.g. "BTC").
    pub external_id: String,
    /// Code of the data source this asset is fetched from (e.g. "binance").
    pub source_code: String,
    /// Seconds between ingestions.
    pub interval_secs: i64,
    pub last_ingested_at: Option<Timestamp>,
    pub next_ingested_at: Option<Timestamp>,
    pub active: bool,
}

impl Asset {
    /// Create a new active asset with an unset cursor (due immediately).
    pub fn new(
        tenant_id: TenantId,
        external_id: impl Into<String>,
        source_code: impl Into<String>,
        interval_secs: i64,
    ) -> Result<Self, CoreError> {
        let external_id = external_id.into();
        let source_code = source_code.into();

        if external_id.trim().is_empty() {
            return Err(CoreError::Validation(
                "asset external_id must not be empty".into(),
            ));
        }
        if source_code.trim().is_empty() {
            return Err(CoreError::Validation(
                "asset source_code must not be empty".into(),
            ));
        }
        if interval_secs < MIN_INGESTION_INTERVAL_SECS {
            return Err(CoreError::Validation(format!(
                "ingestion interval must be at least {MIN_INGESTION_INTERVAL_SECS}s, got {interval_secs}s"
            )));
        }

        Ok(Self {
            id: uuid::Uuid::now_v7(),
            tenant_id,
            external_id,
            source_code,
            interval_secs,
            last_ingested_at: None,
            next_ingested_at: None,
            active: true,
        })
    }

    /// Whether this asset is due for ingestion at `now`.
    ///
    /// An asset with no cursor is always due (first run).
    pub fn is_due(&self, now: Timestamp) -> bool {
        match self.next_ingested_at {
            None => true,
            Some(next) => next <= now,
        }
    }

    /// The cursor values after a successful ingestion at `now`.
    ///
    /// Maintains the invariant `next = last + interval_secs`.
    pub fn cursor_after(&self, now: Timestamp) -> CursorAdvance {
        CursorAdvance {
            asset_id: self.id,
            last_ingested_at: now,
            next_ingested_at: now + Duration::seconds(self.interval_secs),
        }
    }
}

/// A pending cursor update for one asset, staged until the cycle commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorAdvance {
    pub asset_id: EntityId,
    pub last_ingested_at: Timestamp,
    pub next_ingested_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn tenant() -> TenantId {
        uuid::Uuid::now_v7()
    }

    #[test]
    fn new_asset_has_no_cursor_and_is_due() {
        let asset = Asset::new(tenant(), "BTC", "binance", 60).unwrap();
        assert!(asset.last_ingested_at.is_none());
        assert!(asset.next_ingested_at.is_none());
        assert!(asset.is_due(Utc::now()));
    }

    #[test]
    fn interval_below_minimum_is_rejected() {
        let err = Asset::new(tenant(), "BTC", "binance", 5).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn empty_external_id_is_rejected() {
        assert!(Asset::new(tenant(), "  ", "binance", 60).is_err());
    }

    #[test]
    fn due_only_when_next_has_passed() {
        let now = Utc::now();
        let mut asset = Asset::new(tenant(), "ETH", "binance", 60).unwrap();
        asset.last_ingested_at = Some(now);
        asset.next_ingested_at = Some(now + Duration::seconds(60));

        assert!(!asset.is_due(now));
        assert!(asset.is_due(now + Duration::seconds(60)));
        assert!(asset.is_due(now + Duration::seconds(90)));
    }

    #[test]
    fn cursor_advance_preserves_interval_invariant() {
        let now = Utc::now();
        let asset = Asset::new(tenant(), "BTC", "binance", 300).unwrap();
        let advance = asset.cursor_after(now);
        assert_eq!(advance.last_ingested_at, now);
        assert_eq!(
            advance.next_ingested_at,
            advance.last_ingested_at + Duration::seconds(300)
        );
    }
}
