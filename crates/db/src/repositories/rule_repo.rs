//! Repository for the `rules` table.

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::rule::RuleRow;

/// Column list for `rules` queries.
const COLUMNS: &str = "\
    id, tenant_id, asset_id, metric_name, operator, threshold, severity, \
    required_breaches, channel_type, recipient, frequency, active";

/// Provides query operations for rules.
pub struct RuleRepo;

impl RuleRepo {
    /// Active rules, optionally restricted by tenant and/or
    /// evaluation-frequency code.
    ///
    /// `tenant_id = None` is the explicit cross-tenant (system batch)
    /// mode, not a default filter bypass.
    pub async fn get_active(
        pool: &PgPool,
        tenant_id: Option<Uuid>,
        frequency: Option<&str>,
    ) -> Result<Vec<RuleRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM rules \
             WHERE active \
               AND ($1::UUID IS NULL OR tenant_id = $1) \
               AND ($2::TEXT IS NULL OR frequency = $2) \
             ORDER BY tenant_id, id"
        );
        sqlx::query_as::<_, RuleRow>(&query)
            .bind(tenant_id)
            .bind(frequency)
            .fetch_all(pool)
            .await
    }
}
