//! Repository for the `signals` table (immutable alert records).

use sentra_core::signal::Signal;

/// Column list for `signals` INSERT (excludes `created_at`).
const INSERT_COLUMNS: &str = "\
    id, tenant_id, rule_id, asset_id, status, severity, title, description, \
    trigger_value, threshold_value, triggered_at";

/// Provides insert operations for signals. The evaluation engine never
/// updates a signal after creation.
pub struct SignalRepo;

impl SignalRepo {
    /// Insert a fired signal inside the cycle transaction.
    pub async fn insert(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        signal: &Signal,
    ) -> Result<(), sqlx::Error> {
        let query = format!(
            "INSERT INTO signals ({INSERT_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)"
        );
        sqlx::query(&query)
            .bind(signal.id)
            .bind(signal.tenant_id)
            .bind(signal.rule_id)
            .bind(signal.asset_id)
            .bind(signal.status.to_string())
            .bind(signal.severity.to_string())
            .bind(&signal.title)
            .bind(&signal.description)
            .bind(signal.trigger_value)
            .bind(signal.threshold_value)
            .bind(signal.triggered_at)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }
}
