//! Repository for the `signal_states` table (one row per rule).

use sqlx::PgPool;
use uuid::Uuid;

use sentra_core::signal::SignalState;

use crate::models::signal::SignalStateRow;

/// Column list for `signal_states` queries.
const COLUMNS: &str = "\
    rule_id, tenant_id, consecutive_breaches, breached, last_value, last_evaluated_at";

/// Provides query operations for signal states.
pub struct SignalStateRepo;

impl SignalStateRepo {
    /// The breach-counter row for a rule, if it has been created.
    pub async fn get(
        pool: &PgPool,
        tenant_id: Uuid,
        rule_id: Uuid,
    ) -> Result<Option<SignalStateRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM signal_states \
             WHERE tenant_id = $1 AND rule_id = $2"
        );
        sqlx::query_as::<_, SignalStateRow>(&query)
            .bind(tenant_id)
            .bind(rule_id)
            .fetch_optional(pool)
            .await
    }

    /// Insert or update a rule's breach counter inside the cycle
    /// transaction. Covers lazy creation on first evaluation.
    pub async fn upsert(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        state: &SignalState,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO signal_states \
                 (rule_id, tenant_id, consecutive_breaches, breached, last_value, last_evaluated_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (rule_id) DO UPDATE SET \
                 consecutive_breaches = EXCLUDED.consecutive_breaches, \
                 breached = EXCLUDED.breached, \
                 last_value = EXCLUDED.last_value, \
                 last_evaluated_at = EXCLUDED.last_evaluated_at",
        )
        .bind(state.rule_id)
        .bind(state.tenant_id)
        .bind(state.consecutive_breaches)
        .bind(state.breached)
        .bind(state.last_value)
        .bind(state.last_evaluated_at)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}
