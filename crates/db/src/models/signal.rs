//! Signal state row model.

use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

use sentra_core::signal::SignalState;
use sentra_core::types::Timestamp;

/// A row from the `signal_states` table (one per rule).
#[derive(Debug, Clone, FromRow)]
pub struct SignalStateRow {
    pub rule_id: Uuid,
    pub tenant_id: Uuid,
    pub consecutive_breaches: i32,
    pub breached: bool,
    pub last_value: Option<Decimal>,
    pub last_evaluated_at: Option<Timestamp>,
}

impl From<SignalStateRow> for SignalState {
    fn from(row: SignalStateRow) -> Self {
        SignalState {
            rule_id: row.rule_id,
            tenant_id: row.tenant_id,
            consecutive_breaches: row.consecutive_breaches,
            breached: row.breached,
            last_value: row.last_value,
            last_evaluated_at: row.last_evaluated_at,
        }
    }
}
