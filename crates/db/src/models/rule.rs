//! Rule row model.

use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

use sentra_core::error::CoreError;
use sentra_core::rule::Rule;

/// A row from the `rules` table.
///
/// Severity and channel type are stored as their lowercase codes;
/// conversion to the domain type parses them, so a row with an unknown
/// code surfaces as a validation error rather than a panic.
#[derive(Debug, Clone, FromRow)]
pub struct RuleRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub asset_id: Uuid,
    pub metric_name: String,
    pub operator: String,
    pub threshold: Decimal,
    pub severity: String,
    pub required_breaches: i32,
    pub channel_type: String,
    pub recipient: String,
    pub frequency: Option<String>,
    pub active: bool,
}

impl TryFrom<RuleRow> for Rule {
    type Error = CoreError;

    fn try_from(row: RuleRow) -> Result<Self, Self::Error> {
        Ok(Rule {
            id: row.id,
            tenant_id: row.tenant_id,
            asset_id: row.asset_id,
            metric_name: row.metric_name,
            operator: row.operator,
            threshold: row.threshold,
            severity: row.severity.parse()?,
            required_breaches: row.required_breaches,
            channel_type: row.channel_type.parse()?,
            recipient: row.recipient,
            frequency: row.frequency,
            active: row.active,
        })
    }
}
