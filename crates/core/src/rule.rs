//! Alerting rules: a threshold condition over a named metric.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{EntityId, TenantId};

/// Comparison operator for a threshold rule.
///
/// Codes are matched case-insensitively. Unknown codes do not parse;
/// the evaluator treats them as "never a breach" (see
/// [`crate::evaluate::evaluate`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleOperator {
    Gt,
    Gte,
    Lt,
    Lte,
    Eq,
}

impl RuleOperator {
    /// Parse an operator code (case-insensitive). Returns `None` for
    /// unknown codes rather than erroring.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.to_ascii_lowercase().as_str() {
            "gt" => Some(Self::Gt),
            "gte" => Some(Self::Gte),
            "lt" => Some(Self::Lt),
            "lte" => Some(Self::Lte),
            "eq" => Some(Self::Eq),
            _ => None,
        }
    }

    /// Canonical lowercase code for persistence.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Eq => "eq",
        }
    }

    /// Human phrasing used in signal titles and notification bodies.
    pub fn phrase(&self) -> &'static str {
        match self {
            Self::Gt => "above",
            Self::Gte => "at or above",
            Self::Lt => "below",
            Self::Lte => "at or below",
            Self::Eq => "equal to",
        }
    }
}

impl std::fmt::Display for RuleOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Alert severity level, ordered from lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "info" => Ok(Severity::Info),
            "warning" => Ok(Severity::Warning),
            "critical" => Ok(Severity::Critical),
            _ => Err(CoreError::Validation(format!("unknown severity: {s}"))),
        }
    }
}

/// Delivery channel for a queued notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelType {
    Email,
    Webhook,
    Slack,
}

impl std::fmt::Display for ChannelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelType::Email => write!(f, "email"),
            ChannelType::Webhook => write!(f, "webhook"),
            ChannelType::Slack => write!(f, "slack"),
        }
    }
}

impl std::str::FromStr for ChannelType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "email" => Ok(ChannelType::Email),
            "webhook" => Ok(ChannelType::Webhook),
            "slack" => Ok(ChannelType::Slack),
            _ => Err(CoreError::Validation(format!("unknown channel type: {s}"))),
        }
    }
}

/// A tenant-owned alerting condition over one of an asset's metrics.
///
/// Immutable once created except for the activation toggle (owned by
/// the API surface, not the evaluation engine). The operator is stored
/// as its persisted code; the evaluator re-parses it on each evaluation
/// so rows written with a code this build doesn't know fail safe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub id: EntityId,
    pub tenant_id: TenantId,
    pub asset_id: EntityId,
    pub metric_name: String,
    pub operator: String,
    pub threshold: Decimal,
    pub severity: Severity,
    /// How many consecutive breaching evaluations are required before a
    /// signal fires. Counted in evaluations, not wall-clock time.
    pub required_breaches: i32,
    /// Channel the resulting notification is queued on.
    pub channel_type: ChannelType,
    /// Recipient for that channel (address, URL, or channel name).
    pub recipient: String,
    /// Optional evaluation-frequency code; lets a runner shard rules
    /// across cycle cadences. `None` means the default cadence.
    pub frequency: Option<String>,
    pub active: bool,
}

impl Rule {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        tenant_id: TenantId,
        asset_id: EntityId,
        metric_name: impl Into<String>,
        operator: impl Into<String>,
        threshold: Decimal,
        severity: Severity,
        required_breaches: i32,
        channel_type: ChannelType,
        recipient: impl Into<String>,
    ) -> Result<Self, CoreError> {
        let metric_name = metric_name.into();
        let operator = operator.into();
        let recipient = recipient.into();

        if metric_name.trim().is_empty() {
            return Err(CoreError::Validation(
                "rule metric_name must not be empty".into(),
            ));
        }
        if RuleOperator::from_code(&operator).is_none() {
            return Err(CoreError::Validation(format!(
                "unknown rule operator: {operator}"
            )));
        }
        if required_breaches < 1 {
            return Err(CoreError::Validation(format!(
                "required_breaches must be at least 1, got {required_breaches}"
            )));
        }
        if recipient.trim().is_empty() {
            return Err(CoreError::Validation(
                "rule recipient must not be empty".into(),
            ));
        }

        Ok(Self {
            id: uuid::Uuid::now_v7(),
            tenant_id,
            asset_id,
            metric_name,
            operator,
            threshold,
            severity,
            required_breaches,
            channel_type,
            recipient,
            frequency: None,
            active: true,
        })
    }

    /// Assign an evaluation-frequency code.
    pub fn with_frequency(mut self, frequency: impl Into<String>) -> Self {
        self.frequency = Some(frequency.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn new_rule(operator: &str, required: i32) -> Result<Rule, CoreError> {
        Rule::new(
            uuid::Uuid::now_v7(),
            uuid::Uuid::now_v7(),
            "price",
            operator,
            dec!(100),
            Severity::Warning,
            required,
            ChannelType::Email,
            "ops@example.com",
        )
    }

    #[test]
    fn operator_codes_parse_case_insensitively() {
        assert_eq!(RuleOperator::from_code("GT"), Some(RuleOperator::Gt));
        assert_eq!(RuleOperator::from_code("gte"), Some(RuleOperator::Gte));
        assert_eq!(RuleOperator::from_code("Lt"), Some(RuleOperator::Lt));
        assert_eq!(RuleOperator::from_code("LTE"), Some(RuleOperator::Lte));
        assert_eq!(RuleOperator::from_code("eq"), Some(RuleOperator::Eq));
        assert_eq!(RuleOperator::from_code("between"), None);
    }

    #[test]
    fn unknown_operator_is_rejected_at_construction() {
        assert!(new_rule("between", 1).is_err());
    }

    #[test]
    fn required_breaches_must_be_positive() {
        assert!(new_rule("gt", 0).is_err());
        assert!(new_rule("gt", 1).is_ok());
    }

    #[test]
    fn severity_ordering() {
        assert!(Severity::Critical > Severity::Warning);
        assert!(Severity::Warning > Severity::Info);
    }
}
