//! Breach-counter state machine and the records it emits.
//!
//! One [`SignalState`] row exists per rule (created lazily on first
//! evaluation). The state moves between Idle (count 0, not breached)
//! and Breaching (count >= 1). Reaching the rule's required count fires
//! exactly one [`Signal`], queues one notification, and resets the
//! state so the next breach cycle counts fresh.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::rule::{ChannelType, Rule, RuleOperator, Severity};
use crate::types::{EntityId, TenantId, Timestamp};

/// The live breach counter for one rule. Mutated on every evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalState {
    pub rule_id: EntityId,
    pub tenant_id: TenantId,
    pub consecutive_breaches: i32,
    pub breached: bool,
    pub last_value: Option<Decimal>,
    pub last_evaluated_at: Option<Timestamp>,
}

/// What a breach evaluation did to the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreachOutcome {
    /// The counter advanced but has not reached the rule's requirement.
    Counting,
    /// The requirement was met: the caller must fire a signal and the
    /// state has been reset for a fresh cycle.
    Fired,
}

impl SignalState {
    /// Initial (Idle) state for a rule that has never been evaluated.
    pub fn initial(tenant_id: TenantId, rule_id: EntityId) -> Self {
        Self {
            rule_id,
            tenant_id,
            consecutive_breaches: 0,
            breached: false,
            last_value: None,
            last_evaluated_at: None,
        }
    }

    /// The latest value does not breach: back to Idle.
    ///
    /// This is the only way out of Breaching without firing.
    pub fn record_success(&mut self, value: Decimal, now: Timestamp) {
        self.consecutive_breaches = 0;
        self.breached = false;
        self.last_value = Some(value);
        self.last_evaluated_at = Some(now);
    }

    /// The latest value breaches: advance the counter, and reset if the
    /// rule's requirement is met.
    pub fn record_breach(&mut self, required: i32, value: Decimal, now: Timestamp) -> BreachOutcome {
        self.consecutive_breaches += 1;
        self.breached = true;
        self.last_value = Some(value);
        self.last_evaluated_at = Some(now);

        if self.consecutive_breaches >= required {
            self.reset(now);
            BreachOutcome::Fired
        } else {
            BreachOutcome::Counting
        }
    }

    /// Begin a fresh breach cycle. Clearing `last_value` prevents
    /// retriggering on the same metric value.
    pub fn reset(&mut self, now: Timestamp) {
        self.consecutive_breaches = 0;
        self.breached = false;
        self.last_value = None;
        self.last_evaluated_at = Some(now);
    }
}

/// Lifecycle status of a signal. The evaluation engine only ever
/// creates signals as `Open`; resolution belongs to another surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalStatus {
    Open,
    Acknowledged,
    Resolved,
}

impl std::fmt::Display for SignalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalStatus::Open => write!(f, "open"),
            SignalStatus::Acknowledged => write!(f, "acknowledged"),
            SignalStatus::Resolved => write!(f, "resolved"),
        }
    }
}

/// The immutable alert record emitted when a breach cycle completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    pub id: EntityId,
    pub tenant_id: TenantId,
    pub rule_id: EntityId,
    pub asset_id: EntityId,
    pub status: SignalStatus,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub trigger_value: Decimal,
    pub threshold_value: Decimal,
    pub triggered_at: Timestamp,
}

impl Signal {
    /// Build the signal for a rule whose breach cycle just completed.
    ///
    /// The id is generated here (not by storage) so the notification
    /// staged in the same cycle commit can reference it.
    pub fn fire(rule: &Rule, trigger_value: Decimal, now: Timestamp) -> Self {
        let phrase = RuleOperator::from_code(&rule.operator)
            .map(|op| op.phrase())
            .unwrap_or("beyond");

        let title = format!(
            "{} {} {}",
            rule.metric_name, phrase, rule.threshold
        );
        let description = format!(
            "Metric '{}' was {} the threshold {} for {} consecutive evaluation(s); latest value: {}",
            rule.metric_name, phrase, rule.threshold, rule.required_breaches, trigger_value
        );

        Self {
            id: uuid::Uuid::now_v7(),
            tenant_id: rule.tenant_id,
            rule_id: rule.id,
            asset_id: rule.asset_id,
            status: SignalStatus::Open,
            severity: rule.severity,
            title,
            description,
            trigger_value,
            threshold_value: rule.threshold,
            triggered_at: now,
        }
    }
}

/// A queued delivery request. Created by the evaluation cycle; only the
/// external dispatcher mutates it afterwards (sent flag, retry count).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewNotification {
    pub tenant_id: TenantId,
    pub signal_id: EntityId,
    pub channel_type: ChannelType,
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

impl NewNotification {
    /// Render the notification for a freshly fired signal.
    pub fn for_signal(rule: &Rule, signal: &Signal) -> Self {
        Self {
            tenant_id: signal.tenant_id,
            signal_id: signal.id,
            channel_type: rule.channel_type,
            recipient: rule.recipient.clone(),
            subject: format!("[{}] {}", signal.severity, signal.title),
            body: signal.description.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
