//! The rule evaluation cycle: a per-rule breach-counting state machine
//! that produces exactly one signal per breach cycle and hands delivery
//! off to the notification queue.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use sentra_core::evaluate::evaluate;
use sentra_core::rule::Rule;
use sentra_core::signal::{BreachOutcome, NewNotification, Signal, SignalState};
use sentra_core::types::Timestamp;

use crate::ports::{
    MetricDataRepository, RuleFilter, RuleRepository, SignalStateRepository, StoreError,
    UnitOfWorkProvider,
};
use crate::CycleError;

/// Summary counters for one evaluation cycle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EvaluationReport {
    /// Rules whose latest value was compared against the threshold.
    pub rules_evaluated: usize,
    /// Signals fired (each with exactly one queued notification).
    pub signals_created: usize,
    /// Rules skipped because no metric data exists yet.
    pub rules_skipped: usize,
    /// Rules whose evaluation failed; the cycle continued without them.
    pub errors: usize,
}

/// What evaluating one rule decided. Pure data; staging onto the unit
/// of work happens in the cycle loop so the read path stays testable.
enum RuleOutcome {
    /// No metric data for the rule's (asset, metric name).
    Skipped,
    /// State transition without firing.
    Updated(SignalState),
    /// Breach requirement met: persist the reset state, the signal, and
    /// its notification together.
    Fired {
        state: SignalState,
        signal: Signal,
        notification: NewNotification,
    },
}

pub struct EvaluationCycle {
    rules: Arc<dyn RuleRepository>,
    metric_data: Arc<dyn MetricDataRepository>,
    states: Arc<dyn SignalStateRepository>,
    uow: Arc<dyn UnitOfWorkProvider>,
}

impl EvaluationCycle {
    pub fn new(
        rules: Arc<dyn RuleRepository>,
        metric_data: Arc<dyn MetricDataRepository>,
        states: Arc<dyn SignalStateRepository>,
        uow: Arc<dyn UnitOfWorkProvider>,
    ) -> Self {
        Self {
            rules,
            metric_data,
            states,
            uow,
        }
    }

    /// Run one evaluation cycle at `now` over the rules selected by
    /// `filter`.
    ///
    /// Rules are processed sequentially; a failure evaluating one rule
    /// is counted and logged, and the cycle continues. All state
    /// updates, signals, and notifications across the cycle are
    /// committed in one transaction at the end; a commit failure (or
    /// cancellation before commit) persists nothing.
    pub async fn run_cycle(
        &self,
        filter: &RuleFilter,
        now: Timestamp,
        cancel: &CancellationToken,
    ) -> Result<EvaluationReport, CycleError> {
        let rules = self.rules.get_active(filter).await?;
        if rules.is_empty() {
            tracing::debug!("Evaluation: no active rules selected");
            return Ok(EvaluationReport::default());
        }

        let mut report = EvaluationReport::default();
        let mut uow = self.uow.begin();

        for rule in &rules {
            if cancel.is_cancelled() {
                return Err(CycleError::Cancelled);
            }

            match self.evaluate_rule(rule, now).await {
                Ok(RuleOutcome::Skipped) => {
                    tracing::debug!(
                        rule_id = %rule.id,
                        metric_name = %rule.metric_name,
                        "Evaluation: no metric data yet, rule skipped"
                    );
                    report.rules_skipped += 1;
                }
                Ok(RuleOutcome::Updated(state)) => {
                    uow.put_signal_state(state);
                    report.rules_evaluated += 1;
                }
                Ok(RuleOutcome::Fired {
                    state,
                    signal,
                    notification,
                }) => {
                    tracing::info!(
                        rule_id = %rule.id,
                        tenant_id = %rule.tenant_id,
                        signal_id = %signal.id,
                        trigger_value = %signal.trigger_value,
                        threshold = %signal.threshold_value,
                        "Evaluation: breach cycle complete, signal fired"
                    );
                    uow.put_signal_state(state);
                    uow.add_signal(signal);
                    uow.add_notification(notification);
                    report.rules_evaluated += 1;
                    report.signals_created += 1;
                }
                Err(e) => {
                    tracing::error!(
                        rule_id = %rule.id,
                        tenant_id = %rule.tenant_id,
                        error = %e,
                        "Evaluation: rule evaluation failed, continuing cycle"
                    );
                    report.errors += 1;
                }
            }
        }

        if cancel.is_cancelled() {
            return Err(CycleError::Cancelled);
        }

        uow.commit().await?;

        tracing::info!(
            rules_evaluated = report.rules_evaluated,
            signals_created = report.signals_created,
            rules_skipped = report.rules_skipped,
            errors = report.errors,
            "Evaluation cycle complete"
        );
        Ok(report)
    }

    /// Evaluate a single rule: read the latest value, load or lazily
    /// create the breach state, and apply one state transition.
    ///
    /// Every read here is scoped by the rule's own asset and tenant id,
    /// never by a shared identifier string, so cross-tenant leakage is
    /// structurally impossible.
    async fn evaluate_rule(&self, rule: &Rule, now: Timestamp) -> Result<RuleOutcome, StoreError> {
        let Some(latest) = self
            .metric_data
            .get_latest_by_asset_and_name(rule.asset_id, &rule.metric_name)
            .await?
        else {
            return Ok(RuleOutcome::Skipped);
        };

        let mut state = self
            .states
            .get(rule.tenant_id, rule.id)
            .await?
            .unwrap_or_else(|| SignalState::initial(rule.tenant_id, rule.id));

        if !evaluate(&rule.operator, latest.value, rule.threshold) {
            state.record_success(latest.value, now);
            return Ok(RuleOutcome::Updated(state));
        }

        match state.record_breach(rule.required_breaches, latest.value, now) {
            BreachOutcome::Counting => Ok(RuleOutcome::Updated(state)),
            BreachOutcome::Fired => {
                let signal = Signal::fire(rule, latest.value, now);
                let notification = NewNotification::for_signal(rule, &signal);
                Ok(RuleOutcome::Fired {
                    state,
                    signal,
                    notification,
                })
            }
        }
    }
}
