//! Evaluation cycle behaviour: breach counting, signal firing, and
//! failure isolation against in-memory ports.

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio_util::sync::CancellationToken;

use common::MemStore;
use sentra_core::asset::Asset;
use sentra_core::metric::Metric;
use sentra_core::rule::{ChannelType, Rule, Severity};
use sentra_core::signal::SignalStatus;
use sentra_core::types::TenantId;
use sentra_engine::evaluation::EvaluationCycle;
use sentra_engine::ports::RuleFilter;
use sentra_engine::CycleError;

struct Fixture {
    store: Arc<MemStore>,
    cycle: EvaluationCycle,
    tenant: TenantId,
    asset: Asset,
    metric: Metric,
}

impl Fixture {
    fn new() -> Self {
        let store = MemStore::new();
        let tenant = uuid::Uuid::now_v7();
        let asset = Asset::new(tenant, "BTC", "binance", 60).unwrap();
        let metric = Metric::new(tenant, asset.id, "price", None).unwrap();
        store.insert_asset(asset.clone(), vec![metric.clone()]);

        let cycle = EvaluationCycle::new(
            Arc::clone(&store) as _,
            Arc::clone(&store) as _,
            Arc::clone(&store) as _,
            Arc::clone(&store) as _,
        );

        Self {
            store,
            cycle,
            tenant,
            asset,
            metric,
        }
    }

    fn add_rule(&self, operator: &str, threshold: Decimal, required: i32) -> Rule {
        let rule = Rule::new(
            self.tenant,
            self.asset.id,
            "price",
            operator,
            threshold,
            Severity::Warning,
            required,
            ChannelType::Email,
            "ops@example.com",
        )
        .unwrap();
        self.store.insert_rule(rule.clone());
        rule
    }

    fn set_price(&self, value: Decimal) {
        self.store.set_latest(self.tenant, self.metric.id, value);
    }

    async fn run(&self) -> sentra_engine::evaluation::EvaluationReport {
        self.cycle
            .run_cycle(&RuleFilter::default(), Utc::now(), &CancellationToken::new())
            .await
            .unwrap()
    }
}

#[tokio::test]
async fn single_breach_with_requirement_one_fires_and_resets() {
    let fx = Fixture::new();
    let rule = fx.add_rule("gt", dec!(100), 1);
    fx.set_price(dec!(150));

    let report = fx.run().await;

    assert_eq!(report.rules_evaluated, 1);
    assert_eq!(report.signals_created, 1);
    assert_eq!(report.rules_skipped, 0);
    assert_eq!(report.errors, 0);

    fx.store.snapshot(|s| {
        assert_eq!(s.signals.len(), 1);
        let signal = &s.signals[0];
        assert_eq!(signal.status, SignalStatus::Open);
        assert_eq!(signal.trigger_value, dec!(150));
        assert_eq!(signal.threshold_value, dec!(100));
        assert_eq!(signal.tenant_id, fx.tenant);
        assert_eq!(signal.rule_id, rule.id);

        let state = s.states.get(&(fx.tenant, rule.id)).unwrap();
        assert_eq!(state.consecutive_breaches, 0);
        assert!(!state.breached);
        assert!(state.last_value.is_none());

        assert_eq!(s.notifications.len(), 1);
        assert_eq!(s.notifications[0].signal_id, signal.id);
    });
}

#[tokio::test]
async fn interrupted_breach_run_fires_only_after_three_consecutive() {
    let fx = Fixture::new();
    let rule = fx.add_rule("gt", dec!(100), 3);

    // breach, breach, success, breach, breach, breach across 6 cycles:
    // the success on cycle 3 resets the counter, so the requirement is
    // met only on cycle 6.
    let prices = [
        dec!(150),
        dec!(160),
        dec!(90),
        dec!(170),
        dec!(180),
        dec!(190),
    ];
    for (i, price) in prices.iter().enumerate() {
        fx.set_price(*price);
        let report = fx.run().await;
        let expected_signals = if i == 5 { 1 } else { 0 };
        assert_eq!(report.signals_created, expected_signals, "cycle {}", i + 1);
    }

    fx.store.snapshot(|s| {
        assert_eq!(s.signals.len(), 1);
        assert_eq!(s.signals[0].trigger_value, dec!(190));
        let state = s.states.get(&(fx.tenant, rule.id)).unwrap();
        assert_eq!(state.consecutive_breaches, 0);
    });
}

#[tokio::test]
async fn rule_without_metric_data_is_skipped_not_errored() {
    let fx = Fixture::new();
    let rule = fx.add_rule("gt", dec!(100), 1);
    // No price set: the series is empty.

    let report = fx.run().await;

    assert_eq!(report.rules_skipped, 1);
    assert_eq!(report.rules_evaluated, 0);
    assert_eq!(report.errors, 0);
    fx.store.snapshot(|s| {
        // Skipping is not a state transition; no state row is created.
        assert!(!s.states.contains_key(&(fx.tenant, rule.id)));
        assert!(s.signals.is_empty());
    });
}

#[tokio::test]
async fn non_breaching_value_resets_state_without_firing() {
    let fx = Fixture::new();
    let rule = fx.add_rule("gt", dec!(100), 2);

    fx.set_price(dec!(150));
    fx.run().await;
    fx.store.snapshot(|s| {
        assert_eq!(
            s.states.get(&(fx.tenant, rule.id)).unwrap().consecutive_breaches,
            1
        );
    });

    fx.set_price(dec!(50));
    let report = fx.run().await;

    assert_eq!(report.signals_created, 0);
    fx.store.snapshot(|s| {
        let state = s.states.get(&(fx.tenant, rule.id)).unwrap();
        assert_eq!(state.consecutive_breaches, 0);
        assert!(!state.breached);
        assert_eq!(state.last_value, Some(dec!(50)));
    });
}

#[tokio::test]
async fn tenants_sharing_an_identifier_never_cross_contaminate() {
    let store = MemStore::new();
    let tenant_a = uuid::Uuid::now_v7();
    let tenant_b = uuid::Uuid::now_v7();

    // Both tenants monitor "BTC", but each has its own asset, metric,
    // and data points.
    let asset_a = Asset::new(tenant_a, "BTC", "binance", 60).unwrap();
    let metric_a = Metric::new(tenant_a, asset_a.id, "price", None).unwrap();
    store.insert_asset(asset_a.clone(), vec![metric_a.clone()]);

    let asset_b = Asset::new(tenant_b, "BTC", "binance", 60).unwrap();
    let metric_b = Metric::new(tenant_b, asset_b.id, "price", None).unwrap();
    store.insert_asset(asset_b.clone(), vec![metric_b.clone()]);

    store.set_latest(tenant_a, metric_a.id, dec!(150));
    store.set_latest(tenant_b, metric_b.id, dec!(250));

    for (tenant, asset) in [(tenant_a, &asset_a), (tenant_b, &asset_b)] {
        store.insert_rule(
            Rule::new(
                tenant,
                asset.id,
                "price",
                "gt",
                dec!(100),
                Severity::Warning,
                1,
                ChannelType::Email,
                "ops@example.com",
            )
            .unwrap(),
        );
    }

    let cycle = EvaluationCycle::new(
        Arc::clone(&store) as _,
        Arc::clone(&store) as _,
        Arc::clone(&store) as _,
        Arc::clone(&store) as _,
    );
    let report = cycle
        .run_cycle(&RuleFilter::default(), Utc::now(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.signals_created, 2);
    store.snapshot(|s| {
        let for_a = s.signals.iter().find(|x| x.tenant_id == tenant_a).unwrap();
        let for_b = s.signals.iter().find(|x| x.tenant_id == tenant_b).unwrap();
        assert_eq!(for_a.trigger_value, dec!(150));
        assert_eq!(for_b.trigger_value, dec!(250));
    });
}

#[tokio::test]
async fn one_failing_rule_does_not_abort_the_cycle() {
    let fx = Fixture::new();
    fx.add_rule("gt", dec!(100), 1);
    fx.set_price(dec!(150));

    // Second rule against an asset whose reads fail.
    let broken_asset = Asset::new(fx.tenant, "ETH", "binance", 60).unwrap();
    let broken_metric = Metric::new(fx.tenant, broken_asset.id, "price", None).unwrap();
    fx.store
        .insert_asset(broken_asset.clone(), vec![broken_metric]);
    fx.store.insert_rule(
        Rule::new(
            fx.tenant,
            broken_asset.id,
            "price",
            "lt",
            dec!(10),
            Severity::Info,
            1,
            ChannelType::Slack,
            "#alerts",
        )
        .unwrap(),
    );
    fx.store
        .fail_latest_for
        .lock()
        .unwrap()
        .push(broken_asset.id);

    let report = fx.run().await;

    assert_eq!(report.errors, 1);
    assert_eq!(report.signals_created, 1);
    fx.store.snapshot(|s| assert_eq!(s.commits, 1));
}

#[tokio::test]
async fn commit_failure_rolls_back_signals_and_state() {
    let fx = Fixture::new();
    fx.add_rule("gt", dec!(100), 1);
    fx.set_price(dec!(150));
    fx.store.fail_commit.store(true, Ordering::SeqCst);

    let result = fx
        .cycle
        .run_cycle(&RuleFilter::default(), Utc::now(), &CancellationToken::new())
        .await;

    assert_matches!(result, Err(CycleError::Store(_)));
    fx.store.snapshot(|s| {
        assert!(s.signals.is_empty());
        assert!(s.notifications.is_empty());
        assert!(s.states.is_empty());
    });
}

#[tokio::test]
async fn unknown_operator_on_a_persisted_rule_never_fires() {
    let fx = Fixture::new();
    let mut rule = fx.add_rule("gt", dec!(100), 1);
    // Simulate a row written with an operator this build doesn't know.
    rule.operator = "between".into();
    {
        let mut state = fx.store.state.lock().unwrap();
        state.rules.clear();
        state.rules.push(rule.clone());
    }
    fx.set_price(dec!(150));

    let report = fx.run().await;

    assert_eq!(report.signals_created, 0);
    fx.store.snapshot(|s| {
        // Treated as a non-breach: state records a success.
        let state = s.states.get(&(fx.tenant, rule.id)).unwrap();
        assert_eq!(state.consecutive_breaches, 0);
        assert!(!state.breached);
    });
}

#[tokio::test]
async fn cancellation_before_commit_persists_nothing() {
    let fx = Fixture::new();
    fx.add_rule("gt", dec!(100), 1);
    fx.set_price(dec!(150));

    let cancel = CancellationToken::new();
    cancel.cancel();
    let result = fx
        .cycle
        .run_cycle(&RuleFilter::default(), Utc::now(), &cancel)
        .await;

    assert_matches!(result, Err(CycleError::Cancelled));
    fx.store.snapshot(|s| {
        assert!(s.signals.is_empty());
        assert_eq!(s.commits, 0);
    });
}
