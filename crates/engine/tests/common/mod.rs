//! In-memory fakes for the engine's storage and gateway ports.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;

use sentra_core::asset::{Asset, CursorAdvance};
use sentra_core::metric::{Metric, MetricDataPoint, NewMetricDataPoint};
use sentra_core::rule::Rule;
use sentra_core::signal::{NewNotification, Signal, SignalState};
use sentra_core::types::{EntityId, TenantId, Timestamp};
use sentra_engine::gateway::{DataSourceGateway, FetchResult, GatewayError};
use sentra_engine::ports::{
    AssetRepository, DueAsset, MetricDataRepository, RuleFilter, RuleRepository,
    SignalStateRepository, StoreError, UnitOfWork, UnitOfWorkProvider,
};

/// Shared backing state for the fake store.
#[derive(Default)]
pub struct MemState {
    pub assets: Vec<Asset>,
    pub metrics: Vec<Metric>,
    pub points: Vec<MetricDataPoint>,
    pub rules: Vec<Rule>,
    pub states: HashMap<(TenantId, EntityId), SignalState>,
    pub signals: Vec<Signal>,
    pub notifications: Vec<NewNotification>,
    pub commits: usize,
}

/// In-memory implementation of every storage port.
#[derive(Default)]
pub struct MemStore {
    pub state: Arc<Mutex<MemState>>,
    pub fail_commit: AtomicBool,
    /// Asset ids whose latest-point reads should fail (per-rule error
    /// isolation tests).
    pub fail_latest_for: Mutex<Vec<EntityId>>,
}

impl MemStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn insert_asset(&self, asset: Asset, metrics: Vec<Metric>) {
        let mut state = self.state.lock().unwrap();
        state.assets.push(asset);
        state.metrics.extend(metrics);
    }

    pub fn insert_rule(&self, rule: Rule) {
        self.state.lock().unwrap().rules.push(rule);
    }

    /// Replace the series for a metric with a single latest point.
    pub fn set_latest(&self, tenant_id: TenantId, metric_id: EntityId, value: rust_decimal::Decimal) {
        let mut state = self.state.lock().unwrap();
        state.points.retain(|p| p.metric_id != metric_id);
        state.points.push(MetricDataPoint {
            tenant_id,
            metric_id,
            value,
            timestamp: Utc::now(),
            inserted_at: Utc::now(),
        });
    }

    pub fn snapshot<T>(&self, f: impl FnOnce(&MemState) -> T) -> T {
        f(&self.state.lock().unwrap())
    }
}

#[async_trait]
impl AssetRepository for MemStore {
    async fn get_due_for_ingestion(&self, now: Timestamp) -> Result<Vec<DueAsset>, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .assets
            .iter()
            .filter(|a| a.active && a.is_due(now))
            .map(|a| DueAsset {
                asset: a.clone(),
                metrics: state
                    .metrics
                    .iter()
                    .filter(|m| m.asset_id == a.id && m.active)
                    .cloned()
                    .collect(),
            })
            .collect())
    }
}

#[async_trait]
impl MetricDataRepository for MemStore {
    async fn get_latest_by_asset_and_name(
        &self,
        asset_id: EntityId,
        metric_name: &str,
    ) -> Result<Option<MetricDataPoint>, StoreError> {
        if self.fail_latest_for.lock().unwrap().contains(&asset_id) {
            return Err(StoreError::message("injected read failure"));
        }
        let state = self.state.lock().unwrap();
        let metric = state
            .metrics
            .iter()
            .find(|m| m.asset_id == asset_id && m.matches_name(metric_name));
        let Some(metric) = metric else {
            return Ok(None);
        };
        Ok(state
            .points
            .iter()
            .filter(|p| p.metric_id == metric.id)
            .max_by_key(|p| p.timestamp)
            .cloned())
    }
}

#[async_trait]
impl RuleRepository for MemStore {
    async fn get_active(&self, filter: &RuleFilter) -> Result<Vec<Rule>, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .rules
            .iter()
            .filter(|r| r.active && filter.scope.includes(r.tenant_id))
            .filter(|r| match &filter.frequency {
                Some(f) => r.frequency.as_deref() == Some(f.as_str()),
                None => true,
            })
            .cloned()
            .collect())
    }
}

#[async_trait]
impl SignalStateRepository for MemStore {
    async fn get(
        &self,
        tenant_id: TenantId,
        rule_id: EntityId,
    ) -> Result<Option<SignalState>, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state.states.get(&(tenant_id, rule_id)).cloned())
    }
}

impl UnitOfWorkProvider for MemStore {
    fn begin(&self) -> Box<dyn UnitOfWork> {
        Box::new(MemUnitOfWork {
            state: Arc::clone(&self.state),
            fail: self.fail_commit.load(Ordering::SeqCst),
            points: Vec::new(),
            cursors: Vec::new(),
            states: Vec::new(),
            signals: Vec::new(),
            notifications: Vec::new(),
        })
    }
}

struct MemUnitOfWork {
    state: Arc<Mutex<MemState>>,
    fail: bool,
    points: Vec<NewMetricDataPoint>,
    cursors: Vec<CursorAdvance>,
    states: Vec<SignalState>,
    signals: Vec<Signal>,
    notifications: Vec<NewNotification>,
}

#[async_trait]
impl UnitOfWork for MemUnitOfWork {
    fn add_points(&mut self, points: Vec<NewMetricDataPoint>) {
        self.points.extend(points);
    }

    fn update_cursor(&mut self, advance: CursorAdvance) {
        self.cursors.push(advance);
    }

    fn put_signal_state(&mut self, state: SignalState) {
        self.states.push(state);
    }

    fn add_signal(&mut self, signal: Signal) {
        self.signals.push(signal);
    }

    fn add_notification(&mut self, notification: NewNotification) {
        self.notifications.push(notification);
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        if self.fail {
            return Err(StoreError::message("injected commit failure"));
        }
        let mut state = self.state.lock().unwrap();
        let now = Utc::now();

        for p in self.points {
            state.points.push(MetricDataPoint {
                tenant_id: p.tenant_id,
                metric_id: p.metric_id,
                value: p.value,
                timestamp: p.timestamp,
                inserted_at: now,
            });
        }
        for c in self.cursors {
            if let Some(asset) = state.assets.iter_mut().find(|a| a.id == c.asset_id) {
                asset.last_ingested_at = Some(c.last_ingested_at);
                asset.next_ingested_at = Some(c.next_ingested_at);
            }
        }
        for s in self.states {
            state.states.insert((s.tenant_id, s.rule_id), s);
        }
        state.signals.extend(self.signals);
        state.notifications.extend(self.notifications);
        state.commits += 1;
        Ok(())
    }
}

/// Gateway fake returning a fixed per-identifier result map.
#[derive(Default)]
pub struct ScriptedGateway {
    pub results: Mutex<HashMap<String, FetchResult>>,
    pub calls: AtomicUsize,
    pub transport_error: AtomicBool,
}

impl ScriptedGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_result(&self, identifier: &str, result: FetchResult) {
        self.results
            .lock()
            .unwrap()
            .insert(identifier.to_string(), result);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DataSourceGateway for ScriptedGateway {
    async fn fetch_batch(
        &self,
        identifiers: &[String],
    ) -> Result<HashMap<String, FetchResult>, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.transport_error.load(Ordering::SeqCst) {
            return Err(GatewayError::Transport("injected transport failure".into()));
        }
        let results = self.results.lock().unwrap();
        Ok(identifiers
            .iter()
            .filter_map(|id| results.get(id).map(|r| (id.clone(), r.clone())))
            .collect())
    }
}
