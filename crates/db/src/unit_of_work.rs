//! Transactional unit of work: stages one cycle's writes in memory and
//! flushes them in a single Postgres transaction.

use async_trait::async_trait;
use sqlx::PgPool;

use sentra_core::asset::CursorAdvance;
use sentra_core::metric::NewMetricDataPoint;
use sentra_core::signal::{NewNotification, Signal, SignalState};
use sentra_engine::ports::{StoreError, UnitOfWork};

use crate::repositories::{AssetRepo, MetricDataRepo, NotificationRepo, SignalRepo, SignalStateRepo};

/// Staged writes for one engine cycle, flushed by [`commit`].
///
/// Dropping the struct without committing discards everything, which
/// is what keeps a cancelled cycle all-or-nothing.
///
/// [`commit`]: UnitOfWork::commit
pub struct PgUnitOfWork {
    pool: PgPool,
    points: Vec<NewMetricDataPoint>,
    cursors: Vec<CursorAdvance>,
    states: Vec<SignalState>,
    signals: Vec<Signal>,
    notifications: Vec<NewNotification>,
}

impl PgUnitOfWork {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            points: Vec::new(),
            cursors: Vec::new(),
            states: Vec::new(),
            signals: Vec::new(),
            notifications: Vec::new(),
        }
    }
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
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
        let mut tx = self.pool.begin().await.map_err(StoreError::new)?;

        MetricDataRepo::insert_batch(&mut tx, &self.points)
            .await
            .map_err(StoreError::new)?;
        for advance in &self.cursors {
            AssetRepo::update_cursor(&mut tx, advance)
                .await
                .map_err(StoreError::new)?;
        }
        for state in &self.states {
            SignalStateRepo::upsert(&mut tx, state)
                .await
                .map_err(StoreError::new)?;
        }
        for signal in &self.signals {
            SignalRepo::insert(&mut tx, signal)
                .await
                .map_err(StoreError::new)?;
        }
        for notification in &self.notifications {
            NotificationRepo::insert(&mut tx, notification)
                .await
                .map_err(StoreError::new)?;
        }

        tx.commit().await.map_err(StoreError::new)
    }
}
