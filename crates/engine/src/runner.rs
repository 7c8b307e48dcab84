//! Periodic drivers for the two engines.
//!
//! Each engine runs as an independent cron-like loop:
//! `tokio::time::interval` inside `tokio::select!` with a
//! `CancellationToken` for shutdown. A cycle is awaited inside the tick
//! arm, so cycles of the same engine can never overlap; backed-up ticks
//! are delayed rather than burst.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::evaluation::EvaluationCycle;
use crate::ingestion::IngestionScheduler;
use crate::ports::RuleFilter;
use crate::CycleError;

/// Run the ingestion scheduler on a fixed interval until cancelled.
pub async fn run_ingestion_loop(
    scheduler: Arc<IngestionScheduler>,
    interval: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tracing::info!(interval_secs = interval.as_secs(), "Ingestion loop started");

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Ingestion loop shutting down");
                break;
            }
            _ = ticker.tick() => {
                match scheduler.run_cycle(Utc::now(), &cancel).await {
                    Ok(_) => {}
                    Err(CycleError::Cancelled) => {
                        tracing::info!("Ingestion cycle cancelled mid-flight, nothing committed");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Ingestion cycle failed");
                    }
                }
            }
        }
    }
}

/// Run the evaluation cycle on a fixed interval until cancelled.
pub async fn run_evaluation_loop(
    cycle: Arc<EvaluationCycle>,
    filter: RuleFilter,
    interval: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tracing::info!(interval_secs = interval.as_secs(), "Evaluation loop started");

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Evaluation loop shutting down");
                break;
            }
            _ = ticker.tick() => {
                match cycle.run_cycle(&filter, Utc::now(), &cancel).await {
                    Ok(_) => {}
                    Err(CycleError::Cancelled) => {
                        tracing::info!("Evaluation cycle cancelled mid-flight, nothing committed");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Evaluation cycle failed");
                    }
                }
            }
        }
    }
}
