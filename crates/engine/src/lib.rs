//! The two cooperating engines of the sentra core: the ingestion
//! scheduler (pulls due assets from external data sources into
//! tenant-scoped time series) and the evaluation cycle (counts
//! consecutive threshold breaches per rule and emits signals).
//!
//! Both engines consume storage through the ports in [`ports`] and
//! never talk to a database or a delivery transport directly. All
//! writes of one cycle are staged on a [`ports::UnitOfWork`] and
//! flushed in a single commit.

pub mod evaluation;
pub mod gateway;
pub mod ingestion;
pub mod ports;
pub mod runner;

/// Errors that abort a whole engine cycle.
///
/// Per-item failures (one asset's fetch, one rule's evaluation) are
/// folded into the cycle report instead; only cancellation and storage
/// failures propagate.
#[derive(Debug, thiserror::Error)]
pub enum CycleError {
    #[error("cycle cancelled before commit")]
    Cancelled,

    #[error(transparent)]
    Store(#[from] ports::StoreError),
}
