//! Row types mapping the Postgres schema onto the core domain model.

pub mod asset;
pub mod metric;
pub mod rule;
pub mod signal;
