//! Pure domain model and logic for the sentra monitoring core.
//!
//! No I/O lives here: entities are plain structs with validating
//! constructors, and the rule evaluator plus the breach-counter state
//! machine are pure functions over them. Callers (the engine crate)
//! are responsible for fetching and persisting everything.

pub mod asset;
pub mod error;
pub mod evaluate;
pub mod metric;
pub mod rule;
pub mod signal;
pub mod tenant;
pub mod types;
