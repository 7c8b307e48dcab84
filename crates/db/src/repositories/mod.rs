//! Repository layer: one static struct per table. Reads take a pool;
//! cycle writes take the open transaction so the unit of work controls
//! the commit point.

mod asset_repo;
mod metric_data_repo;
mod notification_repo;
mod rule_repo;
mod signal_repo;
mod signal_state_repo;

pub use asset_repo::AssetRepo;
pub use metric_data_repo::MetricDataRepo;
pub use notification_repo::NotificationRepo;
pub use rule_repo::RuleRepo;
pub use signal_repo::SignalRepo;
pub use signal_state_repo::SignalStateRepo;
