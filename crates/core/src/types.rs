/// All entity ids are client-generated UUIDs (v7, time-ordered).
pub type EntityId = uuid::Uuid;

/// Tenants are identified by UUID; every persisted row carries one.
pub type TenantId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
