//! Explicit tenant scoping for repository queries.
//!
//! There is no ambient "current tenant": every query that can be
//! tenant-scoped takes a [`TenantScope`] from the caller. System-level
//! batch jobs (the evaluation cycle runs across all tenants) pass
//! [`TenantScope::All`] explicitly rather than bypassing a filter.

use serde::{Deserialize, Serialize};

use crate::types::TenantId;

/// Which tenants a query should cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TenantScope {
    /// A single tenant's rows only.
    Tenant(TenantId),
    /// All tenants (system batch mode).
    All,
}

impl TenantScope {
    /// Returns `true` if a row owned by `tenant_id` falls inside this scope.
    pub fn includes(&self, tenant_id: TenantId) -> bool {
        match self {
            TenantScope::Tenant(t) => *t == tenant_id,
            TenantScope::All => true,
        }
    }

    /// The single tenant id, if this scope is tenant-bound.
    pub fn tenant_id(&self) -> Option<TenantId> {
        match self {
            TenantScope::Tenant(t) => Some(*t),
            TenantScope::All => None,
        }
    }
}
