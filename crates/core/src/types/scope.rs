//! Tenancy scopes.
//!
//! Every aggregate is exclusively owned by a (user, store) or
//! (user, project) pair. Scopes are carried explicitly through repositories
//! and subscription handles so a stale-scope update can be detected instead
//! of silently written into another tenant's state.

use serde::{Deserialize, Serialize};

use super::key::{ProjectId, StoreId, UserId};

/// Owner scope for commerce aggregates (cart, orders).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoreScope {
    pub user_id: UserId,
    pub store_id: StoreId,
}

impl StoreScope {
    /// Create a new store scope.
    pub fn new(user_id: impl Into<UserId>, store_id: impl Into<StoreId>) -> Self {
        Self {
            user_id: user_id.into(),
            store_id: store_id.into(),
        }
    }
}

impl std::fmt::Display for StoreScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.user_id, self.store_id)
    }
}

/// Owner scope for finance aggregates (expense records).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectScope {
    pub user_id: UserId,
    pub project_id: ProjectId,
}

impl ProjectScope {
    /// Create a new project scope.
    pub fn new(user_id: impl Into<UserId>, project_id: impl Into<ProjectId>) -> Self {
        Self {
            user_id: user_id.into(),
            project_id: project_id.into(),
        }
    }
}

impl std::fmt::Display for ProjectScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.user_id, self.project_id)
    }
}
