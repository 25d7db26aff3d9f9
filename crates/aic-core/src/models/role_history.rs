//! Role reassignment audit trail.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One account → role reassignment. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleHistory {
    pub id: Uuid,
    pub account_id: Uuid,
    pub old_role_id: Option<Uuid>,
    pub new_role_id: Option<Uuid>,
    pub changed_by: Option<Uuid>,
    pub reason: String,
    pub changed_at: DateTime<Utc>,
}

/// A role pointer change together with the history row it produces.
#[derive(Debug, Clone)]
pub struct RoleChange {
    pub account_id: Uuid,
    pub old_role_id: Option<Uuid>,
    pub new_role_id: Option<Uuid>,
    pub changed_by: Option<Uuid>,
    pub reason: String,
}
