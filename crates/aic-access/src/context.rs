//! Per-request caller information.

use uuid::Uuid;

/// Who is acting, and from where.
///
/// Passed explicitly to every operation that needs the caller or wants
/// to stamp an activity entry.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub account_id: Option<Uuid>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl RequestContext {
    /// Context for maintenance jobs and seeding: no caller.
    pub fn system() -> Self {
        Self::default()
    }

    pub fn for_account(account_id: Uuid) -> Self {
        Self {
            account_id: Some(account_id),
            ..Self::default()
        }
    }

    pub fn with_client(mut self, ip_address: impl Into<String>, user_agent: impl Into<String>) -> Self {
        self.ip_address = Some(ip_address.into());
        self.user_agent = Some(user_agent.into());
        self
    }
}
