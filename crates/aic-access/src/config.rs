//! Access-control configuration.

/// Retention windows applied by the purge sweep, in days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Read notifications are dropped this long after being read
    /// (default: 30).
    pub read_notification_days: u32,
    /// Unread notifications are dropped this long after creation
    /// (default: 90).
    pub unread_notification_days: u32,
    /// Activity entries are dropped this long after creation
    /// (default: 180).
    pub activity_days: u32,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            read_notification_days: 30,
            unread_notification_days: 90,
            activity_days: 180,
        }
    }
}

/// Configuration for the access service.
#[derive(Debug, Clone)]
pub struct AccessConfig {
    pub retention: RetentionPolicy,
    /// Role whose holders receive administrative notifications such as
    /// export alerts.
    pub admin_role_name: String,
    /// Notify an account when its role changes (default: true).
    pub role_change_notifications: bool,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            retention: RetentionPolicy::default(),
            admin_role_name: crate::seeding::SUPER_ADMINISTRATOR.into(),
            role_change_notifications: true,
        }
    }
}
