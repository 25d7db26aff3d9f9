//! Retention sweep over notifications and the activity log.

use aic_core::error::AicResult;
use aic_core::models::notification::{NotificationCutoffs, NotificationPurgeCounts};
use aic_core::repository::{ActivityRepository, NotificationRepository, Store};
use chrono::{DateTime, Duration, Utc};
use tracing::info;

use crate::config::RetentionPolicy;
use crate::service::AccessService;

/// Per-category counts of one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeReport {
    pub notifications: NotificationPurgeCounts,
    pub activities: u64,
    /// Counts describe what would have been deleted.
    pub dry_run: bool,
}

impl PurgeReport {
    pub fn total(&self) -> u64 {
        self.notifications.total() + self.activities
    }
}

impl RetentionPolicy {
    pub fn notification_cutoffs(&self, now: DateTime<Utc>) -> NotificationCutoffs {
        NotificationCutoffs {
            read_before: now - Duration::days(i64::from(self.read_notification_days)),
            unread_before: now - Duration::days(i64::from(self.unread_notification_days)),
            expired_before: now,
        }
    }

    pub fn activity_cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::days(i64::from(self.activity_days))
    }
}

impl<S: Store> AccessService<S> {
    pub async fn purge_stale(&self, dry_run: bool) -> AicResult<PurgeReport> {
        self.purge_stale_at(Utc::now(), dry_run).await
    }

    /// Sweep relative to `now`. A notification is counted once, in the
    /// first matching category of read, unread, expired.
    pub async fn purge_stale_at(&self, now: DateTime<Utc>, dry_run: bool) -> AicResult<PurgeReport> {
        let policy = self.config.retention;
        let cutoffs = policy.notification_cutoffs(now);
        let activity_cutoff = policy.activity_cutoff(now);

        let report = if dry_run {
            PurgeReport {
                notifications: self.store.notifications().count_stale(cutoffs).await?,
                activities: self.store.activities().count_before(activity_cutoff).await?,
                dry_run,
            }
        } else {
            PurgeReport {
                notifications: self.store.notifications().delete_stale(cutoffs).await?,
                activities: self.store.activities().delete_before(activity_cutoff).await?,
                dry_run,
            }
        };

        info!(
            dry_run,
            read = report.notifications.read,
            unread = report.notifications.unread,
            expired = report.notifications.expired,
            activities = report.activities,
            "Retention sweep finished"
        );
        Ok(report)
    }
}
