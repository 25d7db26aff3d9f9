//! Notification delivery and the recipient-side inbox.
//!
//! Delivery is a side channel: the `notify_*` wrappers never fail the
//! caller. Use the `try_notify_*` forms when the error matters.

use aic_core::error::{AicError, AicResult};
use aic_core::models::notification::{Notification, NotificationDraft};
use aic_core::repository::{
    AccountRepository, NotificationRepository, PaginatedResult, Pagination, RoleRepository, Store,
};
use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::context::RequestContext;
use crate::error::AccessError;
use crate::service::AccessService;

impl<S: Store> AccessService<S> {
    /// Notify every active account holding the named role.
    ///
    /// An unknown role is not an error and yields zero recipients.
    pub async fn try_notify_role(&self, role_name: &str, draft: NotificationDraft) -> AicResult<u64> {
        let role = match self.store.roles().get_by_name(role_name).await {
            Ok(role) => role,
            Err(AicError::NotFound { .. }) => {
                debug!(role = role_name, "No such role, nothing to notify");
                return Ok(0);
            }
            Err(e) => return Err(e),
        };

        let recipients: Vec<Uuid> = self
            .store
            .accounts()
            .list_by_role(role.id, true)
            .await?
            .into_iter()
            .map(|a| a.id)
            .collect();

        let sent = self
            .store
            .notifications()
            .create_many(&recipients, draft)
            .await?;
        info!(role = role_name, sent, "Role notified");
        Ok(sent)
    }

    /// [`try_notify_role`](Self::try_notify_role), with failures logged
    /// and reported as zero deliveries.
    pub async fn notify_role(&self, role_name: &str, draft: NotificationDraft) -> u64 {
        match self.try_notify_role(role_name, draft).await {
            Ok(sent) => sent,
            Err(e) => {
                warn!(role = role_name, error = %e, "Role notification dropped");
                0
            }
        }
    }

    pub async fn try_notify_account(
        &self,
        account_id: Uuid,
        draft: NotificationDraft,
    ) -> AicResult<Notification> {
        self.store.accounts().get_by_id(account_id).await?;
        self.store.notifications().create(account_id, draft).await
    }

    /// [`try_notify_account`](Self::try_notify_account), with failures
    /// logged and reported as `None`.
    pub async fn notify_account(
        &self,
        account_id: Uuid,
        draft: NotificationDraft,
    ) -> Option<Notification> {
        match self.try_notify_account(account_id, draft).await {
            Ok(notification) => Some(notification),
            Err(e) => {
                warn!(%account_id, error = %e, "Account notification dropped");
                None
            }
        }
    }

    /// Newest first.
    pub async fn list_for_recipient(
        &self,
        account_id: Uuid,
        unread_only: bool,
        pagination: Pagination,
    ) -> AicResult<PaginatedResult<Notification>> {
        self.store
            .notifications()
            .list_for_recipient(account_id, unread_only, pagination)
            .await
    }

    pub async fn unread_count(&self, account_id: Uuid) -> AicResult<u64> {
        self.store.notifications().count_unread(account_id).await
    }

    /// Mark one of the caller's notifications as read. Marking an
    /// already-read notification keeps its original `read_at`.
    pub async fn mark_read(
        &self,
        ctx: &RequestContext,
        notification_id: Uuid,
    ) -> AicResult<Notification> {
        let caller = ctx.account_id.ok_or(AccessError::NoCaller)?;
        let notification = self.store.notifications().get_by_id(notification_id).await?;
        if notification.recipient_id != caller {
            return Err(AccessError::NotRecipient.into());
        }
        self.store
            .notifications()
            .mark_read(notification_id, Utc::now())
            .await
    }

    /// Returns the number of notifications that changed state.
    pub async fn mark_all_read(&self, ctx: &RequestContext) -> AicResult<u64> {
        let caller = ctx.account_id.ok_or(AccessError::NoCaller)?;
        self.store
            .notifications()
            .mark_all_read(caller, Utc::now())
            .await
    }
}
