//! Account creation and role reassignment.

use aic_core::error::{AicError, AicResult};
use aic_core::models::account::{Account, CreateAccount};
use aic_core::models::activity::{ActivityAction, Snapshot};
use aic_core::models::notification::{NotificationDraft, NotificationKind};
use aic_core::models::permission::Module;
use aic_core::models::role::Role;
use aic_core::models::role_history::RoleChange;
use aic_core::models::subject::{EntityKind, SubjectRef};
use aic_core::repository::{AccountRepository, RoleRepository, Store};
use tracing::{debug, info};
use uuid::Uuid;

use crate::activity::ActivityEntry;
use crate::context::RequestContext;
use crate::service::AccessService;

fn role_label(role: Option<&Role>) -> String {
    role.map(|r| r.name.clone())
        .unwrap_or_else(|| "no role".into())
}

fn role_snapshot(label: &str) -> Snapshot {
    let mut snapshot = Snapshot::new();
    snapshot.insert("role".into(), serde_json::Value::from(label));
    snapshot
}

impl<S: Store> AccessService<S> {
    /// Create an account. The password is hashed before storage.
    pub async fn create_account(
        &self,
        ctx: &RequestContext,
        input: CreateAccount,
    ) -> AicResult<Account> {
        if input.username.trim().is_empty() {
            return Err(AicError::Validation {
                message: "username must not be empty".into(),
            });
        }
        if let Some(role_id) = input.role_id {
            self.store.roles().get_by_id(role_id).await?;
        }

        let account = self.store.accounts().create(input).await?;
        info!(account_id = %account.id, username = %account.username, "Account created");

        self.record_best_effort(
            ctx,
            ActivityEntry::new(
                ActivityAction::Create,
                Module::Collaborators,
                format!("Created collaborator {}", account.full_name()),
            )
            .with_subject(SubjectRef::new(EntityKind::Account, account.id)),
        )
        .await;

        Ok(account)
    }

    /// Point an account at a new role (or none).
    ///
    /// Assigning the role the account already holds changes nothing and
    /// writes no history. Otherwise the pointer and the history row are
    /// written together; the activity entry and the notification that
    /// follow are best-effort.
    pub async fn assign_role(
        &self,
        ctx: &RequestContext,
        account_id: Uuid,
        new_role_id: Option<Uuid>,
        reason: &str,
    ) -> AicResult<Account> {
        let account = self.store.accounts().get_by_id(account_id).await?;
        let new_role = match new_role_id {
            Some(role_id) => Some(self.store.roles().get_by_id(role_id).await?),
            None => None,
        };

        if account.role_id == new_role_id {
            debug!(%account_id, "Role unchanged, nothing to record");
            return Ok(account);
        }

        let old_role = match account.role_id {
            Some(role_id) => match self.store.roles().get_by_id(role_id).await {
                Ok(role) => Some(role),
                Err(AicError::NotFound { .. }) => None,
                Err(e) => return Err(e),
            },
            None => None,
        };

        let updated = self
            .store
            .accounts()
            .change_role(RoleChange {
                account_id,
                old_role_id: account.role_id,
                new_role_id,
                changed_by: ctx.account_id,
                reason: reason.to_string(),
            })
            .await?;

        let before = role_label(old_role.as_ref());
        let after = role_label(new_role.as_ref());
        info!(
            %account_id,
            old_role = %before,
            new_role = %after,
            changed_by = ?ctx.account_id,
            "Role reassigned"
        );

        let subject = SubjectRef::new(EntityKind::Account, account_id);
        self.record_best_effort(
            ctx,
            ActivityEntry::new(
                ActivityAction::Assign,
                Module::Administration,
                format!(
                    "Role of {} changed from {before} to {after}",
                    updated.full_name()
                ),
            )
            .with_subject(subject)
            .with_changes(Some(role_snapshot(&before)), Some(role_snapshot(&after))),
        )
        .await;

        if let Some(role) = new_role.filter(|_| self.config.role_change_notifications) {
            let draft = NotificationDraft::new(
                NotificationKind::Info,
                "Role updated",
                format!("Your role is now {}.", role.name),
            )
            .with_subject(subject);
            self.notify_account(account_id, draft).await;
        }

        Ok(updated)
    }
}
