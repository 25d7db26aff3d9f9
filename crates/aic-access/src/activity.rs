//! Activity log recording.

use aic_core::error::AicResult;
use aic_core::models::activity::{
    Activity, ActivityAction, ActivityModule, CreateActivity, Snapshot,
};
use aic_core::models::notification::{NotificationDraft, NotificationKind};
use aic_core::models::permission::Module;
use aic_core::models::subject::SubjectRef;
use aic_core::repository::{
    AccountRepository, ActivityFilter, ActivityRepository, PaginatedResult, Pagination, Store,
};
use tracing::{debug, warn};

use crate::context::RequestContext;
use crate::service::AccessService;

/// What happened, independent of who did it.
#[derive(Debug, Clone)]
pub struct ActivityEntry {
    pub action: ActivityAction,
    pub module: ActivityModule,
    pub description: String,
    pub subject: Option<SubjectRef>,
    pub before: Option<Snapshot>,
    pub after: Option<Snapshot>,
}

impl ActivityEntry {
    pub fn new(
        action: ActivityAction,
        module: impl Into<ActivityModule>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            action,
            module: module.into(),
            description: description.into(),
            subject: None,
            before: None,
            after: None,
        }
    }

    pub fn with_subject(mut self, subject: SubjectRef) -> Self {
        self.subject = Some(subject);
        self
    }

    /// Attach before/after field snapshots.
    pub fn with_changes(mut self, before: Option<Snapshot>, after: Option<Snapshot>) -> Self {
        self.before = before;
        self.after = after;
        self
    }

    fn into_create(self, ctx: &RequestContext) -> CreateActivity {
        CreateActivity {
            actor_id: ctx.account_id,
            action: self.action,
            module: self.module,
            description: self.description,
            subject: self.subject,
            before: self.before,
            after: self.after,
            ip_address: ctx.ip_address.clone(),
            user_agent: ctx.user_agent.clone(),
        }
    }
}

/// Modules whose exports are reported to administrators.
const SENSITIVE_EXPORTS: [Module; 2] = [Module::Collaborators, Module::Reports];

const SYSTEM_ACTOR: &str = "System";

impl<S: Store> AccessService<S> {
    /// Append an entry stamped with the caller, IP address and user agent.
    pub async fn record(&self, ctx: &RequestContext, entry: ActivityEntry) -> AicResult<Activity> {
        self.store.activities().append(entry.into_create(ctx)).await
    }

    /// Like [`record`](Self::record), logging and discarding failures.
    pub async fn record_best_effort(
        &self,
        ctx: &RequestContext,
        entry: ActivityEntry,
    ) -> Option<Activity> {
        let action = entry.action;
        let module = entry.module;
        match self.record(ctx, entry).await {
            Ok(activity) => Some(activity),
            Err(e) => {
                warn!(
                    account_id = ?ctx.account_id,
                    %action,
                    %module,
                    error = %e,
                    "Failed to record activity"
                );
                None
            }
        }
    }

    /// Record an export. Exports of collaborator data and reports also
    /// alert the administrator role.
    pub async fn log_export(
        &self,
        ctx: &RequestContext,
        module: Module,
        description: impl Into<String>,
    ) -> Option<Activity> {
        let description = description.into();
        let activity = self
            .record_best_effort(
                ctx,
                ActivityEntry::new(ActivityAction::Export, module, description.clone()),
            )
            .await;

        if SENSITIVE_EXPORTS.contains(&module) {
            let actor = self.actor_name(ctx).await;
            let draft = NotificationDraft::new(
                NotificationKind::Info,
                "Data export performed",
                format!("{actor} exported data from {}: {description}", module.label()),
            );
            self.notify_role(&self.config.admin_role_name, draft).await;
        }

        activity
    }

    /// Record an import. Every import alerts the administrator role.
    pub async fn log_import(
        &self,
        ctx: &RequestContext,
        module: Module,
        description: impl Into<String>,
    ) -> Option<Activity> {
        let description = description.into();
        let activity = self
            .record_best_effort(
                ctx,
                ActivityEntry::new(ActivityAction::Import, module, description.clone()),
            )
            .await;

        let actor = self.actor_name(ctx).await;
        let draft = NotificationDraft::new(
            NotificationKind::Warning,
            "Data import performed",
            format!("{actor} imported data into {}: {description}", module.label()),
        );
        self.notify_role(&self.config.admin_role_name, draft).await;

        activity
    }

    /// Display name of the caller, or "System" when there is none.
    async fn actor_name(&self, ctx: &RequestContext) -> String {
        let Some(account_id) = ctx.account_id else {
            return SYSTEM_ACTOR.to_string();
        };
        match self.store.accounts().get_by_id(account_id).await {
            Ok(account) => account.full_name(),
            Err(e) => {
                debug!(%account_id, error = %e, "Actor lookup failed");
                SYSTEM_ACTOR.to_string()
            }
        }
    }

    /// Newest first.
    pub async fn list_activities(
        &self,
        filter: ActivityFilter,
        pagination: Pagination,
    ) -> AicResult<PaginatedResult<Activity>> {
        self.store.activities().list(filter, pagination).await
    }
}
