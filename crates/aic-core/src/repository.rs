//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Multi-row mutations
//! ([`RoleRepository::set_permissions`], [`AccountRepository::change_role`],
//! [`NotificationRepository::create_many`]) are atomic.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::AicResult;
use crate::models::{
    account::{Account, CreateAccount, UpdateAccount},
    activity::{Activity, ActivityAction, ActivityModule, CreateActivity},
    notification::{
        Notification, NotificationCutoffs, NotificationDraft, NotificationPurgeCounts,
    },
    permission::{CreatePermission, Permission, PermissionKey},
    role::{CreateRole, Role, UpdateRole},
    role_history::{RoleChange, RoleHistory},
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

// ---------------------------------------------------------------------------
// Permission catalog
// ---------------------------------------------------------------------------

pub trait PermissionRepository: Send + Sync {
    /// Return the permission for `input`'s key, creating it if missing.
    /// The flag is `true` when the record was created by this call.
    fn get_or_create(
        &self,
        input: CreatePermission,
    ) -> impl Future<Output = AicResult<(Permission, bool)>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = AicResult<Permission>> + Send;
    fn get_by_key(
        &self,
        key: PermissionKey,
    ) -> impl Future<Output = AicResult<Permission>> + Send;
    /// Resolve ids against the catalog; unknown ids are omitted.
    fn get_many(&self, ids: &[Uuid]) -> impl Future<Output = AicResult<Vec<Permission>>> + Send;
    /// The whole catalog ordered by module then action.
    fn list_all(&self) -> impl Future<Output = AicResult<Vec<Permission>>> + Send;
}

// ---------------------------------------------------------------------------
// Roles
// ---------------------------------------------------------------------------

pub trait RoleRepository: Send + Sync {
    fn create(&self, input: CreateRole) -> impl Future<Output = AicResult<Role>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = AicResult<Role>> + Send;
    /// Case-insensitive lookup.
    fn get_by_name(&self, name: &str) -> impl Future<Output = AicResult<Role>> + Send;
    fn update(&self, id: Uuid, input: UpdateRole) -> impl Future<Output = AicResult<Role>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = AicResult<PaginatedResult<Role>>> + Send;

    /// Replace the role's whole permission set in one transaction.
    fn set_permissions(
        &self,
        role_id: Uuid,
        permission_ids: &[Uuid],
    ) -> impl Future<Output = AicResult<()>> + Send;

    /// All permissions granted to a role.
    fn get_permissions(
        &self,
        role_id: Uuid,
    ) -> impl Future<Output = AicResult<Vec<Permission>>> + Send;

    fn count_permissions(&self, role_id: Uuid) -> impl Future<Output = AicResult<u64>> + Send;
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

pub trait AccountRepository: Send + Sync {
    fn create(&self, input: CreateAccount) -> impl Future<Output = AicResult<Account>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = AicResult<Account>> + Send;
    fn get_by_username(&self, username: &str)
    -> impl Future<Output = AicResult<Account>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateAccount,
    ) -> impl Future<Output = AicResult<Account>> + Send;

    /// Accounts currently holding `role_id`, optionally only active ones.
    fn list_by_role(
        &self,
        role_id: Uuid,
        active_only: bool,
    ) -> impl Future<Output = AicResult<Vec<Account>>> + Send;

    /// Move the account's role pointer and append the matching history row
    /// in one transaction.
    fn change_role(&self, change: RoleChange) -> impl Future<Output = AicResult<Account>> + Send;
}

/// Read side of the role reassignment audit trail. Rows are only written
/// by [`AccountRepository::change_role`].
pub trait RoleHistoryRepository: Send + Sync {
    fn list_for_account(
        &self,
        account_id: Uuid,
    ) -> impl Future<Output = AicResult<Vec<RoleHistory>>> + Send;
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

pub trait NotificationRepository: Send + Sync {
    fn create(
        &self,
        recipient_id: Uuid,
        draft: NotificationDraft,
    ) -> impl Future<Output = AicResult<Notification>> + Send;

    /// One notification per recipient, written as a single statement batch.
    /// Returns the number of rows written.
    fn create_many(
        &self,
        recipient_ids: &[Uuid],
        draft: NotificationDraft,
    ) -> impl Future<Output = AicResult<u64>> + Send;

    fn get_by_id(&self, id: Uuid) -> impl Future<Output = AicResult<Notification>> + Send;

    fn list_for_recipient(
        &self,
        recipient_id: Uuid,
        unread_only: bool,
        pagination: Pagination,
    ) -> impl Future<Output = AicResult<PaginatedResult<Notification>>> + Send;

    fn count_unread(&self, recipient_id: Uuid) -> impl Future<Output = AicResult<u64>> + Send;

    /// Set `is_read` and `read_at` together. Already-read rows keep their
    /// original `read_at`.
    fn mark_read(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
    ) -> impl Future<Output = AicResult<Notification>> + Send;

    fn mark_all_read(
        &self,
        recipient_id: Uuid,
        at: DateTime<Utc>,
    ) -> impl Future<Output = AicResult<u64>> + Send;

    fn count_stale(
        &self,
        cutoffs: NotificationCutoffs,
    ) -> impl Future<Output = AicResult<NotificationPurgeCounts>> + Send;

    fn delete_stale(
        &self,
        cutoffs: NotificationCutoffs,
    ) -> impl Future<Output = AicResult<NotificationPurgeCounts>> + Send;
}

// ---------------------------------------------------------------------------
// Activity (append-only)
// ---------------------------------------------------------------------------

/// Query filters for activity entries.
#[derive(Debug, Clone, Default)]
pub struct ActivityFilter {
    pub actor_id: Option<Uuid>,
    pub action: Option<ActivityAction>,
    pub module: Option<ActivityModule>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

pub trait ActivityRepository: Send + Sync {
    /// Append a new entry. No update operation exists.
    fn append(&self, input: CreateActivity) -> impl Future<Output = AicResult<Activity>> + Send;
    fn list(
        &self,
        filter: ActivityFilter,
        pagination: Pagination,
    ) -> impl Future<Output = AicResult<PaginatedResult<Activity>>> + Send;
    fn count_before(&self, cutoff: DateTime<Utc>) -> impl Future<Output = AicResult<u64>> + Send;
    /// Retention only.
    fn delete_before(&self, cutoff: DateTime<Utc>)
    -> impl Future<Output = AicResult<u64>> + Send;
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Bundle of repositories backed by one storage connection.
///
/// Services are generic over a store so that the access layer has no
/// dependency on the database crate.
pub trait Store: Clone + Send + Sync {
    type Permissions: PermissionRepository;
    type Roles: RoleRepository;
    type Accounts: AccountRepository;
    type RoleHistory: RoleHistoryRepository;
    type Notifications: NotificationRepository;
    type Activities: ActivityRepository;

    fn permissions(&self) -> &Self::Permissions;
    fn roles(&self) -> &Self::Roles;
    fn accounts(&self) -> &Self::Accounts;
    fn role_history(&self) -> &Self::RoleHistory;
    fn notifications(&self) -> &Self::Notifications;
    fn activities(&self) -> &Self::Activities;
}
