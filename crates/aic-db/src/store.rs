//! [`Store`] backed by a single SurrealDB connection.

use aic_core::repository::Store;
use surrealdb::{Connection, Surreal};

use crate::repository::{
    SurrealAccountRepository, SurrealActivityRepository, SurrealNotificationRepository,
    SurrealPermissionRepository, SurrealRoleHistoryRepository, SurrealRoleRepository,
};

/// All repositories sharing one client handle.
pub struct SurrealStore<C: Connection> {
    permissions: SurrealPermissionRepository<C>,
    roles: SurrealRoleRepository<C>,
    accounts: SurrealAccountRepository<C>,
    role_history: SurrealRoleHistoryRepository<C>,
    notifications: SurrealNotificationRepository<C>,
    activities: SurrealActivityRepository<C>,
}

// Derived `Clone` would require `C: Clone`.
impl<C: Connection> Clone for SurrealStore<C> {
    fn clone(&self) -> Self {
        Self {
            permissions: self.permissions.clone(),
            roles: self.roles.clone(),
            accounts: self.accounts.clone(),
            role_history: self.role_history.clone(),
            notifications: self.notifications.clone(),
            activities: self.activities.clone(),
        }
    }
}

impl<C: Connection> SurrealStore<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self {
            permissions: SurrealPermissionRepository::new(db.clone()),
            roles: SurrealRoleRepository::new(db.clone()),
            accounts: SurrealAccountRepository::new(db.clone()),
            role_history: SurrealRoleHistoryRepository::new(db.clone()),
            notifications: SurrealNotificationRepository::new(db.clone()),
            activities: SurrealActivityRepository::new(db),
        }
    }
}

impl<C: Connection> Store for SurrealStore<C> {
    type Permissions = SurrealPermissionRepository<C>;
    type Roles = SurrealRoleRepository<C>;
    type Accounts = SurrealAccountRepository<C>;
    type RoleHistory = SurrealRoleHistoryRepository<C>;
    type Notifications = SurrealNotificationRepository<C>;
    type Activities = SurrealActivityRepository<C>;

    fn permissions(&self) -> &Self::Permissions {
        &self.permissions
    }

    fn roles(&self) -> &Self::Roles {
        &self.roles
    }

    fn accounts(&self) -> &Self::Accounts {
        &self.accounts
    }

    fn role_history(&self) -> &Self::RoleHistory {
        &self.role_history
    }

    fn notifications(&self) -> &Self::Notifications {
        &self.notifications
    }

    fn activities(&self) -> &Self::Activities {
        &self.activities
    }
}
