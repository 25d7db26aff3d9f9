//! Role administration and permission-set replacement.

use aic_core::authz::Privilege;
use aic_core::error::{AicError, AicResult};
use aic_core::models::account::Account;
use aic_core::models::role::{CreateRole, Role, UpdateRole};
use aic_core::repository::{
    AccountRepository, PaginatedResult, Pagination, PermissionRepository, RoleRepository, Store,
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::AccessError;
use crate::service::AccessService;

fn guard_system_role(role: &Role, privilege: Privilege) -> Result<(), AccessError> {
    if role.is_system_role && privilege != Privilege::Elevated {
        return Err(AccessError::SystemRoleProtected {
            role: role.name.clone(),
        });
    }
    Ok(())
}

impl<S: Store> AccessService<S> {
    /// Replace a role's whole permission set.
    ///
    /// Ids that do not parse or do not name a catalog entry are dropped.
    /// System roles can only be edited with elevated privilege.
    pub async fn set_role_permissions(
        &self,
        role_id: Uuid,
        permission_ids: &[String],
        privilege: Privilege,
    ) -> AicResult<Role> {
        let role = self.store.roles().get_by_id(role_id).await?;
        guard_system_role(&role, privilege)?;

        let parsed: Vec<Uuid> = permission_ids
            .iter()
            .filter_map(|raw| Uuid::parse_str(raw.trim()).ok())
            .collect();
        let resolved = self.store.permissions().get_many(&parsed).await?;
        let ids: Vec<Uuid> = resolved.iter().map(|p| p.id).collect();

        if ids.len() != permission_ids.len() {
            debug!(
                %role_id,
                submitted = permission_ids.len(),
                kept = ids.len(),
                "Dropped unknown permission ids"
            );
        }

        self.store.roles().set_permissions(role_id, &ids).await?;
        info!(%role_id, role = %role.name, granted = ids.len(), "Role permissions replaced");

        self.store.roles().get_by_id(role_id).await
    }

    pub async fn create_role(&self, input: CreateRole, privilege: Privilege) -> AicResult<Role> {
        if input.name.trim().is_empty() {
            return Err(AicError::Validation {
                message: "role name must not be empty".into(),
            });
        }
        if input.is_system_role && privilege != Privilege::Elevated {
            return Err(AccessError::SystemRoleProtected { role: input.name }.into());
        }

        let role = self.store.roles().create(input).await?;
        info!(role_id = %role.id, role = %role.name, "Role created");
        Ok(role)
    }

    pub async fn update_role(
        &self,
        role_id: Uuid,
        input: UpdateRole,
        privilege: Privilege,
    ) -> AicResult<Role> {
        let role = self.store.roles().get_by_id(role_id).await?;
        guard_system_role(&role, privilege)?;

        if input.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(AicError::Validation {
                message: "role name must not be empty".into(),
            });
        }

        self.store.roles().update(role_id, input).await
    }

    /// Roles are never deleted; deactivation denies every permission to
    /// the accounts holding the role.
    pub async fn deactivate_role(&self, role_id: Uuid, privilege: Privilege) -> AicResult<Role> {
        let role = self
            .update_role(
                role_id,
                UpdateRole {
                    is_active: Some(false),
                    ..Default::default()
                },
                privilege,
            )
            .await?;
        info!(%role_id, role = %role.name, "Role deactivated");
        Ok(role)
    }

    pub async fn list_roles(&self, pagination: Pagination) -> AicResult<PaginatedResult<Role>> {
        self.store.roles().list(pagination).await
    }

    /// Every account pointing at the role, active or not.
    pub async fn accounts_with_role(&self, role_id: Uuid) -> AicResult<Vec<Account>> {
        self.store.roles().get_by_id(role_id).await?;
        self.store.accounts().list_by_role(role_id, false).await
    }
}
