//! Permission checks.
//!
//! An account can do exactly what its role grants. Missing accounts,
//! missing roles and inactive roles all resolve to "denied".

use std::collections::BTreeMap;

use aic_core::authz::{self, EffectivePermissions, Privilege};
use aic_core::error::{AicError, AicResult};
use aic_core::models::permission::{Action, Module, Permission, PermissionKey};
use aic_core::repository::{AccountRepository, PermissionRepository, RoleRepository, Store};
use tracing::warn;
use uuid::Uuid;

use crate::context::RequestContext;
use crate::error::AccessError;
use crate::service::AccessService;

/// One cell of the module × action grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatrixCell {
    pub action: Action,
    /// Catalog id, `None` for excluded or not-yet-seeded pairs.
    pub permission_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatrixRow {
    pub module: Module,
    pub cells: Vec<MatrixCell>,
}

impl<S: Store> AccessService<S> {
    /// Resolve an account's role and its permission keys.
    ///
    /// A dangling role reference is treated like no role.
    pub async fn effective_permissions(&self, account_id: Uuid) -> AicResult<EffectivePermissions> {
        let account = self.store.accounts().get_by_id(account_id).await?;
        let Some(role_id) = account.role_id else {
            return Ok(EffectivePermissions::none());
        };

        let role = match self.store.roles().get_by_id(role_id).await {
            Ok(role) => role,
            Err(AicError::NotFound { .. }) => return Ok(EffectivePermissions::none()),
            Err(e) => return Err(e),
        };
        if !role.is_active {
            return Ok(EffectivePermissions::from_role(&role, []));
        }

        let permissions = self.store.roles().get_permissions(role.id).await?;
        Ok(EffectivePermissions::from_role(
            &role,
            permissions.iter().map(Permission::key),
        ))
    }

    async fn caller_permissions(&self, ctx: &RequestContext) -> AicResult<EffectivePermissions> {
        let Some(account_id) = ctx.account_id else {
            return Ok(EffectivePermissions::none());
        };
        match self.effective_permissions(account_id).await {
            Err(AicError::NotFound { .. }) => Ok(EffectivePermissions::none()),
            other => other,
        }
    }

    /// Whether the caller may perform `action` in `module`.
    ///
    /// Never fails: storage errors are logged and resolve to `false`.
    pub async fn has_permission(&self, ctx: &RequestContext, module: Module, action: Action) -> bool {
        match self.caller_permissions(ctx).await {
            Ok(permissions) => permissions.allows(module, action),
            Err(e) => {
                warn!(
                    account_id = ?ctx.account_id,
                    %module,
                    %action,
                    error = %e,
                    "Permission lookup failed, denying"
                );
                false
            }
        }
    }

    /// Like [`has_permission`](Self::has_permission), but as a gate.
    pub async fn require_permission(
        &self,
        ctx: &RequestContext,
        module: Module,
        action: Action,
    ) -> AicResult<()> {
        if ctx.account_id.is_none() {
            return Err(AccessError::NoCaller.into());
        }
        if self.has_permission(ctx, module, action).await {
            Ok(())
        } else {
            Err(AccessError::PermissionDenied { module, action }.into())
        }
    }

    /// Caller privilege used to guard system roles.
    pub async fn privilege(&self, ctx: &RequestContext) -> Privilege {
        match self.caller_permissions(ctx).await {
            Ok(permissions) => permissions.privilege(),
            Err(e) => {
                warn!(account_id = ?ctx.account_id, error = %e, "Privilege lookup failed");
                Privilege::Standard
            }
        }
    }

    /// A role's grants grouped by module, actions sorted.
    pub async fn permissions_by_module(
        &self,
        role_id: Uuid,
    ) -> AicResult<BTreeMap<Module, Vec<Action>>> {
        let permissions = self.store.roles().get_permissions(role_id).await?;
        Ok(authz::group_by_module(
            permissions.iter().map(Permission::key),
        ))
    }

    /// Every module × action cell, with the catalog id where one exists.
    pub async fn permission_matrix(&self) -> AicResult<Vec<MatrixRow>> {
        let by_key: BTreeMap<_, _> = self
            .store
            .permissions()
            .list_all()
            .await?
            .into_iter()
            .map(|p| (p.key(), p.id))
            .collect();

        Ok(Module::ALL
            .into_iter()
            .map(|module| MatrixRow {
                module,
                cells: Action::ALL
                    .into_iter()
                    .map(|action| MatrixCell {
                        action,
                        permission_id: by_key
                            .get(&PermissionKey::new(module, action))
                            .copied(),
                    })
                    .collect(),
            })
            .collect())
    }
}
