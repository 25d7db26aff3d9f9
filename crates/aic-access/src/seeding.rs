//! Default permission catalog and roles.
//!
//! Both seeders are idempotent and safe to run on every deployment.

use std::collections::HashMap;

use aic_core::authz;
use aic_core::error::{AicError, AicResult};
use aic_core::models::permission::{Action, Module, Permission, PermissionKey};
use aic_core::models::role::{CreateRole, Role};
use aic_core::repository::{PermissionRepository, RoleRepository, Store};
use tracing::{info, warn};
use uuid::Uuid;

use crate::service::AccessService;

pub const SUPER_ADMINISTRATOR: &str = "Super Administrator";

/// Which catalog entries a default role receives.
#[derive(Debug, Clone, Copy)]
pub enum Grants {
    All,
    Only(&'static [(Module, &'static [Action])]),
}

impl Grants {
    pub fn keys(&self) -> Vec<PermissionKey> {
        match self {
            Grants::All => authz::catalog(),
            Grants::Only(grants) => grants
                .iter()
                .flat_map(|(module, actions)| {
                    actions
                        .iter()
                        .map(move |action| PermissionKey::new(*module, *action))
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DefaultRole {
    pub name: &'static str,
    pub description: &'static str,
    pub is_system_role: bool,
    pub grants: Grants,
}

pub const DEFAULT_ROLES: &[DefaultRole] = &[
    DefaultRole {
        name: SUPER_ADMINISTRATOR,
        description: "Full access to every module",
        is_system_role: true,
        grants: Grants::All,
    },
    DefaultRole {
        name: "Contract Manager",
        description: "Manages contracts and follows their launches",
        is_system_role: false,
        grants: Grants::Only(&[
            (
                Module::Contracts,
                &[Action::Create, Action::Read, Action::Update, Action::Assign],
            ),
            (Module::Launches, &[Action::Read, Action::Update]),
            (Module::Collaborators, &[Action::Read]),
            (Module::Reports, &[Action::Read, Action::Export]),
        ]),
    },
    DefaultRole {
        name: "Workshop Manager",
        description: "Runs a workshop and schedules its launches",
        is_system_role: false,
        grants: Grants::Only(&[
            (Module::Workshops, &[Action::Read, Action::Update]),
            (Module::Collaborators, &[Action::Read, Action::Assign]),
            (
                Module::Launches,
                &[Action::Create, Action::Read, Action::Update],
            ),
            (Module::Categories, &[Action::Read]),
            (Module::Reports, &[Action::Read, Action::Export]),
        ]),
    },
    DefaultRole {
        name: "Collaborator",
        description: "Read access to day-to-day production data",
        is_system_role: false,
        grants: Grants::Only(&[
            (Module::Collaborators, &[Action::Read]),
            (Module::Launches, &[Action::Read]),
            (Module::Workshops, &[Action::Read]),
            (Module::Categories, &[Action::Read]),
        ]),
    },
    DefaultRole {
        name: "Operator",
        description: "Records production launches on the shop floor",
        is_system_role: false,
        grants: Grants::Only(&[
            (
                Module::Launches,
                &[Action::Create, Action::Read, Action::Update],
            ),
            (Module::Collaborators, &[Action::Read]),
            (Module::Workshops, &[Action::Read]),
            (Module::Categories, &[Action::Read]),
            (Module::Contracts, &[Action::Read]),
        ]),
    },
];

/// Counts reported by [`AccessService::seed`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub permissions_created: usize,
    pub roles_created: usize,
}

impl<S: Store> AccessService<S> {
    /// Ensure every catalog pair exists. Returns only the permissions
    /// created by this call.
    pub async fn create_default_permissions(&self) -> AicResult<Vec<Permission>> {
        let mut created = Vec::new();
        for key in authz::catalog() {
            let (permission, is_new) = self.store.permissions().get_or_create(key.into()).await?;
            if is_new {
                created.push(permission);
            }
        }
        info!(created = created.len(), "Default permissions ensured");
        Ok(created)
    }

    /// Ensure every default role exists. Returns only the roles created
    /// by this call.
    ///
    /// Grants are applied to new roles and to existing roles with an
    /// empty permission set; a role with any grants is left untouched.
    pub async fn create_default_roles(&self) -> AicResult<Vec<Role>> {
        let catalog: HashMap<PermissionKey, Uuid> = self
            .store
            .permissions()
            .list_all()
            .await?
            .into_iter()
            .map(|p| (p.key(), p.id))
            .collect();

        let mut created = Vec::new();
        for default in DEFAULT_ROLES {
            let (role, is_new) = match self.store.roles().get_by_name(default.name).await {
                Ok(role) => (role, false),
                Err(AicError::NotFound { .. }) => {
                    let role = self
                        .store
                        .roles()
                        .create(CreateRole {
                            name: default.name.into(),
                            description: default.description.into(),
                            is_system_role: default.is_system_role,
                        })
                        .await?;
                    (role, true)
                }
                Err(e) => return Err(e),
            };

            if is_new || self.store.roles().count_permissions(role.id).await? == 0 {
                let mut ids = Vec::new();
                for key in default.grants.keys() {
                    match catalog.get(&key) {
                        Some(id) => ids.push(*id),
                        None => warn!(role = default.name, permission = %key, "Permission missing from catalog"),
                    }
                }
                self.store.roles().set_permissions(role.id, &ids).await?;
                info!(role = default.name, granted = ids.len(), "Default grants applied");
            }

            if is_new {
                created.push(role);
            }
        }
        Ok(created)
    }

    /// Seed the catalog, then the default roles.
    pub async fn seed(&self) -> AicResult<SeedReport> {
        let permissions = self.create_default_permissions().await?;
        let roles = self.create_default_roles().await?;
        Ok(SeedReport {
            permissions_created: permissions.len(),
            roles_created: roles.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn default_grants_are_valid_catalog_pairs() {
        for role in DEFAULT_ROLES {
            for key in role.grants.keys() {
                assert!(
                    authz::is_valid_permission(key.module, key.action),
                    "{} grants excluded pair {key}",
                    role.name
                );
            }
        }
    }

    #[test]
    fn default_role_names_are_distinct() {
        let names: HashSet<_> = DEFAULT_ROLES
            .iter()
            .map(|r| aic_core::models::role::role_name_key(r.name))
            .collect();
        assert_eq!(names.len(), DEFAULT_ROLES.len());
    }

    #[test]
    fn only_super_administrator_is_system() {
        let system: Vec<_> = DEFAULT_ROLES
            .iter()
            .filter(|r| r.is_system_role)
            .map(|r| r.name)
            .collect();
        assert_eq!(system, vec![SUPER_ADMINISTRATOR]);
    }

    #[test]
    fn operator_cannot_delete_launches() {
        let operator = DEFAULT_ROLES
            .iter()
            .find(|r| r.name == "Operator")
            .unwrap();
        let keys = operator.grants.keys();
        assert!(keys.contains(&PermissionKey::new(Module::Launches, Action::Update)));
        assert!(!keys.contains(&PermissionKey::new(Module::Launches, Action::Delete)));
    }
}
