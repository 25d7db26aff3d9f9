//! Permission catalog and the pure permission predicate.
//!
//! The catalog is the module × action product minus the pairs that have
//! no business meaning. Evaluation is deny-by-default: no role, an
//! inactive role, or a missing pair all resolve to `false`.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::models::permission::{Action, Module, PermissionKey};
use crate::models::role::Role;

/// Module/action pairs excluded from the catalog.
pub const EXCLUDED_PAIRS: [PermissionKey; 3] = [
    PermissionKey::new(Module::Administration, Action::Assign),
    PermissionKey::new(Module::Reports, Action::Assign),
    PermissionKey::new(Module::Reports, Action::Delete),
];

pub fn is_valid_permission(module: Module, action: Action) -> bool {
    !EXCLUDED_PAIRS.contains(&PermissionKey::new(module, action))
}

/// Every grantable permission key, in module-then-action order.
pub fn catalog() -> Vec<PermissionKey> {
    Module::ALL
        .into_iter()
        .flat_map(|module| {
            Action::ALL
                .into_iter()
                .filter(move |action| is_valid_permission(module, *action))
                .map(move |action| PermissionKey::new(module, action))
        })
        .collect()
}

/// Caller privilege level used to protect system roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Privilege {
    Standard,
    Elevated,
}

/// What an account may do, as resolved from its role.
#[derive(Debug, Clone, Default)]
pub struct EffectivePermissions {
    role: Option<RoleState>,
    keys: HashSet<PermissionKey>,
}

#[derive(Debug, Clone)]
struct RoleState {
    is_active: bool,
    is_system_role: bool,
}

impl EffectivePermissions {
    /// Permissions of an account with no role.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn from_role(role: &Role, keys: impl IntoIterator<Item = PermissionKey>) -> Self {
        Self {
            role: Some(RoleState {
                is_active: role.is_active,
                is_system_role: role.is_system_role,
            }),
            keys: keys.into_iter().collect(),
        }
    }

    /// Exact-pair check. No wildcard, hierarchy or inheritance.
    pub fn allows(&self, module: Module, action: Action) -> bool {
        match &self.role {
            Some(role) if role.is_active => {
                self.keys.contains(&PermissionKey::new(module, action))
            }
            _ => false,
        }
    }

    /// Elevated iff the role is an active system role that can administer.
    pub fn privilege(&self) -> Privilege {
        match &self.role {
            Some(role)
                if role.is_system_role
                    && self.allows(Module::Administration, Action::Update) =>
            {
                Privilege::Elevated
            }
            _ => Privilege::Standard,
        }
    }

    /// Granted keys; empty when the role is missing or inactive.
    pub fn granted(&self) -> BTreeSet<PermissionKey> {
        match &self.role {
            Some(role) if role.is_active => self.keys.iter().copied().collect(),
            _ => BTreeSet::new(),
        }
    }
}

/// Group keys by module with sorted actions.
pub fn group_by_module(
    keys: impl IntoIterator<Item = PermissionKey>,
) -> BTreeMap<Module, Vec<Action>> {
    let mut grouped: BTreeMap<Module, BTreeSet<Action>> = BTreeMap::new();
    for key in keys {
        grouped.entry(key.module).or_default().insert(key.action);
    }
    grouped
        .into_iter()
        .map(|(module, actions)| (module, actions.into_iter().collect()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn role(is_active: bool, is_system_role: bool) -> Role {
        Role {
            id: Uuid::new_v4(),
            name: "r".into(),
            description: String::new(),
            is_active,
            is_system_role,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn catalog_skips_excluded_pairs() {
        let keys = catalog();
        assert_eq!(keys.len(), Module::ALL.len() * Action::ALL.len() - 3);
        for excluded in EXCLUDED_PAIRS {
            assert!(!keys.contains(&excluded));
        }
        assert!(keys.contains(&PermissionKey::new(Module::Reports, Action::Export)));
    }

    #[test]
    fn catalog_has_no_duplicates() {
        let keys = catalog();
        let unique: HashSet<_> = keys.iter().collect();
        assert_eq!(unique.len(), keys.len());
    }

    #[test]
    fn no_role_denies_everything() {
        let perms = EffectivePermissions::none();
        for key in catalog() {
            assert!(!perms.allows(key.module, key.action));
        }
        assert_eq!(perms.privilege(), Privilege::Standard);
    }

    #[test]
    fn inactive_role_denies_everything() {
        let perms = EffectivePermissions::from_role(&role(false, true), catalog());
        for key in catalog() {
            assert!(!perms.allows(key.module, key.action));
        }
        assert!(perms.granted().is_empty());
        assert_eq!(perms.privilege(), Privilege::Standard);
    }

    #[test]
    fn exact_pair_only() {
        let perms = EffectivePermissions::from_role(
            &role(true, false),
            [PermissionKey::new(Module::Launches, Action::Read)],
        );
        assert!(perms.allows(Module::Launches, Action::Read));
        assert!(!perms.allows(Module::Launches, Action::Update));
        assert!(!perms.allows(Module::Workshops, Action::Read));
    }

    #[test]
    fn elevated_requires_system_role_with_administration() {
        let admin = EffectivePermissions::from_role(&role(true, true), catalog());
        assert_eq!(admin.privilege(), Privilege::Elevated);

        let non_system = EffectivePermissions::from_role(&role(true, false), catalog());
        assert_eq!(non_system.privilege(), Privilege::Standard);

        let system_without_admin = EffectivePermissions::from_role(
            &role(true, true),
            [PermissionKey::new(Module::Launches, Action::Read)],
        );
        assert_eq!(system_without_admin.privilege(), Privilege::Standard);
    }

    #[test]
    fn grouping_sorts_actions() {
        let grouped = group_by_module([
            PermissionKey::new(Module::Launches, Action::Update),
            PermissionKey::new(Module::Launches, Action::Create),
            PermissionKey::new(Module::Reports, Action::Read),
        ]);
        assert_eq!(
            grouped.get(&Module::Launches),
            Some(&vec![Action::Create, Action::Update])
        );
        assert_eq!(grouped.get(&Module::Reports), Some(&vec![Action::Read]));
    }
}
