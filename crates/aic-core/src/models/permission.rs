//! Permission domain model.
//!
//! A permission is identified by its `(module, action)` pair. The display
//! `name` is derived from that pair and carries no identity.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AicError;

/// Functional area of the application, the first half of a permission key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Module {
    Collaborators,
    Workshops,
    Categories,
    Contracts,
    Launches,
    Reports,
    Administration,
}

impl Module {
    pub const ALL: [Module; 7] = [
        Module::Collaborators,
        Module::Workshops,
        Module::Categories,
        Module::Contracts,
        Module::Launches,
        Module::Reports,
        Module::Administration,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Module::Collaborators => "collaborators",
            Module::Workshops => "workshops",
            Module::Categories => "categories",
            Module::Contracts => "contracts",
            Module::Launches => "launches",
            Module::Reports => "reports",
            Module::Administration => "administration",
        }
    }

    /// Human-readable label used by matrices and listings.
    pub fn label(&self) -> &'static str {
        match self {
            Module::Collaborators => "Collaborators",
            Module::Workshops => "Workshops",
            Module::Categories => "Categories",
            Module::Contracts => "Contracts",
            Module::Launches => "Launches",
            Module::Reports => "Reports",
            Module::Administration => "Administration",
        }
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Module {
    type Err = AicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Module::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| AicError::Validation {
                message: format!("unknown module: {s}"),
            })
    }
}

/// CRUD-style verb, the second half of a permission key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
    Assign,
    Export,
}

impl Action {
    pub const ALL: [Action; 6] = [
        Action::Create,
        Action::Read,
        Action::Update,
        Action::Delete,
        Action::Assign,
        Action::Export,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Read => "read",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::Assign => "assign",
            Action::Export => "export",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Action::Create => "Create",
            Action::Read => "Read",
            Action::Update => "Update",
            Action::Delete => "Delete",
            Action::Assign => "Assign",
            Action::Export => "Export",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = AicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| AicError::Validation {
                message: format!("unknown action: {s}"),
            })
    }
}

/// The identity of a permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PermissionKey {
    pub module: Module,
    pub action: Action,
}

impl PermissionKey {
    pub const fn new(module: Module, action: Action) -> Self {
        Self { module, action }
    }

    /// Display label, e.g. `launches_read`.
    pub fn name(&self) -> String {
        format!("{}_{}", self.module, self.action)
    }

    pub fn description(&self) -> String {
        format!("Permission to {} in module {}", self.action, self.module)
    }
}

impl fmt::Display for PermissionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.module, self.action)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Permission {
    pub id: Uuid,
    pub module: Module,
    pub action: Action,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl Permission {
    pub fn key(&self) -> PermissionKey {
        PermissionKey::new(self.module, self.action)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePermission {
    pub module: Module,
    pub action: Action,
    pub description: String,
}

impl From<PermissionKey> for CreatePermission {
    fn from(key: PermissionKey) -> Self {
        Self {
            module: key.module,
            action: key.action,
            description: key.description(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_name_and_description() {
        let key = PermissionKey::new(Module::Launches, Action::Read);
        assert_eq!(key.name(), "launches_read");
        assert_eq!(key.description(), "Permission to read in module launches");
        assert_eq!(key.to_string(), "launches.read");
    }
}
