//! Activity log domain model.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AicError;
use crate::models::permission::Module;
use crate::models::subject::SubjectRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityAction {
    Login,
    Logout,
    Create,
    Update,
    Delete,
    Assign,
    Export,
    Import,
    View,
}

impl ActivityAction {
    pub const ALL: [ActivityAction; 9] = [
        ActivityAction::Login,
        ActivityAction::Logout,
        ActivityAction::Create,
        ActivityAction::Update,
        ActivityAction::Delete,
        ActivityAction::Assign,
        ActivityAction::Export,
        ActivityAction::Import,
        ActivityAction::View,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityAction::Login => "login",
            ActivityAction::Logout => "logout",
            ActivityAction::Create => "create",
            ActivityAction::Update => "update",
            ActivityAction::Delete => "delete",
            ActivityAction::Assign => "assign",
            ActivityAction::Export => "export",
            ActivityAction::Import => "import",
            ActivityAction::View => "view",
        }
    }
}

impl fmt::Display for ActivityAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityAction {
    type Err = AicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActivityAction::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| AicError::Validation {
                message: format!("unknown activity action: {s}"),
            })
    }
}

/// Area an activity belongs to: a permission module, or the system itself
/// (logins, maintenance).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityModule {
    System,
    #[serde(untagged)]
    Area(Module),
}

impl ActivityModule {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityModule::System => "system",
            ActivityModule::Area(module) => module.as_str(),
        }
    }
}

impl From<Module> for ActivityModule {
    fn from(module: Module) -> Self {
        ActivityModule::Area(module)
    }
}

impl fmt::Display for ActivityModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityModule {
    type Err = AicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "system" {
            return Ok(ActivityModule::System);
        }
        s.parse::<Module>().map(ActivityModule::Area)
    }
}

/// Field snapshot attached to an entry, keyed by field name.
pub type Snapshot = serde_json::Map<String, serde_json::Value>;

/// An append-only log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    pub id: Uuid,
    pub actor_id: Option<Uuid>,
    pub action: ActivityAction,
    pub module: ActivityModule,
    pub description: String,
    pub subject: Option<SubjectRef>,
    pub before: Option<Snapshot>,
    pub after: Option<Snapshot>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateActivity {
    pub actor_id: Option<Uuid>,
    pub action: ActivityAction,
    pub module: ActivityModule,
    pub description: String,
    pub subject: Option<SubjectRef>,
    pub before: Option<Snapshot>,
    pub after: Option<Snapshot>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}
