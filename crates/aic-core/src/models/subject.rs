//! Typed references to the entity an activity or notification is about.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AicError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Contract,
    Workshop,
    Category,
    Launch,
    Account,
    Role,
}

impl EntityKind {
    pub const ALL: [EntityKind; 6] = [
        EntityKind::Contract,
        EntityKind::Workshop,
        EntityKind::Category,
        EntityKind::Launch,
        EntityKind::Account,
        EntityKind::Role,
    ];

    /// Storage table holding entities of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Contract => "contract",
            EntityKind::Workshop => "workshop",
            EntityKind::Category => "category",
            EntityKind::Launch => "launch",
            EntityKind::Account => "account",
            EntityKind::Role => "role",
        }
    }

    /// UI route under which entities of this kind are shown.
    pub fn route_prefix(&self) -> &'static str {
        match self {
            EntityKind::Contract => "/core/affaires/",
            EntityKind::Workshop => "/ateliers/",
            EntityKind::Category => "/categories/",
            EntityKind::Launch => "/lancements/",
            EntityKind::Account => "/collaborateurs/",
            EntityKind::Role => "/roles/",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = AicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| AicError::Validation {
                message: format!("unknown entity kind: {s}"),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubjectRef {
    pub kind: EntityKind,
    pub id: Uuid,
}

impl SubjectRef {
    pub fn new(kind: EntityKind, id: Uuid) -> Self {
        Self { kind, id }
    }

    /// Default UI link for this subject, e.g. `/lancements/<id>/`.
    pub fn link(&self) -> String {
        format!("{}{}/", self.kind.route_prefix(), self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_has_a_distinct_table() {
        for kind in EntityKind::ALL {
            assert_eq!(kind.as_str().parse::<EntityKind>().unwrap(), kind);
        }
    }

    #[test]
    fn link_uses_route_prefix() {
        let id = Uuid::nil();
        let subject = SubjectRef::new(EntityKind::Launch, id);
        assert_eq!(subject.link(), format!("/lancements/{id}/"));
    }
}
