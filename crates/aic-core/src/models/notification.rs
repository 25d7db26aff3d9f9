//! Notification domain model.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AicError;
use crate::models::subject::SubjectRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Info,
    Success,
    Warning,
    Error,
    System,
}

impl NotificationKind {
    pub const ALL: [NotificationKind; 5] = [
        NotificationKind::Info,
        NotificationKind::Success,
        NotificationKind::Warning,
        NotificationKind::Error,
        NotificationKind::System,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Info => "info",
            NotificationKind::Success => "success",
            NotificationKind::Warning => "warning",
            NotificationKind::Error => "error",
            NotificationKind::System => "system",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationKind {
    type Err = AicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NotificationKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| AicError::Validation {
                message: format!("unknown notification kind: {s}"),
            })
    }
}

/// A message directed at one account.
///
/// `read_at` is `Some` exactly when `is_read` is true.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub is_read: bool,
    pub link: Option<String>,
    pub subject: Option<SubjectRef>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

/// Recipient-independent content of a notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationDraft {
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub link: Option<String>,
    pub subject: Option<SubjectRef>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl NotificationDraft {
    pub fn new(kind: NotificationKind, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            body: body.into(),
            link: None,
            subject: None,
            expires_at: None,
        }
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    pub fn with_subject(mut self, subject: SubjectRef) -> Self {
        self.subject = Some(subject);
        self
    }

    pub fn expires_at(mut self, at: DateTime<Utc>) -> Self {
        self.expires_at = Some(at);
        self
    }

    /// The explicit link, or the subject's default route when none was set.
    pub fn resolved_link(&self) -> Option<String> {
        self.link
            .clone()
            .or_else(|| self.subject.as_ref().map(SubjectRef::link))
    }
}

/// Age limits applied by the retention sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationCutoffs {
    /// Read notifications whose `read_at` is before this instant are stale.
    pub read_before: DateTime<Utc>,
    /// Unread notifications created before this instant are stale.
    pub unread_before: DateTime<Utc>,
    /// Notifications whose `expires_at` is before this instant are stale.
    pub expired_before: DateTime<Utc>,
}

/// Per-category counts produced by a retention pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPurgeCounts {
    pub read: u64,
    pub unread: u64,
    pub expired: u64,
}

impl NotificationPurgeCounts {
    pub fn total(&self) -> u64 {
        self.read + self.unread + self.expired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::subject::EntityKind;

    #[test]
    fn explicit_link_wins_over_subject() {
        let draft = NotificationDraft::new(NotificationKind::Info, "t", "b")
            .with_subject(SubjectRef::new(EntityKind::Workshop, Uuid::nil()))
            .with_link("/custom/");
        assert_eq!(draft.resolved_link().as_deref(), Some("/custom/"));
    }

    #[test]
    fn subject_link_used_when_no_link() {
        let id = Uuid::new_v4();
        let draft = NotificationDraft::new(NotificationKind::Warning, "t", "b")
            .with_subject(SubjectRef::new(EntityKind::Workshop, id));
        assert_eq!(draft.resolved_link(), Some(format!("/ateliers/{id}/")));
    }

    #[test]
    fn no_link_without_subject() {
        let draft = NotificationDraft::new(NotificationKind::System, "t", "b");
        assert!(draft.resolved_link().is_none());
    }
}
