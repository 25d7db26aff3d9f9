//! SurrealDB implementation of [`NotificationRepository`].

use aic_core::error::AicResult;
use aic_core::models::notification::{
    Notification, NotificationCutoffs, NotificationDraft, NotificationPurgeCounts,
};
use aic_core::repository::{NotificationRepository, PaginatedResult, Pagination};
use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{CountRow, parse_enum, parse_subject, parse_uuid, subject_columns};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct NotificationRow {
    recipient_id: String,
    kind: String,
    title: String,
    body: String,
    is_read: bool,
    link: Option<String>,
    subject_kind: Option<String>,
    subject_id: Option<String>,
    expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    read_at: Option<DateTime<Utc>>,
}

#[derive(Debug, SurrealValue)]
struct NotificationRowWithId {
    record_id: String,
    recipient_id: String,
    kind: String,
    title: String,
    body: String,
    is_read: bool,
    link: Option<String>,
    subject_kind: Option<String>,
    subject_id: Option<String>,
    expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    read_at: Option<DateTime<Utc>>,
}

impl NotificationRow {
    fn into_notification(self, id: Uuid) -> Result<Notification, DbError> {
        Ok(Notification {
            id,
            recipient_id: parse_uuid(&self.recipient_id, "recipient")?,
            kind: parse_enum(&self.kind)?,
            title: self.title,
            body: self.body,
            is_read: self.is_read,
            link: self.link,
            subject: parse_subject(self.subject_kind, self.subject_id)?,
            expires_at: self.expires_at,
            created_at: self.created_at,
            read_at: self.read_at,
        })
    }
}

impl NotificationRowWithId {
    fn try_into_notification(self) -> Result<Notification, DbError> {
        let id = parse_uuid(&self.record_id, "notification")?;
        NotificationRow {
            recipient_id: self.recipient_id,
            kind: self.kind,
            title: self.title,
            body: self.body,
            is_read: self.is_read,
            link: self.link,
            subject_kind: self.subject_kind,
            subject_id: self.subject_id,
            expires_at: self.expires_at,
            created_at: self.created_at,
            read_at: self.read_at,
        }
        .into_notification(id)
    }
}

// Stale predicates shared by the count and delete passes. The expired
// category only counts rows not already covered by the other two.
const STALE_READ: &str = "is_read = true AND read_at != NONE AND read_at < $read_before";
const STALE_UNREAD: &str = "is_read = false AND created_at < $unread_before";
const STALE_EXPIRED: &str = "expires_at != NONE AND expires_at < $expired_before";
const STALE_EXPIRED_ONLY: &str = "expires_at != NONE AND expires_at < $expired_before \
     AND ((is_read = true AND (read_at = NONE OR read_at >= $read_before)) \
     OR (is_read = false AND created_at >= $unread_before))";

/// SurrealDB implementation of the Notification repository.
pub struct SurrealNotificationRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> Clone for SurrealNotificationRepository<C> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
        }
    }
}

impl<C: Connection> SurrealNotificationRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn count_where(
        &self,
        predicate: &str,
        cutoffs: NotificationCutoffs,
    ) -> Result<u64, DbError> {
        let query = format!("SELECT count() AS total FROM notification WHERE {predicate} GROUP ALL");
        let mut result = self
            .db
            .query(query)
            .bind(("read_before", cutoffs.read_before))
            .bind(("unread_before", cutoffs.unread_before))
            .bind(("expired_before", cutoffs.expired_before))
            .await?;
        let rows: Vec<CountRow> = result.take(0)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }
}

impl<C: Connection> NotificationRepository for SurrealNotificationRepository<C> {
    async fn create(&self, recipient_id: Uuid, draft: NotificationDraft) -> AicResult<Notification> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let link = draft.resolved_link();
        let (subject_kind, subject_id) = subject_columns(draft.subject.as_ref());

        let result = self
            .db
            .query(
                "CREATE type::record('notification', $id) SET \
                 recipient_id = $recipient_id, \
                 kind = $kind, title = $title, body = $body, \
                 is_read = false, link = $link, \
                 subject_kind = $subject_kind, subject_id = $subject_id, \
                 expires_at = $expires_at",
            )
            .bind(("id", id_str.clone()))
            .bind(("recipient_id", recipient_id.to_string()))
            .bind(("kind", draft.kind.as_str()))
            .bind(("title", draft.title))
            .bind(("body", draft.body))
            .bind(("link", link))
            .bind(("subject_kind", subject_kind))
            .bind(("subject_id", subject_id))
            .bind(("expires_at", draft.expires_at))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<NotificationRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "notification".into(),
            id: id_str,
        })?;

        Ok(row.into_notification(id)?)
    }

    async fn create_many(&self, recipient_ids: &[Uuid], draft: NotificationDraft) -> AicResult<u64> {
        if recipient_ids.is_empty() {
            return Ok(0);
        }
        let link = draft.resolved_link();
        let (subject_kind, subject_id) = subject_columns(draft.subject.as_ref());

        let mut query = String::from("BEGIN TRANSACTION;\n");
        for recipient_id in recipient_ids {
            let id = Uuid::new_v4();
            query.push_str(&format!(
                "CREATE notification:`{id}` SET \
                 recipient_id = '{recipient_id}', \
                 kind = $kind, title = $title, body = $body, \
                 is_read = false, link = $link, \
                 subject_kind = $subject_kind, subject_id = $subject_id, \
                 expires_at = $expires_at;\n"
            ));
        }
        query.push_str("COMMIT TRANSACTION;");

        self.db
            .query(query)
            .bind(("kind", draft.kind.as_str()))
            .bind(("title", draft.title))
            .bind(("body", draft.body))
            .bind(("link", link))
            .bind(("subject_kind", subject_kind))
            .bind(("subject_id", subject_id))
            .bind(("expires_at", draft.expires_at))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        Ok(recipient_ids.len() as u64)
    }

    async fn get_by_id(&self, id: Uuid) -> AicResult<Notification> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('notification', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<NotificationRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "notification".into(),
            id: id_str,
        })?;

        Ok(row.into_notification(id)?)
    }

    async fn list_for_recipient(
        &self,
        recipient_id: Uuid,
        unread_only: bool,
        pagination: Pagination,
    ) -> AicResult<PaginatedResult<Notification>> {
        let filter = if unread_only {
            "recipient_id = $recipient_id AND is_read = false"
        } else {
            "recipient_id = $recipient_id"
        };
        let recipient_id_str = recipient_id.to_string();

        let mut count_result = self
            .db
            .query(format!(
                "SELECT count() AS total FROM notification WHERE {filter} GROUP ALL"
            ))
            .bind(("recipient_id", recipient_id_str.clone()))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(format!(
                "SELECT meta::id(id) AS record_id, * FROM notification \
                 WHERE {filter} \
                 ORDER BY created_at DESC \
                 LIMIT $limit START $offset"
            ))
            .bind(("recipient_id", recipient_id_str))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<NotificationRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_notification())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn count_unread(&self, recipient_id: Uuid) -> AicResult<u64> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM notification \
                 WHERE recipient_id = $recipient_id AND is_read = false \
                 GROUP ALL",
            )
            .bind(("recipient_id", recipient_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }

    async fn mark_read(&self, id: Uuid, at: DateTime<Utc>) -> AicResult<Notification> {
        let current = self.get_by_id(id).await?;
        if current.is_read {
            return Ok(current);
        }

        let id_str = id.to_string();
        let result = self
            .db
            .query(
                "UPDATE type::record('notification', $id) \
                 SET is_read = true, read_at = $at \
                 WHERE is_read = false",
            )
            .bind(("id", id_str))
            .bind(("at", at))
            .await
            .map_err(DbError::from)?;
        result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        self.get_by_id(id).await
    }

    async fn mark_all_read(&self, recipient_id: Uuid, at: DateTime<Utc>) -> AicResult<u64> {
        let unread = self.count_unread(recipient_id).await?;
        if unread == 0 {
            return Ok(0);
        }

        self.db
            .query(
                "UPDATE notification SET is_read = true, read_at = $at \
                 WHERE recipient_id = $recipient_id AND is_read = false",
            )
            .bind(("recipient_id", recipient_id.to_string()))
            .bind(("at", at))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        Ok(unread)
    }

    async fn count_stale(&self, cutoffs: NotificationCutoffs) -> AicResult<NotificationPurgeCounts> {
        Ok(NotificationPurgeCounts {
            read: self.count_where(STALE_READ, cutoffs).await?,
            unread: self.count_where(STALE_UNREAD, cutoffs).await?,
            expired: self.count_where(STALE_EXPIRED_ONLY, cutoffs).await?,
        })
    }

    async fn delete_stale(&self, cutoffs: NotificationCutoffs) -> AicResult<NotificationPurgeCounts> {
        let counts = self.count_stale(cutoffs).await?;

        // Expired last: whatever it still matches was in no other category.
        let query = format!(
            "DELETE notification WHERE {STALE_READ}; \
             DELETE notification WHERE {STALE_UNREAD}; \
             DELETE notification WHERE {STALE_EXPIRED};"
        );

        self.db
            .query(query)
            .bind(("read_before", cutoffs.read_before))
            .bind(("unread_before", cutoffs.unread_before))
            .bind(("expired_before", cutoffs.expired_before))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        Ok(counts)
    }
}
