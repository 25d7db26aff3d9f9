//! SurrealDB implementation of [`ActivityRepository`].
//!
//! Activity entries are append-only: the table has `FOR update NONE`
//! permissions and the repository exposes no update path. Deletion is
//! reserved for the retention sweep.

use aic_core::error::AicResult;
use aic_core::models::activity::{Activity, CreateActivity, Snapshot};
use aic_core::repository::{ActivityFilter, ActivityRepository, PaginatedResult, Pagination};
use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{CountRow, parse_enum, parse_opt_uuid, parse_subject, parse_uuid, subject_columns};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct ActivityRow {
    actor_id: Option<String>,
    action: String,
    module: String,
    description: String,
    subject_kind: Option<String>,
    subject_id: Option<String>,
    before_state: Option<serde_json::Value>,
    after_state: Option<serde_json::Value>,
    ip_address: Option<String>,
    user_agent: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct ActivityRowWithId {
    record_id: String,
    actor_id: Option<String>,
    action: String,
    module: String,
    description: String,
    subject_kind: Option<String>,
    subject_id: Option<String>,
    before_state: Option<serde_json::Value>,
    after_state: Option<serde_json::Value>,
    ip_address: Option<String>,
    user_agent: Option<String>,
    created_at: DateTime<Utc>,
}

fn parse_snapshot(
    value: Option<serde_json::Value>,
    field: &str,
) -> Result<Option<Snapshot>, DbError> {
    match value {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::Object(map)) => Ok(Some(map)),
        Some(other) => Err(DbError::Decode(format!("{field} is not an object: {other}"))),
    }
}

impl ActivityRow {
    fn into_activity(self, id: Uuid) -> Result<Activity, DbError> {
        Ok(Activity {
            id,
            actor_id: parse_opt_uuid(self.actor_id, "actor")?,
            action: parse_enum(&self.action)?,
            module: parse_enum(&self.module)?,
            description: self.description,
            subject: parse_subject(self.subject_kind, self.subject_id)?,
            before: parse_snapshot(self.before_state, "before_state")?,
            after: parse_snapshot(self.after_state, "after_state")?,
            ip_address: self.ip_address,
            user_agent: self.user_agent,
            created_at: self.created_at,
        })
    }
}

impl ActivityRowWithId {
    fn try_into_activity(self) -> Result<Activity, DbError> {
        let id = parse_uuid(&self.record_id, "activity")?;
        ActivityRow {
            actor_id: self.actor_id,
            action: self.action,
            module: self.module,
            description: self.description,
            subject_kind: self.subject_kind,
            subject_id: self.subject_id,
            before_state: self.before_state,
            after_state: self.after_state,
            ip_address: self.ip_address,
            user_agent: self.user_agent,
            created_at: self.created_at,
        }
        .into_activity(id)
    }
}

/// SurrealDB implementation of the activity log.
pub struct SurrealActivityRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> Clone for SurrealActivityRepository<C> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
        }
    }
}

impl<C: Connection> SurrealActivityRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

/// Build the WHERE clause for a filter. Returns an empty string when no
/// filter is set.
fn filter_clause(filter: &ActivityFilter) -> String {
    let mut conditions = Vec::new();
    if filter.actor_id.is_some() {
        conditions.push("actor_id = $actor_id");
    }
    if filter.action.is_some() {
        conditions.push("action = $action");
    }
    if filter.module.is_some() {
        conditions.push("module = $module");
    }
    if filter.from.is_some() {
        conditions.push("created_at >= $from");
    }
    if filter.to.is_some() {
        conditions.push("created_at <= $to");
    }
    if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    }
}

impl<C: Connection> ActivityRepository for SurrealActivityRepository<C> {
    async fn append(&self, input: CreateActivity) -> AicResult<Activity> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let (subject_kind, subject_id) = subject_columns(input.subject.as_ref());

        let result = self
            .db
            .query(
                "CREATE type::record('activity', $id) SET \
                 actor_id = $actor_id, \
                 action = $action, module = $module, \
                 description = $description, \
                 subject_kind = $subject_kind, subject_id = $subject_id, \
                 before_state = $before_state, after_state = $after_state, \
                 ip_address = $ip_address, user_agent = $user_agent",
            )
            .bind(("id", id_str.clone()))
            .bind(("actor_id", input.actor_id.map(|a| a.to_string())))
            .bind(("action", input.action.as_str()))
            .bind(("module", input.module.as_str()))
            .bind(("description", input.description))
            .bind(("subject_kind", subject_kind))
            .bind(("subject_id", subject_id))
            .bind(("before_state", input.before.map(serde_json::Value::Object)))
            .bind(("after_state", input.after.map(serde_json::Value::Object)))
            .bind(("ip_address", input.ip_address))
            .bind(("user_agent", input.user_agent))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<ActivityRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "activity".into(),
            id: id_str,
        })?;

        Ok(row.into_activity(id)?)
    }

    async fn list(
        &self,
        filter: ActivityFilter,
        pagination: Pagination,
    ) -> AicResult<PaginatedResult<Activity>> {
        let where_clause = filter_clause(&filter);
        let count_query =
            format!("SELECT count() AS total FROM activity {where_clause} GROUP ALL");
        let select_query = format!(
            "SELECT meta::id(id) AS record_id, * FROM activity {where_clause} \
             ORDER BY created_at DESC LIMIT $limit START $offset"
        );

        let actor_id = filter.actor_id.map(|a| a.to_string());
        let action = filter.action.map(|a| a.as_str());
        let module = filter.module.map(|m| m.as_str());

        let mut count_result = self
            .db
            .query(count_query)
            .bind(("actor_id", actor_id.clone()))
            .bind(("action", action))
            .bind(("module", module))
            .bind(("from", filter.from))
            .bind(("to", filter.to))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(select_query)
            .bind(("actor_id", actor_id))
            .bind(("action", action))
            .bind(("module", module))
            .bind(("from", filter.from))
            .bind(("to", filter.to))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ActivityRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_activity())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn count_before(&self, cutoff: DateTime<Utc>) -> AicResult<u64> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM activity \
                 WHERE created_at < $cutoff GROUP ALL",
            )
            .bind(("cutoff", cutoff))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }

    async fn delete_before(&self, cutoff: DateTime<Utc>) -> AicResult<u64> {
        let count = self.count_before(cutoff).await?;
        if count == 0 {
            return Ok(0);
        }

        self.db
            .query("DELETE activity WHERE created_at < $cutoff")
            .bind(("cutoff", cutoff))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        Ok(count)
    }
}
