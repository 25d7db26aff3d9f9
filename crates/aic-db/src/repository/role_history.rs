//! SurrealDB implementation of [`RoleHistoryRepository`].

use aic_core::error::AicResult;
use aic_core::models::role_history::RoleHistory;
use aic_core::repository::RoleHistoryRepository;
use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{parse_opt_uuid, parse_uuid};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct RoleHistoryRowWithId {
    record_id: String,
    account_id: String,
    old_role_id: Option<String>,
    new_role_id: Option<String>,
    changed_by: Option<String>,
    reason: String,
    changed_at: DateTime<Utc>,
}

impl RoleHistoryRowWithId {
    fn try_into_history(self) -> Result<RoleHistory, DbError> {
        Ok(RoleHistory {
            id: parse_uuid(&self.record_id, "role_history")?,
            account_id: parse_uuid(&self.account_id, "account")?,
            old_role_id: parse_opt_uuid(self.old_role_id, "role")?,
            new_role_id: parse_opt_uuid(self.new_role_id, "role")?,
            changed_by: parse_opt_uuid(self.changed_by, "account")?,
            reason: self.reason,
            changed_at: self.changed_at,
        })
    }
}

/// Read-only access to role reassignment history.
pub struct SurrealRoleHistoryRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> Clone for SurrealRoleHistoryRepository<C> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
        }
    }
}

impl<C: Connection> SurrealRoleHistoryRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> RoleHistoryRepository for SurrealRoleHistoryRepository<C> {
    async fn list_for_account(&self, account_id: Uuid) -> AicResult<Vec<RoleHistory>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM role_history \
                 WHERE account_id = $account_id \
                 ORDER BY changed_at ASC",
            )
            .bind(("account_id", account_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoleHistoryRowWithId> = result.take(0).map_err(DbError::from)?;

        let history = rows
            .into_iter()
            .map(|row| row.try_into_history())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(history)
    }
}
