//! SurrealDB implementation of [`PermissionRepository`].

use aic_core::error::AicResult;
use aic_core::models::permission::{CreatePermission, Permission, PermissionKey};
use aic_core::repository::PermissionRepository;
use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::debug;
use uuid::Uuid;

use super::{parse_enum, parse_uuid};
use crate::error::{DbError, classify};

#[derive(Debug, SurrealValue)]
struct PermissionRow {
    module: String,
    action: String,
    name: String,
    description: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
pub(crate) struct PermissionRowWithId {
    record_id: String,
    module: String,
    action: String,
    name: String,
    description: String,
    created_at: DateTime<Utc>,
}

impl PermissionRow {
    fn into_permission(self, id: Uuid) -> Result<Permission, DbError> {
        Ok(Permission {
            id,
            module: parse_enum(&self.module)?,
            action: parse_enum(&self.action)?,
            name: self.name,
            description: self.description,
            created_at: self.created_at,
        })
    }
}

impl PermissionRowWithId {
    fn try_into_permission(self) -> Result<Permission, DbError> {
        let id = parse_uuid(&self.record_id, "permission")?;
        PermissionRow {
            module: self.module,
            action: self.action,
            name: self.name,
            description: self.description,
            created_at: self.created_at,
        }
        .into_permission(id)
    }
}

pub(crate) fn rows_into_permissions(
    rows: Vec<PermissionRowWithId>,
) -> Result<Vec<Permission>, DbError> {
    let mut permissions = rows
        .into_iter()
        .map(PermissionRowWithId::try_into_permission)
        .collect::<Result<Vec<_>, DbError>>()?;
    permissions.sort_by_key(Permission::key);
    Ok(permissions)
}

/// SurrealDB implementation of the Permission repository.
pub struct SurrealPermissionRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> Clone for SurrealPermissionRepository<C> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
        }
    }
}

impl<C: Connection> SurrealPermissionRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn find_by_key(&self, key: PermissionKey) -> Result<Option<Permission>, DbError> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM permission \
                 WHERE module = $module AND action = $action",
            )
            .bind(("module", key.module.as_str()))
            .bind(("action", key.action.as_str()))
            .await?;

        let rows: Vec<PermissionRowWithId> = result.take(0)?;
        rows.into_iter()
            .next()
            .map(PermissionRowWithId::try_into_permission)
            .transpose()
    }
}

impl<C: Connection> PermissionRepository for SurrealPermissionRepository<C> {
    async fn get_or_create(&self, input: CreatePermission) -> AicResult<(Permission, bool)> {
        let key = PermissionKey::new(input.module, input.action);
        if let Some(existing) = self.find_by_key(key).await? {
            return Ok((existing, false));
        }

        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('permission', $id) SET \
                 module = $module, action = $action, \
                 name = $name, description = $description",
            )
            .bind(("id", id_str.clone()))
            .bind(("module", key.module.as_str()))
            .bind(("action", key.action.as_str()))
            .bind(("name", key.name()))
            .bind(("description", input.description))
            .await
            .map_err(DbError::from)?;

        let mut result = match result.check() {
            Ok(result) => result,
            // Lost a race against a concurrent seeder: the pair now exists.
            Err(e) => match classify(e, "permission") {
                DbError::Duplicate { .. } => {
                    debug!(permission = %key, "Permission created concurrently");
                    let existing = self
                        .find_by_key(key)
                        .await?
                        .ok_or_else(|| DbError::NotFound {
                            entity: "permission".into(),
                            id: key.to_string(),
                        })?;
                    return Ok((existing, false));
                }
                other => return Err(other.into()),
            },
        };

        let rows: Vec<PermissionRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "permission".into(),
            id: id_str,
        })?;

        Ok((row.into_permission(id)?, true))
    }

    async fn get_by_id(&self, id: Uuid) -> AicResult<Permission> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('permission', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PermissionRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "permission".into(),
            id: id_str,
        })?;

        Ok(row.into_permission(id)?)
    }

    async fn get_by_key(&self, key: PermissionKey) -> AicResult<Permission> {
        self.find_by_key(key).await?.ok_or_else(|| {
            DbError::NotFound {
                entity: "permission".into(),
                id: key.to_string(),
            }
            .into()
        })
    }

    async fn get_many(&self, ids: &[Uuid]) -> AicResult<Vec<Permission>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<String> = ids.iter().map(Uuid::to_string).collect();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM permission \
                 WHERE meta::id(id) IN $ids",
            )
            .bind(("ids", ids))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PermissionRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(rows_into_permissions(rows)?)
    }

    async fn list_all(&self) -> AicResult<Vec<Permission>> {
        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM permission")
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PermissionRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(rows_into_permissions(rows)?)
    }
}
