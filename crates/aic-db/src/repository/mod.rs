//! SurrealDB repository implementations.

use std::str::FromStr;

use aic_core::error::AicError;
use aic_core::models::subject::{EntityKind, SubjectRef};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

mod account;
mod activity;
mod notification;
mod permission;
mod role;
mod role_history;

pub use account::{SurrealAccountRepository, hash_password, verify_password};
pub use activity::SurrealActivityRepository;
pub use notification::SurrealNotificationRepository;
pub use permission::SurrealPermissionRepository;
pub use role::SurrealRoleRepository;
pub use role_history::SurrealRoleHistoryRepository;

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
pub(crate) struct CountRow {
    pub total: u64,
}

pub(crate) fn parse_uuid(value: &str, field: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(value).map_err(|e| DbError::Decode(format!("invalid {field} UUID: {e}")))
}

pub(crate) fn parse_opt_uuid(value: Option<String>, field: &str) -> Result<Option<Uuid>, DbError> {
    value.as_deref().map(|v| parse_uuid(v, field)).transpose()
}

/// Decode a stored enum string.
pub(crate) fn parse_enum<T>(value: &str) -> Result<T, DbError>
where
    T: FromStr<Err = AicError>,
{
    value.parse().map_err(|e: AicError| DbError::Decode(e.to_string()))
}

/// Rebuild a subject from its two storage columns. Both must be set.
pub(crate) fn parse_subject(
    kind: Option<String>,
    id: Option<String>,
) -> Result<Option<SubjectRef>, DbError> {
    match (kind, id) {
        (Some(kind), Some(id)) => Ok(Some(SubjectRef::new(
            parse_enum::<EntityKind>(&kind)?,
            parse_uuid(&id, "subject")?,
        ))),
        (None, None) => Ok(None),
        _ => Err(DbError::Decode("half-set subject reference".into())),
    }
}

/// Split a subject into its `(subject_kind, subject_id)` columns.
pub(crate) fn subject_columns(subject: Option<&SubjectRef>) -> (Option<String>, Option<String>) {
    match subject {
        Some(s) => (Some(s.kind.as_str().to_string()), Some(s.id.to_string())),
        None => (None, None),
    }
}
