//! Database-specific error types and conversions.

use aic_core::error::AicError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Password hashing failed: {0}")]
    Hash(String),

    #[error("Corrupt record: {0}")]
    Decode(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Duplicate record: {entity}")]
    Duplicate { entity: String },
}

impl From<DbError> for AicError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => AicError::NotFound { entity, id },
            DbError::Duplicate { entity } => AicError::AlreadyExists { entity },
            other => AicError::Database(other.to_string()),
        }
    }
}

/// Map a failed statement check, reporting unique-index violations as
/// [`DbError::Duplicate`].
pub(crate) fn classify(err: surrealdb::Error, entity: &str) -> DbError {
    let message = err.to_string();
    if message.contains("already contains") || message.contains("already exists") {
        DbError::Duplicate {
            entity: entity.into(),
        }
    } else {
        DbError::Query(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_failures_are_not_reported_as_migrations() {
        let err: AicError = DbError::Query("coerce failed".into()).into();
        assert!(matches!(err, AicError::Database(ref m) if m == "Query failed: coerce failed"));
    }

    #[test]
    fn duplicates_map_to_already_exists() {
        let err: AicError = DbError::Duplicate {
            entity: "role".into(),
        }
        .into();
        assert!(matches!(err, AicError::AlreadyExists { entity } if entity == "role"));
    }
}
