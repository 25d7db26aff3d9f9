//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode. UUIDs are stored as
//! strings; enums are stored as strings with ASSERT constraints.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "access_control",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Permission catalog
-- =======================================================================
DEFINE TABLE permission SCHEMAFULL;
DEFINE FIELD module ON TABLE permission TYPE string \
    ASSERT $value IN ['collaborators', 'workshops', 'categories', \
    'contracts', 'launches', 'reports', 'administration'];
DEFINE FIELD action ON TABLE permission TYPE string \
    ASSERT $value IN ['create', 'read', 'update', 'delete', 'assign', \
    'export'];
DEFINE FIELD name ON TABLE permission TYPE string;
DEFINE FIELD description ON TABLE permission TYPE string;
DEFINE FIELD created_at ON TABLE permission TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_permission_module_action ON TABLE permission \
    COLUMNS module, action UNIQUE;

-- =======================================================================
-- Roles
-- =======================================================================
DEFINE TABLE role SCHEMAFULL;
DEFINE FIELD name ON TABLE role TYPE string;
DEFINE FIELD name_key ON TABLE role TYPE string;
DEFINE FIELD description ON TABLE role TYPE string;
DEFINE FIELD is_active ON TABLE role TYPE bool DEFAULT true;
DEFINE FIELD is_system_role ON TABLE role TYPE bool DEFAULT false;
DEFINE FIELD created_at ON TABLE role TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE role TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_role_name_key ON TABLE role COLUMNS name_key UNIQUE;

-- =======================================================================
-- Accounts (collaborators)
-- =======================================================================
DEFINE TABLE account SCHEMAFULL;
DEFINE FIELD username ON TABLE account TYPE string;
DEFINE FIELD first_name ON TABLE account TYPE string;
DEFINE FIELD last_name ON TABLE account TYPE string;
DEFINE FIELD email ON TABLE account TYPE option<string>;
DEFINE FIELD password_hash ON TABLE account TYPE string;
DEFINE FIELD is_active ON TABLE account TYPE bool DEFAULT true;
DEFINE FIELD role_id ON TABLE account TYPE option<string>;
DEFINE FIELD created_at ON TABLE account TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE account TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_account_username ON TABLE account \
    COLUMNS username UNIQUE;
DEFINE INDEX idx_account_role ON TABLE account COLUMNS role_id;

-- =======================================================================
-- Role history (append-only)
-- =======================================================================
DEFINE TABLE role_history SCHEMAFULL
    PERMISSIONS
        FOR create FULL
        FOR select FULL
        FOR update NONE
        FOR delete NONE;
DEFINE FIELD account_id ON TABLE role_history TYPE string;
DEFINE FIELD old_role_id ON TABLE role_history TYPE option<string>;
DEFINE FIELD new_role_id ON TABLE role_history TYPE option<string>;
DEFINE FIELD changed_by ON TABLE role_history TYPE option<string>;
DEFINE FIELD reason ON TABLE role_history TYPE string DEFAULT '';
DEFINE FIELD changed_at ON TABLE role_history TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_role_history_account ON TABLE role_history \
    COLUMNS account_id, changed_at;

-- =======================================================================
-- Notifications
-- =======================================================================
DEFINE TABLE notification SCHEMAFULL;
DEFINE FIELD recipient_id ON TABLE notification TYPE string;
DEFINE FIELD kind ON TABLE notification TYPE string \
    ASSERT $value IN ['info', 'success', 'warning', 'error', 'system'];
DEFINE FIELD title ON TABLE notification TYPE string;
DEFINE FIELD body ON TABLE notification TYPE string;
DEFINE FIELD is_read ON TABLE notification TYPE bool DEFAULT false;
DEFINE FIELD link ON TABLE notification TYPE option<string>;
DEFINE FIELD subject_kind ON TABLE notification TYPE option<string>;
DEFINE FIELD subject_id ON TABLE notification TYPE option<string>;
DEFINE FIELD expires_at ON TABLE notification TYPE option<datetime>;
DEFINE FIELD created_at ON TABLE notification TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD read_at ON TABLE notification TYPE option<datetime>;
DEFINE INDEX idx_notification_recipient ON TABLE notification \
    COLUMNS recipient_id, is_read;
DEFINE INDEX idx_notification_created ON TABLE notification \
    COLUMNS created_at;

-- =======================================================================
-- Activity log (append-only, retention-swept)
-- =======================================================================
DEFINE TABLE activity SCHEMAFULL
    PERMISSIONS
        FOR create FULL
        FOR select FULL
        FOR update NONE
        FOR delete NONE;
DEFINE FIELD actor_id ON TABLE activity TYPE option<string>;
DEFINE FIELD action ON TABLE activity TYPE string \
    ASSERT $value IN ['login', 'logout', 'create', 'update', 'delete', \
    'assign', 'export', 'import', 'view'];
DEFINE FIELD module ON TABLE activity TYPE string \
    ASSERT $value IN ['system', 'collaborators', 'workshops', \
    'categories', 'contracts', 'launches', 'reports', 'administration'];
DEFINE FIELD description ON TABLE activity TYPE string;
DEFINE FIELD subject_kind ON TABLE activity TYPE option<string>;
DEFINE FIELD subject_id ON TABLE activity TYPE option<string>;
DEFINE FIELD before_state ON TABLE activity TYPE option<object> FLEXIBLE;
DEFINE FIELD after_state ON TABLE activity TYPE option<object> FLEXIBLE;
DEFINE FIELD ip_address ON TABLE activity TYPE option<string>;
DEFINE FIELD user_agent ON TABLE activity TYPE option<string>;
DEFINE FIELD created_at ON TABLE activity TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_activity_created ON TABLE activity COLUMNS created_at;
DEFINE INDEX idx_activity_actor ON TABLE activity COLUMNS actor_id;

-- =======================================================================
-- Graph Edge Tables (relations)
-- =======================================================================

-- Role -> Permission grants
DEFINE TABLE grants TYPE RELATION SCHEMAFULL;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Run all pending migrations against the given SurrealDB client.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let mut result = db
        .query("SELECT version FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version <= current_version {
            continue;
        }
        info!(
            version = migration.version,
            name = migration.name,
            "Applying migration"
        );
        db.query(migration.sql).await?.check().map_err(|e| {
            DbError::Migration(format!(
                "Migration v{} '{}' failed: {}",
                migration.version, migration.name, e,
            ))
        })?;

        db.query("CREATE _migration SET version = $version, name = $name")
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;
    }

    Ok(())
}

/// Latest schema version known to this build.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map(|m| m.version).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_ordered() {
        for window in MIGRATIONS.windows(2) {
            assert!(
                window[0].version < window[1].version,
                "Migrations must be in ascending version order"
            );
        }
    }

    #[test]
    fn schema_asserts_cover_every_module() {
        for module in aic_core::models::permission::Module::ALL {
            assert!(
                SCHEMA_V1.contains(&format!("'{}'", module.as_str())),
                "schema is missing module {module}"
            );
        }
    }
}
