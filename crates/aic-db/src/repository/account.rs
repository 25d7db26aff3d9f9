//! SurrealDB implementation of [`AccountRepository`].
//!
//! Password hashing uses Argon2id with OWASP-recommended parameters
//! (memory: 19 MiB, iterations: 2, parallelism: 1). Salt is randomly
//! generated per hash.

use aic_core::error::AicResult;
use aic_core::models::account::{Account, CreateAccount, UpdateAccount};
use aic_core::models::role_history::RoleChange;
use aic_core::repository::AccountRepository;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHasher};
use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{parse_opt_uuid, parse_uuid};
use crate::error::{DbError, classify};

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct AccountRow {
    username: String,
    first_name: String,
    last_name: String,
    email: Option<String>,
    password_hash: String,
    is_active: bool,
    role_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct AccountRowWithId {
    record_id: String,
    username: String,
    first_name: String,
    last_name: String,
    email: Option<String>,
    password_hash: String,
    is_active: bool,
    role_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl AccountRow {
    fn into_account(self, id: Uuid) -> Result<Account, DbError> {
        Ok(Account {
            id,
            username: self.username,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            password_hash: self.password_hash,
            is_active: self.is_active,
            role_id: parse_opt_uuid(self.role_id, "role")?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl AccountRowWithId {
    fn try_into_account(self) -> Result<Account, DbError> {
        let id = parse_uuid(&self.record_id, "account")?;
        Ok(Account {
            id,
            username: self.username,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            password_hash: self.password_hash,
            is_active: self.is_active,
            role_id: parse_opt_uuid(self.role_id, "role")?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn argon2_instance() -> Result<Argon2<'static>, DbError> {
    // OWASP ASVS recommended: m=19456 (19 MiB), t=2, p=1
    let params = argon2::Params::new(19456, 2, 1, None)
        .map_err(|e| DbError::Hash(format!("argon2 params: {e}")))?;
    Ok(Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        params,
    ))
}

/// Hash a password with Argon2id. The salt is randomly generated for
/// each call.
pub fn hash_password(password: &str) -> Result<String, DbError> {
    let salt = SaltString::generate(&mut argon2::password_hash::rand_core::OsRng);
    let hash = argon2_instance()?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| DbError::Hash(e.to_string()))?;

    Ok(hash.to_string())
}

/// Check a password against a stored Argon2 hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, DbError> {
    use argon2::PasswordVerifier;

    let parsed_hash = argon2::PasswordHash::new(hash)
        .map_err(|e| DbError::Decode(format!("invalid hash format: {e}")))?;

    match argon2_instance()?.verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(DbError::Hash(e.to_string())),
    }
}

/// SurrealDB implementation of the Account repository.
pub struct SurrealAccountRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> Clone for SurrealAccountRepository<C> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
        }
    }
}

impl<C: Connection> SurrealAccountRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> AccountRepository for SurrealAccountRepository<C> {
    async fn create(&self, input: CreateAccount) -> AicResult<Account> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let password_hash = hash_password(&input.password)?;

        let result = self
            .db
            .query(
                "CREATE type::record('account', $id) SET \
                 username = $username, \
                 first_name = $first_name, last_name = $last_name, \
                 email = $email, \
                 password_hash = $password_hash, \
                 is_active = true, \
                 role_id = $role_id",
            )
            .bind(("id", id_str.clone()))
            .bind(("username", input.username))
            .bind(("first_name", input.first_name))
            .bind(("last_name", input.last_name))
            .bind(("email", input.email))
            .bind(("password_hash", password_hash))
            .bind(("role_id", input.role_id.map(|r| r.to_string())))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| classify(e, "account"))?;

        let rows: Vec<AccountRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "account".into(),
            id: id_str,
        })?;

        Ok(row.into_account(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> AicResult<Account> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('account', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AccountRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "account".into(),
            id: id_str,
        })?;

        Ok(row.into_account(id)?)
    }

    async fn get_by_username(&self, username: &str) -> AicResult<Account> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM account \
                 WHERE username = $username",
            )
            .bind(("username", username.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AccountRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "account".into(),
            id: username.to_string(),
        })?;

        Ok(row.try_into_account()?)
    }

    async fn update(&self, id: Uuid, input: UpdateAccount) -> AicResult<Account> {
        self.get_by_id(id).await?;
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.first_name.is_some() {
            sets.push("first_name = $first_name");
        }
        if input.last_name.is_some() {
            sets.push("last_name = $last_name");
        }
        match &input.email {
            Some(Some(_)) => sets.push("email = $email"),
            Some(None) => sets.push("email = NONE"),
            None => {}
        }
        if input.is_active.is_some() {
            sets.push("is_active = $is_active");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('account', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(first_name) = input.first_name {
            builder = builder.bind(("first_name", first_name));
        }
        if let Some(last_name) = input.last_name {
            builder = builder.bind(("last_name", last_name));
        }
        if let Some(Some(email)) = input.email {
            builder = builder.bind(("email", email));
        }
        if let Some(is_active) = input.is_active {
            builder = builder.bind(("is_active", is_active));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<AccountRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "account".into(),
            id: id_str,
        })?;

        Ok(row.into_account(id)?)
    }

    async fn list_by_role(&self, role_id: Uuid, active_only: bool) -> AicResult<Vec<Account>> {
        let query = if active_only {
            "SELECT meta::id(id) AS record_id, * FROM account \
             WHERE role_id = $role_id AND is_active = true \
             ORDER BY username ASC"
        } else {
            "SELECT meta::id(id) AS record_id, * FROM account \
             WHERE role_id = $role_id \
             ORDER BY username ASC"
        };

        let mut result = self
            .db
            .query(query)
            .bind(("role_id", role_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AccountRowWithId> = result.take(0).map_err(DbError::from)?;

        let accounts = rows
            .into_iter()
            .map(|row| row.try_into_account())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(accounts)
    }

    async fn change_role(&self, change: RoleChange) -> AicResult<Account> {
        self.get_by_id(change.account_id).await?;

        // Pointer move and history row commit or fail together.
        self.db
            .query(
                "BEGIN TRANSACTION; \
                 UPDATE type::record('account', $account_id) SET \
                     role_id = $new_role_id, updated_at = time::now(); \
                 CREATE type::record('role_history', $history_id) SET \
                     account_id = $account_id, \
                     old_role_id = $old_role_id, \
                     new_role_id = $new_role_id, \
                     changed_by = $changed_by, \
                     reason = $reason; \
                 COMMIT TRANSACTION;",
            )
            .bind(("account_id", change.account_id.to_string()))
            .bind(("history_id", Uuid::new_v4().to_string()))
            .bind(("old_role_id", change.old_role_id.map(|r| r.to_string())))
            .bind(("new_role_id", change.new_role_id.map(|r| r.to_string())))
            .bind(("changed_by", change.changed_by.map(|r| r.to_string())))
            .bind(("reason", change.reason))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        self.get_by_id(change.account_id).await
    }
}
