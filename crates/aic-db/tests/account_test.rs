//! Integration tests for the Account and RoleHistory repositories using
//! in-memory SurrealDB.

use aic_core::error::AicError;
use aic_core::models::account::{CreateAccount, UpdateAccount};
use aic_core::models::role::CreateRole;
use aic_core::models::role_history::RoleChange;
use aic_core::repository::{AccountRepository, RoleHistoryRepository, RoleRepository};
use aic_db::repository::{
    SurrealAccountRepository, SurrealRoleHistoryRepository, SurrealRoleRepository,
};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

async fn setup() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    aic_db::run_migrations(&db).await.unwrap();
    db
}

fn account_input(username: &str, role_id: Option<Uuid>) -> CreateAccount {
    CreateAccount {
        username: username.into(),
        first_name: "Jean".into(),
        last_name: "Dupont".into(),
        email: Some(format!("{username}@aic.example")),
        password: "s3cret-pass".into(),
        role_id,
    }
}

#[tokio::test]
async fn create_hashes_password() {
    let db = setup().await;
    let repo = SurrealAccountRepository::new(db);

    let account = repo.create(account_input("jdupont", None)).await.unwrap();
    assert!(account.password_hash.starts_with("$argon2id$"));
    assert!(aic_db::verify_password("s3cret-pass", &account.password_hash).unwrap());
    assert!(!aic_db::verify_password("wrong", &account.password_hash).unwrap());
    assert_eq!(account.full_name(), "Dupont Jean");
    assert!(account.is_active);
    assert!(account.role_id.is_none());
}

#[tokio::test]
async fn duplicate_username_rejected() {
    let db = setup().await;
    let repo = SurrealAccountRepository::new(db);

    repo.create(account_input("jdupont", None)).await.unwrap();
    let err = repo
        .create(account_input("jdupont", None))
        .await
        .unwrap_err();
    assert!(matches!(err, AicError::AlreadyExists { .. }));
}

#[tokio::test]
async fn update_clears_email() {
    let db = setup().await;
    let repo = SurrealAccountRepository::new(db);
    let account = repo.create(account_input("jdupont", None)).await.unwrap();

    let updated = repo
        .update(
            account.id,
            UpdateAccount {
                email: Some(None),
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(updated.email.is_none());
    assert!(!updated.is_active);

    let by_name = repo.get_by_username("jdupont").await.unwrap();
    assert_eq!(by_name.id, account.id);
}

#[tokio::test]
async fn change_role_moves_pointer_and_records_history() {
    let db = setup().await;
    let roles = SurrealRoleRepository::new(db.clone());
    let accounts = SurrealAccountRepository::new(db.clone());
    let history = SurrealRoleHistoryRepository::new(db);

    let role = roles
        .create(CreateRole {
            name: "Operator".into(),
            description: String::new(),
            is_system_role: false,
        })
        .await
        .unwrap();
    let account = accounts.create(account_input("op1", None)).await.unwrap();

    let moved = accounts
        .change_role(RoleChange {
            account_id: account.id,
            old_role_id: None,
            new_role_id: Some(role.id),
            changed_by: None,
            reason: "hired".into(),
        })
        .await
        .unwrap();
    assert_eq!(moved.role_id, Some(role.id));

    let rows = history.list_for_account(account.id).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].old_role_id, None);
    assert_eq!(rows[0].new_role_id, Some(role.id));
    assert_eq!(rows[0].reason, "hired");

    let holders = accounts.list_by_role(role.id, true).await.unwrap();
    assert_eq!(holders.len(), 1);
    assert_eq!(holders[0].id, account.id);
}

#[tokio::test]
async fn change_role_on_missing_account_writes_nothing() {
    let db = setup().await;
    let accounts = SurrealAccountRepository::new(db.clone());
    let history = SurrealRoleHistoryRepository::new(db);
    let ghost = Uuid::new_v4();

    let err = accounts
        .change_role(RoleChange {
            account_id: ghost,
            old_role_id: None,
            new_role_id: None,
            changed_by: None,
            reason: String::new(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AicError::NotFound { .. }));
    assert!(history.list_for_account(ghost).await.unwrap().is_empty());
}

#[tokio::test]
async fn list_by_role_filters_inactive() {
    let db = setup().await;
    let roles = SurrealRoleRepository::new(db.clone());
    let accounts = SurrealAccountRepository::new(db);

    let role = roles
        .create(CreateRole {
            name: "Collaborator".into(),
            description: String::new(),
            is_system_role: false,
        })
        .await
        .unwrap();
    accounts
        .create(account_input("active", Some(role.id)))
        .await
        .unwrap();
    let inactive = accounts
        .create(account_input("inactive", Some(role.id)))
        .await
        .unwrap();
    accounts
        .update(
            inactive.id,
            UpdateAccount {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(accounts.list_by_role(role.id, true).await.unwrap().len(), 1);
    assert_eq!(accounts.list_by_role(role.id, false).await.unwrap().len(), 2);
}
