//! Integration tests for the Permission and Role repositories using
//! in-memory SurrealDB.

use aic_core::error::AicError;
use aic_core::models::permission::{Action, CreatePermission, Module, PermissionKey};
use aic_core::models::role::{CreateRole, UpdateRole};
use aic_core::repository::{Pagination, PermissionRepository, RoleRepository, Store};
use aic_db::SurrealStore;
use aic_db::repository::{SurrealPermissionRepository, SurrealRoleRepository};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

async fn setup() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    aic_db::run_migrations(&db).await.unwrap();
    db
}

fn role_input(name: &str) -> CreateRole {
    CreateRole {
        name: name.into(),
        description: format!("{name} role"),
        is_system_role: false,
    }
}

#[tokio::test]
async fn get_or_create_is_idempotent() {
    let db = setup().await;
    let repo = SurrealPermissionRepository::new(db);
    let key = PermissionKey::new(Module::Launches, Action::Read);

    let (first, created) = repo.get_or_create(key.into()).await.unwrap();
    assert!(created);
    assert_eq!(first.name, "launches_read");
    assert_eq!(first.description, "Permission to read in module launches");

    let (second, created) = repo.get_or_create(key.into()).await.unwrap();
    assert!(!created);
    assert_eq!(first.id, second.id);

    assert_eq!(repo.list_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn get_many_omits_unknown_ids() {
    let db = setup().await;
    let repo = SurrealPermissionRepository::new(db);

    let (read, _) = repo
        .get_or_create(CreatePermission::from(PermissionKey::new(
            Module::Reports,
            Action::Read,
        )))
        .await
        .unwrap();

    let found = repo.get_many(&[read.id, Uuid::new_v4()]).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, read.id);

    let by_key = repo
        .get_by_key(PermissionKey::new(Module::Reports, Action::Read))
        .await
        .unwrap();
    assert_eq!(by_key.id, read.id);
}

#[tokio::test]
async fn role_names_are_unique_case_insensitively() {
    let db = setup().await;
    let repo = SurrealRoleRepository::new(db);

    repo.create(role_input("Workshop Manager")).await.unwrap();
    let err = repo
        .create(role_input("workshop manager"))
        .await
        .unwrap_err();
    assert!(matches!(err, AicError::AlreadyExists { .. }));

    let found = repo.get_by_name("WORKSHOP MANAGER").await.unwrap();
    assert_eq!(found.name, "Workshop Manager");
}

#[tokio::test]
async fn update_role_fields() {
    let db = setup().await;
    let repo = SurrealRoleRepository::new(db);
    let role = repo.create(role_input("Operator")).await.unwrap();
    assert!(role.is_active);

    let updated = repo
        .update(
            role.id,
            UpdateRole {
                description: Some("Shop floor".into()),
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "Operator");
    assert_eq!(updated.description, "Shop floor");
    assert!(!updated.is_active);

    let missing = repo
        .update(Uuid::new_v4(), UpdateRole::default())
        .await
        .unwrap_err();
    assert!(matches!(missing, AicError::NotFound { .. }));
}

#[tokio::test]
async fn set_permissions_replaces_whole_set() {
    let db = setup().await;
    let perms = SurrealPermissionRepository::new(db.clone());
    let roles = SurrealRoleRepository::new(db);

    let mut ids = Vec::new();
    for action in [Action::Create, Action::Read, Action::Update] {
        let (p, _) = perms
            .get_or_create(PermissionKey::new(Module::Launches, action).into())
            .await
            .unwrap();
        ids.push(p.id);
    }

    let role = roles.create(role_input("Operator")).await.unwrap();
    roles.set_permissions(role.id, &ids).await.unwrap();
    assert_eq!(roles.count_permissions(role.id).await.unwrap(), 3);

    roles.set_permissions(role.id, &ids[1..2]).await.unwrap();
    let granted = roles.get_permissions(role.id).await.unwrap();
    assert_eq!(granted.len(), 1);
    assert_eq!(granted[0].action, Action::Read);

    roles.set_permissions(role.id, &[]).await.unwrap();
    assert_eq!(roles.count_permissions(role.id).await.unwrap(), 0);
}

#[tokio::test]
async fn set_permissions_ignores_duplicate_ids() {
    let db = setup().await;
    let perms = SurrealPermissionRepository::new(db.clone());
    let roles = SurrealRoleRepository::new(db);

    let (p, _) = perms
        .get_or_create(PermissionKey::new(Module::Workshops, Action::Read).into())
        .await
        .unwrap();
    let role = roles.create(role_input("Collaborator")).await.unwrap();

    roles.set_permissions(role.id, &[p.id, p.id]).await.unwrap();
    assert_eq!(roles.count_permissions(role.id).await.unwrap(), 1);
}

#[tokio::test]
async fn list_roles_is_paginated() {
    let db = setup().await;
    let repo = SurrealRoleRepository::new(db);
    for name in ["Alpha", "Bravo", "Charlie"] {
        repo.create(role_input(name)).await.unwrap();
    }

    let page = repo
        .list(Pagination {
            offset: 0,
            limit: 2,
        })
        .await
        .unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[0].name, "Alpha");
}

fn assert_store<S: Store>(_: &S) {}

#[tokio::test]
async fn store_clones_share_the_connection() {
    let db = setup().await;
    let store = SurrealStore::new(db);
    assert_store(&store);

    let cloned = store.clone();
    let created = cloned.roles().create(role_input("Painter")).await.unwrap();

    let found = store.roles().get_by_name("painter").await.unwrap();
    assert_eq!(found.id, created.id);
    let roles = cloned.roles().clone();
    assert_eq!(roles.get_by_id(created.id).await.unwrap().name, "Painter");
}
