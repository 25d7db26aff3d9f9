//! Integration tests for schema initialization using in-memory SurrealDB.

use surrealdb::Surreal;
use surrealdb::engine::local::Mem;

#[tokio::test]
async fn schema_migration_applies_successfully() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();

    aic_db::run_migrations(&db).await.unwrap();

    let mut result = db.query("INFO FOR DB").await.unwrap();
    let info: Option<surrealdb_types::Value> = result.take(0).unwrap();
    let info = info.expect("INFO FOR DB should return a value");
    let info_str = format!("{:?}", info);

    for table in [
        "permission",
        "role",
        "account",
        "role_history",
        "notification",
        "activity",
        "grants",
        "_migration",
    ] {
        assert!(info_str.contains(table), "missing {table} table");
    }
}

#[tokio::test]
async fn migration_is_idempotent() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();

    aic_db::run_migrations(&db).await.unwrap();
    aic_db::run_migrations(&db).await.unwrap();

    let mut result = db.query("SELECT * FROM _migration").await.unwrap();
    let records: Vec<surrealdb_types::Value> = result.take(0).unwrap();
    assert_eq!(records.len(), aic_db::latest_version() as usize);
}

#[tokio::test]
async fn unique_index_prevents_duplicate_permission_pairs() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    aic_db::run_migrations(&db).await.unwrap();

    db.query(
        "CREATE permission SET module = 'launches', action = 'read', \
         name = 'launches_read', description = 'x'",
    )
    .await
    .unwrap()
    .check()
    .unwrap();

    let result = db
        .query(
            "CREATE permission SET module = 'launches', action = 'read', \
             name = 'other', description = 'y'",
        )
        .await
        .unwrap()
        .check();

    assert!(result.is_err(), "duplicate (module, action) should be rejected");
}

#[tokio::test]
async fn schema_rejects_unknown_module() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    aic_db::run_migrations(&db).await.unwrap();

    let result = db
        .query(
            "CREATE permission SET module = 'payroll', action = 'read', \
             name = 'payroll_read', description = 'x'",
        )
        .await
        .unwrap()
        .check();

    assert!(result.is_err(), "unknown module should be rejected");
}
