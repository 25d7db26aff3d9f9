//! Integration tests for the Notification and Activity repositories using
//! in-memory SurrealDB.

use aic_core::models::activity::{ActivityAction, ActivityModule, CreateActivity, Snapshot};
use aic_core::models::notification::{NotificationCutoffs, NotificationDraft, NotificationKind};
use aic_core::models::permission::Module;
use aic_core::models::subject::{EntityKind, SubjectRef};
use aic_core::repository::{ActivityFilter, ActivityRepository, NotificationRepository, Pagination};
use aic_db::repository::{SurrealActivityRepository, SurrealNotificationRepository};
use chrono::{Duration, SubsecRound, Utc};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

async fn setup() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    aic_db::run_migrations(&db).await.unwrap();
    db
}

fn draft(title: &str) -> NotificationDraft {
    NotificationDraft::new(NotificationKind::Info, title, "body")
}

#[tokio::test]
async fn create_derives_link_from_subject() {
    let db = setup().await;
    let repo = SurrealNotificationRepository::new(db);
    let recipient = Uuid::new_v4();
    let launch = Uuid::new_v4();

    let created = repo
        .create(
            recipient,
            draft("Launch ready").with_subject(SubjectRef::new(EntityKind::Launch, launch)),
        )
        .await
        .unwrap();
    assert_eq!(created.link, Some(format!("/lancements/{launch}/")));
    assert_eq!(
        created.subject,
        Some(SubjectRef::new(EntityKind::Launch, launch))
    );
    assert!(!created.is_read);
    assert!(created.read_at.is_none());
}

#[tokio::test]
async fn create_many_writes_one_row_per_recipient() {
    let db = setup().await;
    let repo = SurrealNotificationRepository::new(db);
    let recipients = [Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()];

    let written = repo.create_many(&recipients, draft("Hello")).await.unwrap();
    assert_eq!(written, 3);
    for recipient in recipients {
        assert_eq!(repo.count_unread(recipient).await.unwrap(), 1);
    }

    assert_eq!(repo.create_many(&[], draft("Nobody")).await.unwrap(), 0);
}

#[tokio::test]
async fn mark_read_sets_timestamp_once() {
    let db = setup().await;
    let repo = SurrealNotificationRepository::new(db);
    let recipient = Uuid::new_v4();
    let n = repo.create(recipient, draft("One")).await.unwrap();

    let first_at = Utc::now().trunc_subsecs(3);
    let read = repo.mark_read(n.id, first_at).await.unwrap();
    assert!(read.is_read);
    assert_eq!(read.read_at, Some(first_at));

    let again = repo
        .mark_read(n.id, first_at + Duration::hours(1))
        .await
        .unwrap();
    assert_eq!(again.read_at, Some(first_at));
    assert_eq!(repo.count_unread(recipient).await.unwrap(), 0);
}

#[tokio::test]
async fn mark_all_read_counts_changed_rows() {
    let db = setup().await;
    let repo = SurrealNotificationRepository::new(db);
    let recipient = Uuid::new_v4();
    let other = Uuid::new_v4();
    repo.create(recipient, draft("a")).await.unwrap();
    repo.create(recipient, draft("b")).await.unwrap();
    repo.create(other, draft("c")).await.unwrap();

    assert_eq!(repo.mark_all_read(recipient, Utc::now()).await.unwrap(), 2);
    assert_eq!(repo.mark_all_read(recipient, Utc::now()).await.unwrap(), 0);
    assert_eq!(repo.count_unread(other).await.unwrap(), 1);

    let page = repo
        .list_for_recipient(recipient, true, Pagination::default())
        .await
        .unwrap();
    assert_eq!(page.total, 0);
    let page = repo
        .list_for_recipient(recipient, false, Pagination::default())
        .await
        .unwrap();
    assert_eq!(page.total, 2);
}

#[tokio::test]
async fn stale_categories_are_disjoint() {
    let db = setup().await;
    let repo = SurrealNotificationRepository::new(db);
    let recipient = Uuid::new_v4();
    let now = Utc::now();

    // Read, long ago from the perspective of the cutoffs below.
    let read = repo.create(recipient, draft("read")).await.unwrap();
    repo.mark_read(read.id, now).await.unwrap();
    // Unread and also expired: counted as unread only.
    repo.create(recipient, draft("unread").expires_at(now))
        .await
        .unwrap();

    let future = now + Duration::days(400);
    let cutoffs = NotificationCutoffs {
        read_before: future,
        unread_before: future,
        expired_before: future,
    };

    let counts = repo.count_stale(cutoffs).await.unwrap();
    assert_eq!(counts.read, 1);
    assert_eq!(counts.unread, 1);
    assert_eq!(counts.expired, 0);

    let deleted = repo.delete_stale(cutoffs).await.unwrap();
    assert_eq!(deleted, counts);
    assert_eq!(repo.count_stale(cutoffs).await.unwrap().total(), 0);
}

#[tokio::test]
async fn expired_category_counts_fresh_expired_rows() {
    let db = setup().await;
    let repo = SurrealNotificationRepository::new(db);
    let recipient = Uuid::new_v4();
    let now = Utc::now();

    repo.create(recipient, draft("short-lived").expires_at(now))
        .await
        .unwrap();
    repo.create(recipient, draft("fresh")).await.unwrap();

    let cutoffs = NotificationCutoffs {
        read_before: now - Duration::days(30),
        unread_before: now - Duration::days(90),
        expired_before: now + Duration::seconds(1),
    };

    let deleted = repo.delete_stale(cutoffs).await.unwrap();
    assert_eq!(deleted.expired, 1);
    assert_eq!(deleted.total(), 1);
    assert_eq!(repo.count_unread(recipient).await.unwrap(), 1);
}

fn activity(action: ActivityAction, module: ActivityModule) -> CreateActivity {
    CreateActivity {
        actor_id: None,
        action,
        module,
        description: format!("{action} in {module}"),
        subject: None,
        before: None,
        after: serde_json::json!({ "name": "x" }).as_object().cloned(),
        ip_address: Some("10.0.0.1".into()),
        user_agent: None,
    }
}

#[tokio::test]
async fn activity_append_and_filter() {
    let db = setup().await;
    let repo = SurrealActivityRepository::new(db);

    let entry = repo
        .append(activity(ActivityAction::Login, ActivityModule::System))
        .await
        .unwrap();
    assert_eq!(entry.module, ActivityModule::System);
    assert_eq!(
        entry.after.as_ref().and_then(|s| s.get("name")),
        Some(&serde_json::json!("x"))
    );

    repo.append(activity(ActivityAction::Export, Module::Reports.into()))
        .await
        .unwrap();

    let all = repo
        .list(ActivityFilter::default(), Pagination::default())
        .await
        .unwrap();
    assert_eq!(all.total, 2);

    let exports = repo
        .list(
            ActivityFilter {
                action: Some(ActivityAction::Export),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(exports.total, 1);
    assert_eq!(exports.items[0].module, ActivityModule::Area(Module::Reports));
}

#[tokio::test]
async fn activity_delete_before_cutoff() {
    let db = setup().await;
    let repo = SurrealActivityRepository::new(db);
    repo.append(activity(ActivityAction::View, Module::Launches.into()))
        .await
        .unwrap();

    let past = Utc::now() - Duration::days(1);
    assert_eq!(repo.delete_before(past).await.unwrap(), 0);

    let future = Utc::now() + Duration::days(1);
    assert_eq!(repo.count_before(future).await.unwrap(), 1);
    assert_eq!(repo.delete_before(future).await.unwrap(), 1);
    assert_eq!(repo.count_before(future).await.unwrap(), 0);
}

#[tokio::test]
async fn activity_snapshots_keep_nested_values() {
    let db = setup().await;
    let repo = SurrealActivityRepository::new(db);

    let before = serde_json::json!({ "weight": 12.5 });
    let after = serde_json::json!({ "weight": 13.5, "tags": ["urgent", "painted"] });
    let entry = repo
        .append(CreateActivity {
            before: before.as_object().cloned(),
            after: after.as_object().cloned(),
            ..activity(ActivityAction::Update, Module::Launches.into())
        })
        .await
        .unwrap();

    let listed = repo
        .list(
            ActivityFilter {
                action: Some(ActivityAction::Update),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(listed.items.len(), 1);
    let stored = &listed.items[0];
    assert_eq!(stored.id, entry.id);

    let weight = |snapshot: &Option<Snapshot>| {
        snapshot
            .as_ref()
            .and_then(|s| s.get("weight"))
            .and_then(serde_json::Value::as_f64)
    };
    assert_eq!(weight(&stored.before), Some(12.5));
    assert_eq!(weight(&stored.after), Some(13.5));
    assert_eq!(
        stored.after.as_ref().and_then(|s| s.get("tags")),
        Some(&serde_json::json!(["urgent", "painted"]))
    );
}
