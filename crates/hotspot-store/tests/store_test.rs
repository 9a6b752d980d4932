//! Integration tests against a real PostgreSQL instance.
//!
//! Requires a running PostgreSQL instance. Run with:
//! ```
//! DATABASE_URL=postgres://localhost/hotspot_test cargo test -p hotspot-store --test store_test -- --ignored
//! ```

use chrono::Utc;
use hotspot_core::types::RawCommit;
use hotspot_store::Store;

async fn test_store() -> Store {
    let db_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "postgres://localhost/hotspot_test".into());
    let pool = sqlx::PgPool::connect(&db_url).await.unwrap();
    let store = Store::new(pool);
    store.run_migrations().await.unwrap();
    store
}

fn raw_commit(hash: &str, file_path: &str) -> RawCommit {
    RawCommit {
        hash: hash.to_string(),
        author: "alice".to_string(),
        authored_at: Utc::now(),
        message: Some("test commit".to_string()),
        changes: vec![hotspot_core::types::RawChange {
            file_path: file_path.to_string(),
            lines_added: 1,
            lines_deleted: 0,
        }],
    }
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn insert_batch_skips_conflicting_hashes() {
    let store = test_store().await;
    let project = store
        .create_project(&format!("store-test-{}", std::process::id()), "unused")
        .await
        .unwrap();

    let inserted = store
        .insert_batch(project.id, &[raw_commit("abc123", "a.txt")])
        .await
        .unwrap();
    assert_eq!(inserted, 1);

    // Re-inserting the same hash is a no-op.
    let inserted_again = store
        .insert_batch(project.id, &[raw_commit("abc123", "a.txt")])
        .await
        .unwrap();
    assert_eq!(inserted_again, 0);

    let commits = store.recent_commits(project.id, 10).await.unwrap();
    assert_eq!(commits.len(), 1);
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn watermark_round_trips() {
    let store = test_store().await;
    let project = store
        .create_project(&format!("store-watermark-{}", std::process::id()), "unused")
        .await
        .unwrap();
    assert!(project.watermark_hash.is_none());

    store.update_watermark(project.id, "deadbeef").await.unwrap();
    let reloaded = store.get_project(project.id).await.unwrap();
    assert_eq!(reloaded.watermark_hash.as_deref(), Some("deadbeef"));
}
