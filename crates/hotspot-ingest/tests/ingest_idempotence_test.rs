//! Integration test for re-ingestion idempotence and watermark advancement.
//!
//! Requires a running PostgreSQL instance. Run with:
//! ```
//! DATABASE_URL=postgres://localhost/hotspot_test cargo test -p hotspot-ingest --test ingest_idempotence_test -- --ignored
//! ```

use std::process::Command;

use hotspot_core::CancellationToken;
use hotspot_store::Store;
use tempfile::tempdir;

fn run_git(dir: &std::path::Path, args: &[&str]) {
    let status = Command::new("git")
        .args(args)
        .current_dir(dir)
        .env("GIT_AUTHOR_NAME", "Test")
        .env("GIT_AUTHOR_EMAIL", "test@example.com")
        .env("GIT_COMMITTER_NAME", "Test")
        .env("GIT_COMMITTER_EMAIL", "test@example.com")
        .status()
        .expect("git command failed to run");
    assert!(status.success(), "git {args:?} failed");
}

async fn test_store() -> Store {
    let db_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "postgres://localhost/hotspot_test".into());
    let pool = sqlx::PgPool::connect(&db_url).await.unwrap();
    let store = Store::new(pool);
    store.run_migrations().await.unwrap();
    store
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn reingesting_unchanged_history_is_a_no_op() {
    let store = test_store().await;

    let repo_name = format!("ingest-idempotence-{}", std::process::id());
    let project = store
        .create_project(&repo_name, "unused")
        .await
        .unwrap();

    let dir = tempdir().unwrap();
    run_git(dir.path(), &["init", "-q"]);
    std::fs::write(dir.path().join("a.txt"), "one\n").unwrap();
    run_git(dir.path(), &["add", "-A"]);
    run_git(dir.path(), &["commit", "-q", "-m", "first"]);
    std::fs::write(dir.path().join("a.txt"), "one\ntwo\n").unwrap();
    run_git(dir.path(), &["add", "-A"]);
    run_git(dir.path(), &["commit", "-q", "-m", "second"]);

    let cancel = CancellationToken::new();

    let first = hotspot_ingest::ingest(&store, project.id, dir.path().to_path_buf(), &cancel)
        .await
        .unwrap();
    assert!(matches!(
        first,
        hotspot_ingest::IngestOutcome::Completed { commits_ingested: 2 }
    ));

    let commits_after_first = store.recent_commits(project.id, 100).await.unwrap();
    assert_eq!(commits_after_first.len(), 2);

    // Re-ingesting the same repository from the recorded watermark should
    // insert nothing new.
    let second = hotspot_ingest::ingest(&store, project.id, dir.path().to_path_buf(), &cancel)
        .await
        .unwrap();
    assert!(matches!(
        second,
        hotspot_ingest::IngestOutcome::Completed { commits_ingested: 0 }
    ));

    let commits_after_second = store.recent_commits(project.id, 100).await.unwrap();
    assert_eq!(commits_after_second.len(), 2);
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn new_commits_are_picked_up_after_watermark() {
    let store = test_store().await;

    let repo_name = format!("ingest-watermark-{}", std::process::id());
    let project = store
        .create_project(&repo_name, "unused")
        .await
        .unwrap();

    let dir = tempdir().unwrap();
    run_git(dir.path(), &["init", "-q"]);
    std::fs::write(dir.path().join("a.txt"), "one\n").unwrap();
    run_git(dir.path(), &["add", "-A"]);
    run_git(dir.path(), &["commit", "-q", "-m", "first"]);

    let cancel = CancellationToken::new();
    hotspot_ingest::ingest(&store, project.id, dir.path().to_path_buf(), &cancel)
        .await
        .unwrap();
    assert_eq!(store.recent_commits(project.id, 100).await.unwrap().len(), 1);

    std::fs::write(dir.path().join("b.txt"), "three\n").unwrap();
    run_git(dir.path(), &["add", "-A"]);
    run_git(dir.path(), &["commit", "-q", "-m", "third"]);

    let outcome = hotspot_ingest::ingest(&store, project.id, dir.path().to_path_buf(), &cancel)
        .await
        .unwrap();
    assert!(matches!(
        outcome,
        hotspot_ingest::IngestOutcome::Completed { commits_ingested: 1 }
    ));
    assert_eq!(store.recent_commits(project.id, 100).await.unwrap().len(), 2);
}
