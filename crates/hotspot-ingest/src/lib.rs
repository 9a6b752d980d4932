use std::path::PathBuf;

use hotspot_core::types::ProjectId;
use hotspot_core::{CancellationToken, Error, Result};
use hotspot_git::GitRepository;
use hotspot_store::Store;

/// How many commits (with their changes) are buffered before a transactional
/// batch is flushed to the store. Bounds memory use on large histories.
const BATCH_SIZE: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    Completed { commits_ingested: u64 },
    Cancelled { commits_ingested: u64 },
}

/// Bring a project's persisted history up to date with its repository on
/// disk.
///
/// Loads the project, validates the repository, pulls history since the
/// recorded watermark (or from the beginning if unset), persists it in
/// bounded transactional batches, and advances the watermark to the newest
/// commit that was actually persisted. Checks `cancel` between batches and
/// before reading history; a cancellation after at least one batch has
/// committed leaves that progress in place.
pub async fn ingest(
    store: &Store,
    project_id: ProjectId,
    repo_path: PathBuf,
    cancel: &CancellationToken,
) -> Result<IngestOutcome> {
    let project = store.get_project(project_id).await?;
    let since_hash = project.watermark_hash.clone();

    if cancel.is_cancelled() {
        return Ok(IngestOutcome::Cancelled { commits_ingested: 0 });
    }

    let repo_path_for_blocking = repo_path.clone();
    let since_hash_for_blocking = since_hash.clone();
    let commits = tokio::task::spawn_blocking(move || -> Result<_> {
        GitRepository::validate(&repo_path_for_blocking)?;
        let repo = GitRepository::open(&repo_path_for_blocking)?;
        hotspot_git::read_history(&repo, since_hash_for_blocking.as_deref())
    })
    .await
    .map_err(|e| Error::Internal(format!("git history task panicked: {e}")))??;

    if commits.is_empty() {
        return Ok(IngestOutcome::Completed { commits_ingested: 0 });
    }

    // `read_history` emits newest-first; the very first commit in the whole
    // sequence is the new watermark candidate once every batch commits.
    let newest_hash = commits[0].hash.clone();

    let mut total_inserted = 0u64;
    let mut cancelled = false;

    for batch in commits.chunks(BATCH_SIZE) {
        if cancel.is_cancelled() {
            cancelled = true;
            break;
        }

        let inserted = store.insert_batch(project_id, batch).await?;
        total_inserted += inserted;

        tracing::info!(
            project_id,
            batch_len = batch.len(),
            inserted,
            "persisted commit batch"
        );
    }

    if total_inserted > 0 {
        store.update_watermark(project_id, &newest_hash).await?;
    }

    if cancelled {
        return Ok(IngestOutcome::Cancelled {
            commits_ingested: total_inserted,
        });
    }

    Ok(IngestOutcome::Completed {
        commits_ingested: total_inserted,
    })
}
