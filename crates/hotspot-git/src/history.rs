use chrono::{TimeZone, Utc};
use gix::objs::tree::EntryKind;
use gix::traverse::commit::Sorting;
use gix::ObjectId;

use hotspot_core::types::{RawChange, RawCommit};
use hotspot_core::{Error, Result};

use crate::repository::GitRepository;

/// Walk commit history reachable from HEAD, newest first.
///
/// When `since_hash` is given, the walk stops as soon as that commit is
/// encountered; the commit itself is excluded (exclusive lower bound). A
/// commit that already exists downstream is the caller's concern, not
/// this function's — it always returns every commit it can read.
pub fn read_history(repo: &GitRepository, since_hash: Option<&str>) -> Result<Vec<RawCommit>> {
    let head_id = match repo.inner().head_id() {
        Ok(id) => id,
        Err(_) => return Ok(Vec::new()),
    };

    let since_oid = since_hash
        .map(|h| ObjectId::from_hex(h.as_bytes()))
        .transpose()
        .map_err(|e| Error::InvalidInput(format!("invalid since hash '{since_hash:?}': {e}")))?;

    let walk = repo
        .inner()
        .rev_walk([head_id.detach()])
        .sorting(Sorting::ByCommitTimeNewestFirst)
        .all()
        .map_err(|e| Error::Repository(format!("failed to start history walk: {e}")))?;

    let mut commits = Vec::new();

    for info in walk {
        let info = info.map_err(|e| Error::Repository(format!("revwalk error: {e}")))?;
        let commit_id = info.id;

        if Some(commit_id) == since_oid {
            break;
        }

        let commit = match repo.inner().find_commit(commit_id) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!("skipping unreadable commit {commit_id}: {e}");
                continue;
            }
        };

        let raw = match build_raw_commit(repo, &commit) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("skipping commit {commit_id} with unreadable diff: {e}");
                continue;
            }
        };

        commits.push(raw);
    }

    Ok(commits)
}

fn build_raw_commit(repo: &GitRepository, commit: &gix::Commit<'_>) -> Result<RawCommit> {
    let hash = commit.id().to_hex().to_string();
    let decoded = commit
        .decode()
        .map_err(|e| Error::Repository(format!("failed to decode commit {hash}: {e}")))?;

    let author = decoded.author.name.to_string();
    let authored_at = Utc
        .timestamp_opt(decoded.author.time.seconds, 0)
        .single()
        .unwrap_or_else(Utc::now);
    let message = {
        let msg = decoded.message.to_string();
        if msg.trim().is_empty() {
            None
        } else {
            Some(msg)
        }
    };

    let mut parents = commit.parent_ids();
    let first_parent = parents.next();

    let changes = match first_parent {
        None => root_commit_changes(repo, commit)?,
        Some(parent_id) => {
            let parent_commit = repo
                .inner()
                .find_commit(parent_id.detach())
                .map_err(|e| Error::Repository(format!("failed to find parent of {hash}: {e}")))?;
            diff_against_parent(repo, commit, &parent_commit)?
        }
    };

    Ok(RawCommit {
        hash,
        author,
        authored_at,
        message,
        changes,
    })
}

/// A commit with no parents contributes its entire tree as additions.
fn root_commit_changes(repo: &GitRepository, commit: &gix::Commit<'_>) -> Result<Vec<RawChange>> {
    let tree = commit
        .tree()
        .map_err(|e| Error::Repository(format!("failed to read tree: {e}")))?;

    let entries = tree
        .traverse()
        .breadthfirst
        .files()
        .map_err(|e| Error::Repository(format!("tree traversal failed: {e}")))?;

    let mut changes = Vec::new();
    for entry in entries {
        if entry.mode.is_tree() {
            continue;
        }
        let Some(lines_added) = blob_line_count(repo, entry.oid) else {
            tracing::warn!("skipping unreadable blob for {}", entry.filepath);
            continue;
        };
        let file_path = entry.filepath.to_string();
        changes.push(RawChange {
            file_path,
            lines_added,
            lines_deleted: 0,
        });
    }

    Ok(changes)
}

fn diff_against_parent(
    repo: &GitRepository,
    commit: &gix::Commit<'_>,
    parent: &gix::Commit<'_>,
) -> Result<Vec<RawChange>> {
    let tree = commit
        .tree()
        .map_err(|e| Error::Repository(format!("failed to read tree: {e}")))?;
    let parent_tree = parent
        .tree()
        .map_err(|e| Error::Repository(format!("failed to read parent tree: {e}")))?;

    let mut changes = Vec::new();

    let platform = tree
        .changes()
        .map_err(|e| Error::Repository(format!("failed to diff trees: {e}")))?;

    platform
        .for_each_to_obtain_tree(&parent_tree, |change| {
            use gix::object::tree::diff::Change;

            match change {
                Change::Addition { entry_mode, id, location, .. } => {
                    if entry_mode.kind() != EntryKind::Tree {
                        if let Some(added) = blob_line_count(repo, id.detach()) {
                            changes.push(RawChange {
                                file_path: location.to_string(),
                                lines_added: added,
                                lines_deleted: 0,
                            });
                        }
                    }
                }
                Change::Deletion { entry_mode, id, location, .. } => {
                    if entry_mode.kind() != EntryKind::Tree {
                        if let Some(deleted) = blob_line_count(repo, id.detach()) {
                            changes.push(RawChange {
                                file_path: location.to_string(),
                                lines_added: 0,
                                lines_deleted: deleted,
                            });
                        }
                    }
                }
                Change::Modification {
                    previous_entry_mode,
                    entry_mode,
                    previous_id,
                    id,
                    location,
                    ..
                } => {
                    if entry_mode.kind() != EntryKind::Tree && previous_entry_mode.kind() != EntryKind::Tree {
                        if let Some((added, deleted)) =
                            blob_line_delta(repo, previous_id.detach(), id.detach())
                        {
                            changes.push(RawChange {
                                file_path: location.to_string(),
                                lines_added: added,
                                lines_deleted: deleted,
                            });
                        }
                    }
                }
                Change::Rewrite { .. } => {}
            }

            Ok::<_, std::convert::Infallible>(Default::default())
        })
        .map_err(|e| Error::Repository(format!("failed to enumerate tree changes: {e}")))?;

    Ok(changes)
}

fn blob_line_count(repo: &GitRepository, id: ObjectId) -> Option<i64> {
    let data = repo.inner().find_object(id).ok()?.data.clone();
    let text = String::from_utf8(data).ok()?;
    Some(text.lines().count() as i64)
}

fn blob_line_delta(repo: &GitRepository, old_id: ObjectId, new_id: ObjectId) -> Option<(i64, i64)> {
    let old_data = repo.inner().find_object(old_id).ok()?.data.clone();
    let new_data = repo.inner().find_object(new_id).ok()?.data.clone();

    let old_text = String::from_utf8(old_data).ok()?;
    let new_text = String::from_utf8(new_data).ok()?;

    let diff = similar::TextDiff::from_lines(&old_text, &new_text);
    let mut added = 0i64;
    let mut deleted = 0i64;
    for change in diff.iter_all_changes() {
        match change.tag() {
            similar::ChangeTag::Insert => added += 1,
            similar::ChangeTag::Delete => deleted += 1,
            similar::ChangeTag::Equal => {}
        }
    }

    Some((added, deleted))
}
