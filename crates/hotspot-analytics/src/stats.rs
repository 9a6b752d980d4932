use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use hotspot_core::Result;
use hotspot_store::Store;

use crate::queries::{global_hotspot_count, ChangeRow};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProjectStats {
    pub total_commits: i64,
    pub total_authors: i64,
    pub total_files: i64,
    pub total_lines_added: i64,
    pub total_lines_deleted: i64,
    pub last_commit_at: Option<DateTime<Utc>>,
    pub hotspot_count: i64,
}

pub fn compute_project_stats(rows: &[ChangeRow]) -> ProjectStats {
    use std::collections::{HashMap, HashSet};

    let mut commits = HashSet::new();
    let mut authors = HashSet::new();
    let mut commits_per_file: HashMap<&str, HashSet<i64>> = HashMap::new();
    let mut added = 0i64;
    let mut deleted = 0i64;
    let mut last_commit_at: Option<DateTime<Utc>> = None;

    for row in rows {
        commits.insert(row.commit_id);
        authors.insert(row.author.as_str());
        commits_per_file
            .entry(row.file_path.as_str())
            .or_default()
            .insert(row.commit_id);
        added += row.lines_added;
        deleted += row.lines_deleted;
        last_commit_at = Some(match last_commit_at {
            Some(current) if current >= row.authored_at => current,
            _ => row.authored_at,
        });
    }

    let hotspot_count = commits_per_file.values().filter(|c| c.len() > 1).count() as i64;

    ProjectStats {
        total_commits: commits.len() as i64,
        total_authors: authors.len() as i64,
        total_files: commits_per_file.len() as i64,
        total_lines_added: added,
        total_lines_deleted: deleted,
        last_commit_at,
        hotspot_count,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DashboardStats {
    pub total_projects: i64,
    pub total_commits: i64,
    pub total_authors: i64,
    pub total_files: i64,
    pub hotspot_count: i64,
}

pub async fn compute_dashboard_stats(store: &Store) -> Result<DashboardStats> {
    let (total_projects,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM projects")
        .fetch_one(store.pool())
        .await?;
    let (total_commits,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM commits")
        .fetch_one(store.pool())
        .await?;
    let (total_authors,): (i64,) = sqlx::query_as("SELECT COUNT(DISTINCT author) FROM commits")
        .fetch_one(store.pool())
        .await?;
    let (total_files,): (i64,) = sqlx::query_as("SELECT COUNT(DISTINCT file_path) FROM changes")
        .fetch_one(store.pool())
        .await?;

    let hotspot_count = global_hotspot_count(store, 2).await?;

    Ok(DashboardStats {
        total_projects,
        total_commits,
        total_authors,
        total_files,
        hotspot_count,
    })
}
