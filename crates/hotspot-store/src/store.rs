use chrono::{DateTime, Utc};
use sqlx::PgPool;

use hotspot_core::types::{Change, Commit, Project, ProjectId, RawCommit};
use hotspot_core::{Error, Result};

/// The embedded migration set, run at process start via
/// `Store::run_migrations`.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// PostgreSQL-backed persistence for projects, commits, and changes.
#[derive(Clone)]
pub struct Store {
    pool: PgPool,
}

impl Store {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn run_migrations(&self) -> Result<()> {
        MIGRATOR.run(&self.pool).await?;
        Ok(())
    }

    pub async fn create_project(&self, name: &str, repo_path: &str) -> Result<Project> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (name, repo_path)
            VALUES ($1, $2)
            RETURNING id, name, repo_path, watermark_hash, created_at
            "#,
        )
        .bind(name)
        .bind(repo_path)
        .fetch_one(&self.pool)
        .await?;

        Ok(project)
    }

    pub async fn get_project(&self, id: ProjectId) -> Result<Project> {
        sqlx::query_as::<_, Project>(
            "SELECT id, name, repo_path, watermark_hash, created_at FROM projects WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::ProjectNotFound(id.to_string()))
    }

    pub async fn list_projects(&self) -> Result<Vec<Project>> {
        let projects = sqlx::query_as::<_, Project>(
            "SELECT id, name, repo_path, watermark_hash, created_at FROM projects ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(projects)
    }

    pub async fn update_watermark(&self, id: ProjectId, hash: &str) -> Result<()> {
        let result = sqlx::query("UPDATE projects SET watermark_hash = $1 WHERE id = $2")
            .bind(hash)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::ProjectNotFound(id.to_string()));
        }

        Ok(())
    }

    /// Insert a batch of commits and their changes transactionally.
    ///
    /// Commits are inserted with `ON CONFLICT (project_id, hash) DO NOTHING`
    /// so re-ingesting overlapping history is a no-op. Returns the number of
    /// commits actually inserted (excludes conflicts).
    pub async fn insert_batch(&self, project_id: ProjectId, commits: &[RawCommit]) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0u64;

        for raw in commits {
            let row: Option<(i64,)> = sqlx::query_as(
                r#"
                INSERT INTO commits (project_id, hash, author, authored_at, message)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (project_id, hash) DO NOTHING
                RETURNING id
                "#,
            )
            .bind(project_id)
            .bind(&raw.hash)
            .bind(&raw.author)
            .bind(raw.authored_at)
            .bind(&raw.message)
            .fetch_optional(&mut *tx)
            .await?;

            let commit_id = match row {
                Some((id,)) => id,
                None => continue,
            };

            inserted += 1;

            for change in &raw.changes {
                sqlx::query(
                    r#"
                    INSERT INTO changes (commit_id, file_path, lines_added, lines_deleted)
                    VALUES ($1, $2, $3, $4)
                    "#,
                )
                .bind(commit_id)
                .bind(&change.file_path)
                .bind(change.lines_added)
                .bind(change.lines_deleted)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;
        Ok(inserted)
    }

    pub async fn recent_commits(&self, project_id: ProjectId, limit: i64) -> Result<Vec<Commit>> {
        let commits = sqlx::query_as::<_, Commit>(
            r#"
            SELECT id, project_id, hash, author, authored_at, message
            FROM commits
            WHERE project_id = $1
            ORDER BY authored_at DESC
            LIMIT $2
            "#,
        )
        .bind(project_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(commits)
    }

    pub async fn changes_for_commit(&self, commit_id: i64) -> Result<Vec<Change>> {
        let changes = sqlx::query_as::<_, Change>(
            "SELECT id, commit_id, file_path, lines_added, lines_deleted FROM changes WHERE commit_id = $1",
        )
        .bind(commit_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(changes)
    }

    pub async fn newest_commit_timestamp(&self, project_id: ProjectId) -> Result<Option<DateTime<Utc>>> {
        let row: (Option<DateTime<Utc>>,) =
            sqlx::query_as("SELECT MAX(authored_at) FROM commits WHERE project_id = $1")
                .bind(project_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(row.0)
    }
}
