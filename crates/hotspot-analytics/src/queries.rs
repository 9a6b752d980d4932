use chrono::{DateTime, Utc};
use sqlx::{Postgres, QueryBuilder};

use hotspot_core::types::{AnalyticsFilter, ProjectId};
use hotspot_core::Result;
use hotspot_store::Store;

/// One (commit, file) row, already filtered by the caller's date range,
/// path substring, and file-type constraints. Every analytics view is
/// built by grouping these rows in Rust rather than in SQL, which keeps
/// the aggregation logic (hotspot ranking, ownership percentages, bus
/// factor, temporal coupling) in one place and testable without a
/// database.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ChangeRow {
    pub commit_id: i64,
    pub hash: String,
    pub author: String,
    pub authored_at: DateTime<Utc>,
    pub file_path: String,
    pub lines_added: i64,
    pub lines_deleted: i64,
}

pub async fn fetch_filtered_changes(
    store: &Store,
    project_id: ProjectId,
    filter: &AnalyticsFilter,
) -> Result<Vec<ChangeRow>> {
    let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
        "SELECT c.id as commit_id, c.hash, c.author, c.authored_at, \
         ch.file_path, ch.lines_added, ch.lines_deleted \
         FROM commits c JOIN changes ch ON ch.commit_id = c.id \
         WHERE c.project_id = ",
    );
    qb.push_bind(project_id);

    push_common_filters(&mut qb, filter);

    let rows = qb
        .build_query_as::<ChangeRow>()
        .fetch_all(store.pool())
        .await?;

    Ok(rows)
}

fn push_common_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &AnalyticsFilter) {
    if let Some(start) = filter.date_range.start {
        qb.push(" AND c.authored_at >= ").push_bind(start);
    }
    if let Some(end) = filter.date_range.end {
        // `end` is normalized to the exclusive start of the day after the
        // requested end date, so the whole end day is included.
        qb.push(" AND c.authored_at < ").push_bind(end);
    }
    if let Some(path) = &filter.path_substring {
        qb.push(" AND ch.file_path ILIKE ")
            .push_bind(format!("%{path}%"));
    }
    if !filter.file_types.is_empty() {
        qb.push(" AND (");
        for (i, ext) in filter.file_types.iter().enumerate() {
            if i > 0 {
                qb.push(" OR ");
            }
            qb.push("ch.file_path LIKE ").push_bind(format!("%.{ext}"));
        }
        qb.push(")");
    }
}

/// Scalar count of distinct `(project_id, file_path)` pairs whose change
/// count exceeds `threshold`, across every project. Backs the dashboard's
/// global hotspot count.
pub async fn global_hotspot_count(store: &Store, threshold: i64) -> Result<i64> {
    let (count,): (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*) FROM (
            SELECT c.project_id, ch.file_path, COUNT(DISTINCT c.id) AS cnt
            FROM commits c JOIN changes ch ON ch.commit_id = c.id
            GROUP BY c.project_id, ch.file_path
            HAVING COUNT(DISTINCT c.id) > $1
        ) hot
        "#,
    )
    .bind(threshold)
    .fetch_one(store.pool())
    .await?;

    Ok(count)
}
