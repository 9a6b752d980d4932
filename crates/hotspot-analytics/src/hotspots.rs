use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use hotspot_core::types::{AnalyticsFilter, Pagination, PaginationMeta, RiskLevel, RiskLevelFilter};

use crate::queries::ChangeRow;

#[derive(Debug, Clone, Default)]
pub struct HotspotsQuery {
    pub filter: AnalyticsFilter,
    pub pagination: Pagination,
    pub min_changes: Option<i64>,
    /// Accepted for API compatibility; the store has no complexity
    /// measurement to filter on, so this is never consulted.
    pub min_complexity: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hotspot {
    pub file_path: String,
    pub change_count: i64,
    pub total_changes: i64,
    pub author_count: i64,
    pub last_modified: DateTime<Utc>,
    pub risk_level: RiskLevel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HotspotsPage {
    pub hotspots: Vec<Hotspot>,
    pub pagination: PaginationMeta,
}

pub fn risk_for_change_count(change_count: i64) -> RiskLevel {
    if change_count > 10 {
        RiskLevel::High
    } else if change_count > 5 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

pub fn compute_hotspots(rows: &[ChangeRow], query: &HotspotsQuery) -> HotspotsPage {
    struct Agg {
        commits: HashSet<i64>,
        total_changes: i64,
        authors: HashSet<String>,
        last_modified: DateTime<Utc>,
    }

    let mut by_file: HashMap<&str, Agg> = HashMap::new();

    for row in rows {
        let agg = by_file.entry(row.file_path.as_str()).or_insert_with(|| Agg {
            commits: HashSet::new(),
            total_changes: 0,
            authors: HashSet::new(),
            last_modified: row.authored_at,
        });
        agg.commits.insert(row.commit_id);
        agg.total_changes += row.lines_added + row.lines_deleted;
        agg.authors.insert(row.author.clone());
        if row.authored_at > agg.last_modified {
            agg.last_modified = row.authored_at;
        }
    }

    let mut hotspots: Vec<Hotspot> = by_file
        .into_iter()
        .filter_map(|(file_path, agg)| {
            let change_count = agg.commits.len() as i64;
            if change_count <= 1 {
                return None;
            }
            if let Some(min) = query.min_changes {
                if change_count < min {
                    return None;
                }
            }
            let risk_level = risk_for_change_count(change_count);
            if let Some(RiskLevelFilter::Only(level)) = query.filter.risk_level {
                if level != risk_level {
                    return None;
                }
            }
            Some(Hotspot {
                file_path: file_path.to_string(),
                change_count,
                total_changes: agg.total_changes,
                author_count: agg.authors.len() as i64,
                last_modified: agg.last_modified,
                risk_level,
            })
        })
        .collect();

    hotspots.sort_by(|a, b| {
        b.total_changes
            .cmp(&a.total_changes)
            .then_with(|| b.change_count.cmp(&a.change_count))
            .then_with(|| a.file_path.cmp(&b.file_path))
    });

    let total = hotspots.len() as u64;
    let page = query.pagination.page.max(1);
    let limit = query.pagination.limit.max(1);
    let start = ((page - 1) as usize) * (limit as usize);
    let page_rows = if start >= hotspots.len() {
        Vec::new()
    } else {
        let end = (start + limit as usize).min(hotspots.len());
        hotspots[start..end].to_vec()
    };

    HotspotsPage {
        hotspots: page_rows,
        pagination: PaginationMeta::new(
            Pagination {
                page,
                limit,
            },
            total,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(commit_id: i64, file_path: &str, author: &str, added: i64, deleted: i64) -> ChangeRow {
        ChangeRow {
            commit_id,
            hash: format!("hash{commit_id}"),
            author: author.to_string(),
            authored_at: Utc::now(),
            file_path: file_path.to_string(),
            lines_added: added,
            lines_deleted: deleted,
        }
    }

    #[test]
    fn files_touched_once_are_excluded() {
        let rows = vec![row(1, "a.rs", "alice", 1, 0)];
        let page = compute_hotspots(&rows, &HotspotsQuery::default());
        assert!(page.hotspots.is_empty());
    }

    #[test]
    fn ranks_by_total_changes_descending_with_deterministic_ties() {
        let rows = vec![
            row(1, "a.rs", "alice", 10, 0),
            row(2, "a.rs", "bob", 10, 0),
            row(1, "b.rs", "alice", 5, 0),
            row(2, "b.rs", "bob", 5, 0),
            row(3, "b.rs", "bob", 10, 0),
        ];
        let page = compute_hotspots(&rows, &HotspotsQuery::default());
        assert_eq!(page.hotspots[0].file_path, "b.rs");
        assert_eq!(page.hotspots[1].file_path, "a.rs");
    }

    #[test]
    fn risk_classification_thresholds() {
        assert_eq!(risk_for_change_count(11), RiskLevel::High);
        assert_eq!(risk_for_change_count(6), RiskLevel::Medium);
        assert_eq!(risk_for_change_count(2), RiskLevel::Low);
    }

    #[test]
    fn pagination_clamps_to_available_rows() {
        let mut rows = Vec::new();
        for i in 0..5 {
            rows.push(row(i, "a.rs", "alice", 1, 0));
            rows.push(row(i, "b.rs", "alice", 1, 0));
        }
        let query = HotspotsQuery {
            pagination: Pagination { page: 5, limit: 1 },
            ..Default::default()
        };
        let page = compute_hotspots(&rows, &query);
        assert!(page.hotspots.is_empty());
        assert_eq!(page.pagination.total, 2);
    }
}
