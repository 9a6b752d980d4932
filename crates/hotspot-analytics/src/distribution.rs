use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::queries::ChangeRow;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorShare {
    pub author: String,
    pub changes: i64,
    pub percentage: f64,
}

#[derive(Debug, Clone)]
pub struct FileAuthorStats {
    pub file_path: String,
    pub authors: Vec<AuthorShare>,
    pub last_modified: DateTime<Utc>,
    pub total_commits: i64,
}

/// Per-file author contribution distribution: each author's share of the
/// changes made to that file, sorted by percentage descending. Shared by
/// file-ownership, author-hotspots, and bus-factor.
pub fn compute_file_author_stats(rows: &[ChangeRow]) -> Vec<FileAuthorStats> {
    struct FileAgg {
        by_author: HashMap<String, i64>,
        commits: HashSet<i64>,
        last_modified: DateTime<Utc>,
    }

    let mut by_file: HashMap<&str, FileAgg> = HashMap::new();

    for row in rows {
        let agg = by_file.entry(row.file_path.as_str()).or_insert_with(|| FileAgg {
            by_author: HashMap::new(),
            commits: HashSet::new(),
            last_modified: row.authored_at,
        });
        *agg.by_author.entry(row.author.clone()).or_insert(0) += 1;
        agg.commits.insert(row.commit_id);
        if row.authored_at > agg.last_modified {
            agg.last_modified = row.authored_at;
        }
    }

    by_file
        .into_iter()
        .map(|(file_path, agg)| {
            let total: i64 = agg.by_author.values().sum();
            let mut authors: Vec<AuthorShare> = agg
                .by_author
                .into_iter()
                .map(|(author, changes)| AuthorShare {
                    author,
                    changes,
                    percentage: if total == 0 {
                        0.0
                    } else {
                        (changes as f64 / total as f64) * 100.0
                    },
                })
                .collect();
            authors.sort_by(|a, b| {
                b.percentage
                    .partial_cmp(&a.percentage)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.author.cmp(&b.author))
            });

            FileAuthorStats {
                file_path: file_path.to_string(),
                authors,
                last_modified: agg.last_modified,
                total_commits: agg.commits.len() as i64,
            }
        })
        .collect()
}

/// The smallest `k` such that the top `k` authors' cumulative ownership
/// reaches or exceeds 50%. A file with no authors has bus factor 0.
pub fn bus_factor(authors: &[AuthorShare]) -> i64 {
    if authors.is_empty() {
        return 0;
    }
    let mut cumulative = 0.0;
    for (i, author) in authors.iter().enumerate() {
        cumulative += author.percentage;
        if cumulative >= 50.0 {
            return (i + 1) as i64;
        }
    }
    authors.len() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_authors_has_bus_factor_zero() {
        assert_eq!(bus_factor(&[]), 0);
    }

    #[test]
    fn one_dominant_author_has_bus_factor_one() {
        let authors = vec![
            AuthorShare { author: "a".into(), changes: 9, percentage: 90.0 },
            AuthorShare { author: "b".into(), changes: 1, percentage: 10.0 },
        ];
        assert_eq!(bus_factor(&authors), 1);
    }

    #[test]
    fn percentages_sum_to_roughly_one_hundred() {
        let rows = vec![
            ChangeRow {
                commit_id: 1,
                hash: "h1".into(),
                author: "a".into(),
                authored_at: chrono::Utc::now(),
                file_path: "f.rs".into(),
                lines_added: 1,
                lines_deleted: 0,
            },
            ChangeRow {
                commit_id: 2,
                hash: "h2".into(),
                author: "b".into(),
                authored_at: chrono::Utc::now(),
                file_path: "f.rs".into(),
                lines_added: 1,
                lines_deleted: 0,
            },
            ChangeRow {
                commit_id: 3,
                hash: "h3".into(),
                author: "b".into(),
                authored_at: chrono::Utc::now(),
                file_path: "f.rs".into(),
                lines_added: 1,
                lines_deleted: 0,
            },
        ];
        let stats = compute_file_author_stats(&rows);
        let total: f64 = stats[0].authors.iter().map(|a| a.percentage).sum();
        assert!((total - 100.0).abs() < 1e-9);
        assert_eq!(stats[0].authors[0].author, "b");
    }
}
