use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use hotspot_core::types::AnalyticsFilter;

use crate::queries::ChangeRow;

pub const MAX_TEMPORAL_COUPLING_LIMIT: u32 = 200;

#[derive(Debug, Clone, Default)]
pub struct TemporalCouplingQuery {
    pub filter: AnalyticsFilter,
    pub limit: u32,
    pub min_shared_commits: i64,
    pub min_coupling_score: f64,
}

impl TemporalCouplingQuery {
    pub fn clamped_limit(&self) -> u32 {
        self.limit.min(MAX_TEMPORAL_COUPLING_LIMIT).max(1)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoupledPair {
    pub file_a: String,
    pub file_b: String,
    pub shared_commits: i64,
    pub count_a: i64,
    pub count_b: i64,
    pub score: f64,
}

pub fn compute_temporal_coupling(rows: &[ChangeRow], query: &TemporalCouplingQuery) -> Vec<CoupledPair> {
    let mut files_per_commit: HashMap<i64, HashSet<&str>> = HashMap::new();
    let mut commits_per_file: HashMap<&str, HashSet<i64>> = HashMap::new();

    for row in rows {
        files_per_commit
            .entry(row.commit_id)
            .or_default()
            .insert(row.file_path.as_str());
        commits_per_file
            .entry(row.file_path.as_str())
            .or_default()
            .insert(row.commit_id);
    }

    let mut shared: HashMap<(String, String), i64> = HashMap::new();

    for files in files_per_commit.values() {
        let mut sorted: Vec<&&str> = files.iter().collect();
        sorted.sort();
        for i in 0..sorted.len() {
            for j in (i + 1)..sorted.len() {
                let key = (sorted[i].to_string(), sorted[j].to_string());
                *shared.entry(key).or_insert(0) += 1;
            }
        }
    }

    let mut pairs: Vec<CoupledPair> = shared
        .into_iter()
        .filter_map(|((file_a, file_b), shared_commits)| {
            let count_a = commits_per_file.get(file_a.as_str()).map_or(0, |s| s.len() as i64);
            let count_b = commits_per_file.get(file_b.as_str()).map_or(0, |s| s.len() as i64);
            let denom = count_a.max(count_b);
            let score = if denom == 0 {
                0.0
            } else {
                shared_commits as f64 / denom as f64
            };

            if shared_commits < query.min_shared_commits {
                return None;
            }
            if score < query.min_coupling_score {
                return None;
            }

            Some(CoupledPair {
                file_a,
                file_b,
                shared_commits,
                count_a,
                count_b,
                score,
            })
        })
        .collect();

    pairs.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.shared_commits.cmp(&a.shared_commits))
            .then_with(|| a.file_a.cmp(&b.file_a))
            .then_with(|| a.file_b.cmp(&b.file_b))
    });

    pairs.truncate(query.clamped_limit() as usize);
    pairs
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn row(commit_id: i64, file_path: &str) -> ChangeRow {
        ChangeRow {
            commit_id,
            hash: format!("hash{commit_id}"),
            author: "alice".to_string(),
            authored_at: Utc::now(),
            file_path: file_path.to_string(),
            lines_added: 1,
            lines_deleted: 0,
        }
    }

    #[test]
    fn scores_use_max_normalization() {
        // a,b share 5 commits; a appears in 10, b in 6; a,c share 3; a in 10, c in 4.
        let mut rows = Vec::new();
        for i in 0..5 {
            rows.push(row(i, "a"));
            rows.push(row(i, "b"));
        }
        for i in 5..10 {
            rows.push(row(i, "a"));
        }
        for i in 10..13 {
            rows.push(row(i, "a"));
            rows.push(row(i, "c"));
        }

        let query = TemporalCouplingQuery {
            limit: 200,
            min_shared_commits: 1,
            min_coupling_score: 0.0,
            ..Default::default()
        };
        let pairs = compute_temporal_coupling(&rows, &query);

        let ab = pairs.iter().find(|p| p.file_a == "a" && p.file_b == "b").unwrap();
        assert_eq!(ab.shared_commits, 5);
        assert_eq!(ab.count_a, 10);
        assert_eq!(ab.count_b, 6);
        assert!((ab.score - 0.5).abs() < 1e-9);

        // (a,b) with score 0.5 ranks ahead of (a,c) with score 0.3.
        assert_eq!(pairs[0].file_a, "a");
        assert_eq!(pairs[0].file_b, "b");
    }

    #[test]
    fn filters_below_minimum_shared_commits() {
        let rows = vec![row(1, "a"), row(1, "b")];
        let query = TemporalCouplingQuery {
            limit: 200,
            min_shared_commits: 2,
            min_coupling_score: 0.0,
            ..Default::default()
        };
        assert!(compute_temporal_coupling(&rows, &query).is_empty());
    }

    #[test]
    fn limit_clamps_to_max() {
        let query = TemporalCouplingQuery {
            limit: 10_000,
            ..Default::default()
        };
        assert_eq!(query.clamped_limit(), MAX_TEMPORAL_COUPLING_LIMIT);
    }
}
