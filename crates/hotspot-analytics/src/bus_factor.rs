use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use hotspot_core::types::{RiskLevel, RiskLevelFilter};

use crate::distribution::{compute_file_author_stats, bus_factor as compute_bus_factor, AuthorShare};
use crate::queries::ChangeRow;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileBusFactor {
    pub file_path: String,
    pub bus_factor: i64,
    pub top_authors: Vec<AuthorShare>,
    pub authors: Vec<AuthorShare>,
    pub last_modified: DateTime<Utc>,
    pub total_commits: i64,
    pub risk_level: RiskLevel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusFactorSummary {
    pub total_files: i64,
    pub high_risk_files: i64,
    pub medium_risk_files: i64,
    pub low_risk_files: i64,
    pub histogram: Vec<(i64, i64)>,
    pub mean_bus_factor: f64,
}

pub fn risk_for_bus_factor(factor: i64) -> RiskLevel {
    match factor {
        1 => RiskLevel::High,
        2 => RiskLevel::Medium,
        _ => RiskLevel::Low,
    }
}

pub fn compute_bus_factors(
    rows: &[ChangeRow],
    risk_filter: Option<RiskLevelFilter>,
) -> (Vec<FileBusFactor>, BusFactorSummary) {
    let mut files: Vec<FileBusFactor> = compute_file_author_stats(rows)
        .into_iter()
        .map(|s| {
            let factor = compute_bus_factor(&s.authors);
            FileBusFactor {
                file_path: s.file_path,
                bus_factor: factor,
                top_authors: s.authors.iter().take(5).cloned().collect(),
                authors: s.authors,
                last_modified: s.last_modified,
                total_commits: s.total_commits,
                risk_level: risk_for_bus_factor(factor),
            }
        })
        .filter(|f| match risk_filter {
            Some(RiskLevelFilter::Only(level)) => f.risk_level == level,
            _ => true,
        })
        .collect();

    files.sort_by(|a, b| a.file_path.cmp(&b.file_path));

    let mut histogram_map = std::collections::BTreeMap::new();
    let mut high = 0i64;
    let mut medium = 0i64;
    let mut low = 0i64;
    let mut total_factor = 0i64;

    for file in &files {
        *histogram_map.entry(file.bus_factor).or_insert(0i64) += 1;
        total_factor += file.bus_factor;
        match file.risk_level {
            RiskLevel::High => high += 1,
            RiskLevel::Medium => medium += 1,
            RiskLevel::Low => low += 1,
        }
    }

    let summary = BusFactorSummary {
        total_files: files.len() as i64,
        high_risk_files: high,
        medium_risk_files: medium,
        low_risk_files: low,
        histogram: histogram_map.into_iter().collect(),
        mean_bus_factor: if files.is_empty() {
            0.0
        } else {
            total_factor as f64 / files.len() as f64
        },
    };

    (files, summary)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn row(commit_id: i64, author: &str) -> ChangeRow {
        ChangeRow {
            commit_id,
            hash: format!("hash{commit_id}"),
            author: author.to_string(),
            authored_at: Utc::now(),
            file_path: "a.rs".to_string(),
            lines_added: 1,
            lines_deleted: 0,
        }
    }

    #[test]
    fn single_author_has_bus_factor_one() {
        let rows = vec![row(1, "alice"), row(2, "alice"), row(3, "alice")];
        let (files, _) = compute_bus_factors(&rows, None);
        assert_eq!(files[0].bus_factor, 1);
        assert_eq!(files[0].risk_level, RiskLevel::High);
    }

    #[test]
    fn even_split_needs_two_authors_to_reach_half() {
        let rows = vec![row(1, "alice"), row(2, "bob")];
        let (files, _) = compute_bus_factors(&rows, None);
        assert_eq!(files[0].bus_factor, 1);
    }

    #[test]
    fn three_way_split_needs_two_to_cross_fifty_percent() {
        let rows = vec![row(1, "alice"), row(2, "bob"), row(3, "carol")];
        let (files, _) = compute_bus_factors(&rows, None);
        assert_eq!(files[0].bus_factor, 2);
        assert_eq!(files[0].risk_level, RiskLevel::Medium);
    }
}
