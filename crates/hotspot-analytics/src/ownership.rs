use serde::{Deserialize, Serialize};

use hotspot_core::types::RiskLevel;

use crate::distribution::{compute_file_author_stats, AuthorShare, FileAuthorStats};
use crate::queries::ChangeRow;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileOwnership {
    pub file_path: String,
    pub authors: Vec<AuthorShare>,
    pub last_modified: chrono::DateTime<chrono::Utc>,
    pub risk_level: RiskLevel,
}

pub fn ownership_risk(authors: &[AuthorShare]) -> RiskLevel {
    let top_two: f64 = authors.iter().take(2).map(|a| a.percentage).sum();
    if top_two > 90.0 {
        RiskLevel::High
    } else if top_two > 70.0 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

pub fn compute_file_ownership(rows: &[ChangeRow]) -> Vec<FileOwnership> {
    let mut stats = compute_file_author_stats(rows);
    stats.sort_by(|a, b| a.file_path.cmp(&b.file_path));

    stats
        .into_iter()
        .map(|s| FileOwnership {
            risk_level: ownership_risk(&s.authors),
            file_path: s.file_path,
            authors: s.authors,
            last_modified: s.last_modified,
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorHotspotCount {
    pub author: String,
    pub hotspot_file_count: i64,
}

/// For each author, the number of distinct hotspot files (change count
/// above `hotspot_threshold`) they have contributed to, descending,
/// truncated to `top_n`.
pub fn compute_author_hotspots(
    rows: &[ChangeRow],
    hotspot_threshold: i64,
    top_n: usize,
) -> Vec<AuthorHotspotCount> {
    use std::collections::{HashMap, HashSet};

    let file_stats: HashMap<String, FileAuthorStats> = compute_file_author_stats(rows)
        .into_iter()
        .map(|s| (s.file_path.clone(), s))
        .collect();

    let mut per_author: HashMap<&str, HashSet<&str>> = HashMap::new();

    for stat in file_stats.values() {
        if stat.total_commits <= hotspot_threshold {
            continue;
        }
        for author in &stat.authors {
            per_author
                .entry(author.author.as_str())
                .or_default()
                .insert(stat.file_path.as_str());
        }
    }

    let mut result: Vec<AuthorHotspotCount> = per_author
        .into_iter()
        .map(|(author, files)| AuthorHotspotCount {
            author: author.to_string(),
            hotspot_file_count: files.len() as i64,
        })
        .collect();

    result.sort_by(|a, b| {
        b.hotspot_file_count
            .cmp(&a.hotspot_file_count)
            .then_with(|| a.author.cmp(&b.author))
    });
    result.truncate(top_n);
    result
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeRiskSummary {
    pub total_files: i64,
    pub high_risk_files: i64,
    pub medium_risk_files: i64,
    pub low_risk_files: i64,
}

pub fn knowledge_risk_summary(ownership: &[FileOwnership]) -> KnowledgeRiskSummary {
    let mut summary = KnowledgeRiskSummary {
        total_files: ownership.len() as i64,
        high_risk_files: 0,
        medium_risk_files: 0,
        low_risk_files: 0,
    };
    for file in ownership {
        match file.risk_level {
            RiskLevel::High => summary.high_risk_files += 1,
            RiskLevel::Medium => summary.medium_risk_files += 1,
            RiskLevel::Low => summary.low_risk_files += 1,
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    fn share(author: &str, pct: f64) -> AuthorShare {
        AuthorShare {
            author: author.to_string(),
            changes: pct as i64,
            percentage: pct,
        }
    }

    #[test]
    fn ownership_risk_thresholds() {
        assert_eq!(ownership_risk(&[share("a", 95.0), share("b", 5.0)]), RiskLevel::High);
        assert_eq!(ownership_risk(&[share("a", 50.0), share("b", 30.0)]), RiskLevel::Medium);
        assert_eq!(ownership_risk(&[share("a", 40.0), share("b", 30.0)]), RiskLevel::Low);
    }
}
