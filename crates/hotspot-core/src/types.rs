use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type ProjectId = i64;
pub type CommitId = i64;
pub type ChangeId = i64;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub repo_path: String,
    pub watermark_hash: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Commit {
    pub id: CommitId,
    pub project_id: ProjectId,
    pub hash: String,
    pub author: String,
    pub authored_at: DateTime<Utc>,
    pub message: Option<String>,
}

/// A commit as produced by the git driver, before it has been assigned a
/// database id.
#[derive(Debug, Clone)]
pub struct RawCommit {
    pub hash: String,
    pub author: String,
    pub authored_at: DateTime<Utc>,
    pub message: Option<String>,
    pub changes: Vec<RawChange>,
}

#[derive(Debug, Clone)]
pub struct RawChange {
    pub file_path: String,
    pub lines_added: i64,
    pub lines_deleted: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Change {
    pub id: ChangeId,
    pub commit_id: CommitId,
    pub file_path: String,
    pub lines_added: i64,
    pub lines_deleted: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    High,
    Medium,
    Low,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        };
        write!(f, "{s}")
    }
}

impl FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            other => Err(format!("unknown risk level: {other}")),
        }
    }
}

/// Parsed form of the `riskLevel` query parameter, which also accepts `all`
/// to mean "no filtering".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskLevelFilter {
    All,
    Only(RiskLevel),
}

impl FromStr for RiskLevelFilter {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("all") {
            Ok(Self::All)
        } else {
            Ok(Self::Only(s.parse()?))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Queued,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Cancelled)
    }

    pub fn is_active(self) -> bool {
        matches!(self, Self::Queued | Self::Running)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatus {
    pub project_id: ProjectId,
    pub state: JobState,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

/// An inclusive, optionally-open date range used across analytics filters.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct AnalyticsFilter {
    pub date_range: DateRange,
    pub path_substring: Option<String>,
    pub file_types: Vec<String>,
    pub risk_level: Option<RiskLevelFilter>,
}

#[derive(Debug, Clone)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self { page: 1, limit: 20 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationMeta {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
}

impl PaginationMeta {
    pub fn new(page: Pagination, total: u64) -> Self {
        let total_pages = if page.limit == 0 {
            0
        } else {
            total.div_ceil(page.limit as u64)
        };
        Self {
            page: page.page,
            limit: page.limit,
            total,
            total_pages,
        }
    }
}
