use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::Deserialize;

use hotspot_core::types::{AnalyticsFilter, DateRange, Pagination, RiskLevelFilter};
use hotspot_core::{Error, Result};

/// Raw query-string shape shared by every analytics route. Individual
/// handlers pick the fields they need.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub path: Option<String>,
    pub file_types: Option<String>,
    pub risk_level: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub min_changes: Option<i64>,
    pub min_complexity: Option<i64>,
    pub min_shared_commits: Option<i64>,
    pub min_coupling_score: Option<f64>,
    pub nocache: Option<u8>,
}

impl RawParams {
    pub fn nocache(&self) -> bool {
        self.nocache.unwrap_or(0) != 0
    }

    pub fn date_range(&self) -> Result<DateRange> {
        Ok(DateRange {
            start: parse_calendar_date(self.start_date.as_deref())?,
            end: parse_calendar_date(self.end_date.as_deref())?
                .map(|d| d + chrono::Duration::days(1)),
        })
    }

    pub fn file_types(&self) -> Vec<String> {
        self.file_types
            .as_deref()
            .map(|s| {
                s.split(',')
                    .map(|part| part.trim().trim_start_matches('.').to_string())
                    .filter(|part| !part.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn risk_level(&self) -> Result<Option<RiskLevelFilter>> {
        self.risk_level
            .as_deref()
            .map(|s| {
                s.parse::<RiskLevelFilter>()
                    .map_err(Error::InvalidInput)
            })
            .transpose()
    }

    pub fn filter(&self) -> Result<AnalyticsFilter> {
        Ok(AnalyticsFilter {
            date_range: self.date_range()?,
            path_substring: self.path.clone(),
            file_types: self.file_types(),
            risk_level: self.risk_level()?,
        })
    }

    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page.unwrap_or(1).max(1),
            limit: self.limit.unwrap_or(20).clamp(1, 100),
        }
    }
}

fn parse_calendar_date(value: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    let Some(value) = value else { return Ok(None) };
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| Error::InvalidInput(format!("invalid date '{value}': {e}")))?;
    let datetime = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| Error::InvalidInput(format!("invalid date '{value}'")))?;
    Ok(Some(Utc.from_utc_datetime(&datetime)))
}
