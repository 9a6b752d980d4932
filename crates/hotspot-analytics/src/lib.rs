pub mod bus_factor;
pub mod coupling;
pub mod distribution;
pub mod file_types;
pub mod hotspots;
pub mod ownership;
pub mod queries;
pub mod stats;

use std::future::Future;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use hotspot_cache::Cache;
use hotspot_core::types::{AnalyticsFilter, ProjectId, RiskLevelFilter};
use hotspot_core::Result;
use hotspot_store::Store;

use bus_factor::{compute_bus_factors, BusFactorSummary, FileBusFactor};
use coupling::{compute_temporal_coupling, CoupledPair, TemporalCouplingQuery};
use file_types::compute_file_types;
use hotspots::{compute_hotspots, HotspotsPage, HotspotsQuery};
use ownership::{
    compute_author_hotspots, compute_file_ownership, knowledge_risk_summary, AuthorHotspotCount,
    FileOwnership, KnowledgeRiskSummary,
};
use queries::fetch_filtered_changes;
use stats::{compute_dashboard_stats, compute_project_stats, DashboardStats, ProjectStats};

const DEFAULT_HOTSPOT_THRESHOLD: i64 = 5;
const DEFAULT_AUTHOR_HOTSPOTS_TOP_N: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
    Bypass,
}

impl CacheStatus {
    pub fn header_value(self) -> &'static str {
        match self {
            Self::Hit => "HIT",
            Self::Miss => "MISS",
            Self::Bypass => "BYPASS",
        }
    }
}

/// Computes and memoizes the analytics views over a project's ingested
/// history.
pub struct Engine {
    store: Store,
    cache: Arc<Cache>,
}

impl Engine {
    pub fn new(store: Store, cache: Arc<Cache>) -> Self {
        Self { store, cache }
    }

    async fn cached<T, F, Fut>(
        &self,
        key: String,
        nocache: bool,
        compute: F,
    ) -> Result<(T, CacheStatus)>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if nocache {
            let value = compute().await?;
            return Ok((value, CacheStatus::Bypass));
        }

        if let Some(cached) = self.cache.get(&key) {
            if let Ok(value) = serde_json::from_value(cached) {
                return Ok((value, CacheStatus::Hit));
            }
        }

        let value = compute().await?;
        let encoded = serde_json::to_value(&value)
            .map_err(|e| hotspot_core::Error::Internal(format!("failed to encode cache entry: {e}")))?;
        self.cache.put(key, encoded);
        Ok((value, CacheStatus::Miss))
    }

    pub async fn hotspots(
        &self,
        project_id: ProjectId,
        query: HotspotsQuery,
        nocache: bool,
    ) -> Result<(HotspotsPage, CacheStatus)> {
        let key = hotspot_cache::cache_key(
            "hotspots",
            project_id,
            &format!(
                "page={}&limit={}&min_changes={:?}&min_complexity={:?}&{}",
                query.pagination.page,
                query.pagination.limit,
                query.min_changes,
                query.min_complexity,
                filter_fingerprint(&query.filter),
            ),
        );

        self.cached(key, nocache, || async move {
            let rows = fetch_filtered_changes(&self.store, project_id, &query.filter).await?;
            Ok(compute_hotspots(&rows, &query))
        })
        .await
    }

    pub async fn project_stats(
        &self,
        project_id: ProjectId,
        nocache: bool,
    ) -> Result<(ProjectStats, CacheStatus)> {
        let key = hotspot_cache::cache_key("stats", project_id, "");
        self.cached(key, nocache, || async move {
            let rows =
                fetch_filtered_changes(&self.store, project_id, &AnalyticsFilter::default()).await?;
            Ok(compute_project_stats(&rows))
        })
        .await
    }

    pub async fn dashboard_stats(&self, nocache: bool) -> Result<(DashboardStats, CacheStatus)> {
        let key = hotspot_cache::cache_key("dashboard", 0, "");
        self.cached(key, nocache, || async move { compute_dashboard_stats(&self.store).await })
            .await
    }

    pub async fn file_ownership(
        &self,
        project_id: ProjectId,
        filter: AnalyticsFilter,
        nocache: bool,
    ) -> Result<(Vec<FileOwnership>, CacheStatus)> {
        let key = hotspot_cache::cache_key("file_ownership", project_id, &filter_fingerprint(&filter));
        self.cached(key, nocache, || async move {
            let rows = fetch_filtered_changes(&self.store, project_id, &filter).await?;
            Ok(compute_file_ownership(&rows))
        })
        .await
    }

    pub async fn author_hotspots(
        &self,
        project_id: ProjectId,
        filter: AnalyticsFilter,
        nocache: bool,
    ) -> Result<(Vec<AuthorHotspotCount>, CacheStatus)> {
        let key = hotspot_cache::cache_key("author_hotspots", project_id, &filter_fingerprint(&filter));
        self.cached(key, nocache, || async move {
            let rows = fetch_filtered_changes(&self.store, project_id, &filter).await?;
            Ok(compute_author_hotspots(
                &rows,
                DEFAULT_HOTSPOT_THRESHOLD,
                DEFAULT_AUTHOR_HOTSPOTS_TOP_N,
            ))
        })
        .await
    }

    /// Combined view used by the `/knowledge-risk` route: ownership,
    /// author hotspots, and a summary, computed from one fetch.
    pub async fn knowledge_risk(
        &self,
        project_id: ProjectId,
        filter: AnalyticsFilter,
        nocache: bool,
    ) -> Result<((Vec<FileOwnership>, Vec<AuthorHotspotCount>, KnowledgeRiskSummary), CacheStatus)> {
        let key = hotspot_cache::cache_key("knowledge_risk", project_id, &filter_fingerprint(&filter));
        self.cached(key, nocache, || async move {
            let rows = fetch_filtered_changes(&self.store, project_id, &filter).await?;
            let ownership = compute_file_ownership(&rows);
            let authors = compute_author_hotspots(
                &rows,
                DEFAULT_HOTSPOT_THRESHOLD,
                DEFAULT_AUTHOR_HOTSPOTS_TOP_N,
            );
            let summary = knowledge_risk_summary(&ownership);
            Ok((ownership, authors, summary))
        })
        .await
    }

    pub async fn temporal_coupling(
        &self,
        project_id: ProjectId,
        query: TemporalCouplingQuery,
        nocache: bool,
    ) -> Result<(Vec<CoupledPair>, CacheStatus)> {
        let key = hotspot_cache::cache_key(
            "temporal_coupling",
            project_id,
            &format!(
                "limit={}&min_shared={}&min_score={}&{}",
                query.limit,
                query.min_shared_commits,
                query.min_coupling_score,
                filter_fingerprint(&query.filter),
            ),
        );
        self.cached(key, nocache, || async move {
            let rows = fetch_filtered_changes(&self.store, project_id, &query.filter).await?;
            Ok(compute_temporal_coupling(&rows, &query))
        })
        .await
    }

    pub async fn bus_factor(
        &self,
        project_id: ProjectId,
        filter: AnalyticsFilter,
        nocache: bool,
    ) -> Result<((Vec<FileBusFactor>, BusFactorSummary), CacheStatus)> {
        let risk_filter = filter.risk_level;
        let key = hotspot_cache::cache_key("bus_factor", project_id, &filter_fingerprint(&filter));
        self.cached(key, nocache, || async move {
            let rows = fetch_filtered_changes(&self.store, project_id, &filter).await?;
            Ok(compute_bus_factors(&rows, risk_filter))
        })
        .await
    }

    pub async fn file_types(
        &self,
        project_id: ProjectId,
        nocache: bool,
    ) -> Result<(Vec<String>, CacheStatus)> {
        let key = hotspot_cache::cache_key("file_types", project_id, "");
        self.cached(key, nocache, || async move {
            let rows =
                fetch_filtered_changes(&self.store, project_id, &AnalyticsFilter::default()).await?;
            Ok(compute_file_types(&rows))
        })
        .await
    }
}

fn risk_filter_tag(filter: RiskLevelFilter) -> String {
    match filter {
        RiskLevelFilter::All => "all".to_string(),
        RiskLevelFilter::Only(level) => level.to_string(),
    }
}

/// Canonical fingerprint of every `AnalyticsFilter` field, used as part of
/// every cache key so two requests that differ in any filter never collide.
fn filter_fingerprint(filter: &AnalyticsFilter) -> String {
    format!(
        "start={:?}&end={:?}&path={:?}&types={:?}&risk={:?}",
        filter.date_range.start,
        filter.date_range.end,
        filter.path_substring,
        filter.file_types,
        filter.risk_level.map(risk_filter_tag),
    )
}
