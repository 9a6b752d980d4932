use axum::extract::{Path, Query, State};
use axum::http::HeaderValue;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::json;

use hotspot_analytics::coupling::TemporalCouplingQuery;
use hotspot_analytics::hotspots::HotspotsQuery;
use hotspot_analytics::CacheStatus;
use hotspot_core::types::ProjectId;

use crate::error::{ApiError, ApiResult};
use crate::params::RawParams;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", axum::routing::get(health))
        .route("/dashboard/stats", axum::routing::get(dashboard_stats))
        .route("/projects", axum::routing::get(list_projects).post(create_project))
        .route("/projects/:id", axum::routing::get(get_project))
        .route("/projects/:id/stats", axum::routing::get(project_stats))
        .route("/projects/:id/commits", axum::routing::get(project_commits))
        .route("/projects/:id/hotspots", axum::routing::get(hotspots))
        .route("/projects/:id/file-ownership", axum::routing::get(file_ownership))
        .route("/projects/:id/author-hotspots", axum::routing::get(author_hotspots))
        .route("/projects/:id/knowledge-risk", axum::routing::get(knowledge_risk))
        .route("/projects/:id/temporal-coupling", axum::routing::get(temporal_coupling))
        .route("/projects/:id/bus-factor", axum::routing::get(bus_factor))
        .route("/projects/:id/file-types", axum::routing::get(file_types))
        .route("/projects/:id/analyze", axum::routing::post(analyze))
        .route("/projects/:id/cancel-analysis", axum::routing::post(cancel_analysis))
        .route("/projects/:id/analysis-status", axum::routing::get(analysis_status))
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy" }))
}

fn with_cache_header<T: Serialize>(value: &T, status: CacheStatus) -> Response {
    let mut response = Json(value).into_response();
    response.headers_mut().insert(
        "x-cache",
        HeaderValue::from_static(status.header_value()),
    );
    response
}

async fn list_projects(State(state): State<AppState>) -> ApiResult<Json<serde_json::Value>> {
    let projects = state.store.list_projects().await.map_err(ApiError::from)?;
    Ok(Json(json!({ "projects": projects })))
}

#[derive(serde::Deserialize)]
struct CreateProjectBody {
    name: String,
    #[serde(rename = "repoPath")]
    repo_path: String,
}

async fn create_project(
    State(state): State<AppState>,
    Json(body): Json<CreateProjectBody>,
) -> ApiResult<Json<serde_json::Value>> {
    let project = state
        .store
        .create_project(&body.name, &body.repo_path)
        .await
        .map_err(ApiError::from)?;
    Ok(Json(serde_json::to_value(project).unwrap()))
}

async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<ProjectId>,
) -> ApiResult<Json<serde_json::Value>> {
    let project = state.store.get_project(id).await.map_err(ApiError::from)?;
    Ok(Json(serde_json::to_value(project).unwrap()))
}

async fn project_stats(
    State(state): State<AppState>,
    Path(id): Path<ProjectId>,
    Query(raw): Query<RawParams>,
) -> ApiResult<Response> {
    let (stats, status) = state
        .engine
        .project_stats(id, raw.nocache())
        .await
        .map_err(ApiError::from)?;
    Ok(with_cache_header(&json!({ "project_id": id, "stats": stats }), status))
}

async fn dashboard_stats(
    State(state): State<AppState>,
    Query(raw): Query<RawParams>,
) -> ApiResult<Response> {
    let (stats, status) = state
        .engine
        .dashboard_stats(raw.nocache())
        .await
        .map_err(ApiError::from)?;
    Ok(with_cache_header(&stats, status))
}

async fn project_commits(
    State(state): State<AppState>,
    Path(id): Path<ProjectId>,
    Query(raw): Query<RawParams>,
) -> ApiResult<Json<serde_json::Value>> {
    let limit = raw.limit.unwrap_or(50).clamp(1, 500) as i64;
    let commits = state
        .store
        .recent_commits(id, limit)
        .await
        .map_err(ApiError::from)?;
    Ok(Json(json!({ "project_id": id, "commits": commits })))
}

async fn hotspots(
    State(state): State<AppState>,
    Path(id): Path<ProjectId>,
    Query(raw): Query<RawParams>,
) -> ApiResult<Response> {
    let query = HotspotsQuery {
        filter: raw.filter().map_err(ApiError::from)?,
        pagination: raw.pagination(),
        min_changes: raw.min_changes,
        min_complexity: raw.min_complexity,
    };
    let (page, status) = state
        .engine
        .hotspots(id, query, raw.nocache())
        .await
        .map_err(ApiError::from)?;
    Ok(with_cache_header(
        &json!({ "project_id": id, "hotspots": page.hotspots, "pagination": page.pagination }),
        status,
    ))
}

async fn file_ownership(
    State(state): State<AppState>,
    Path(id): Path<ProjectId>,
    Query(raw): Query<RawParams>,
) -> ApiResult<Response> {
    let filter = raw.filter().map_err(ApiError::from)?;
    let (ownership, status) = state
        .engine
        .file_ownership(id, filter, raw.nocache())
        .await
        .map_err(ApiError::from)?;
    Ok(with_cache_header(
        &json!({ "projectId": id, "fileOwnership": ownership }),
        status,
    ))
}

async fn author_hotspots(
    State(state): State<AppState>,
    Path(id): Path<ProjectId>,
    Query(raw): Query<RawParams>,
) -> ApiResult<Response> {
    let filter = raw.filter().map_err(ApiError::from)?;
    let (authors, status) = state
        .engine
        .author_hotspots(id, filter, raw.nocache())
        .await
        .map_err(ApiError::from)?;
    Ok(with_cache_header(
        &json!({ "projectId": id, "authorHotspots": authors }),
        status,
    ))
}

async fn knowledge_risk(
    State(state): State<AppState>,
    Path(id): Path<ProjectId>,
    Query(raw): Query<RawParams>,
) -> ApiResult<Response> {
    let filter = raw.filter().map_err(ApiError::from)?;
    let ((ownership, authors, summary), status) = state
        .engine
        .knowledge_risk(id, filter, raw.nocache())
        .await
        .map_err(ApiError::from)?;
    Ok(with_cache_header(
        &json!({
            "projectId": id,
            "fileOwnership": ownership,
            "authorHotspots": authors,
            "summary": summary,
        }),
        status,
    ))
}

async fn temporal_coupling(
    State(state): State<AppState>,
    Path(id): Path<ProjectId>,
    Query(raw): Query<RawParams>,
) -> ApiResult<Response> {
    let query = TemporalCouplingQuery {
        filter: raw.filter().map_err(ApiError::from)?,
        limit: raw.limit.unwrap_or(50),
        min_shared_commits: raw.min_shared_commits.unwrap_or(2),
        min_coupling_score: raw.min_coupling_score.unwrap_or(0.0),
    };
    let (pairs, status) = state
        .engine
        .temporal_coupling(id, query.clone(), raw.nocache())
        .await
        .map_err(ApiError::from)?;
    Ok(with_cache_header(
        &json!({
            "project_id": id,
            "temporal_coupling": pairs,
            "params": {
                "limit": query.clamped_limit(),
                "minSharedCommits": query.min_shared_commits,
                "minCouplingScore": query.min_coupling_score,
            },
        }),
        status,
    ))
}

async fn bus_factor(
    State(state): State<AppState>,
    Path(id): Path<ProjectId>,
    Query(raw): Query<RawParams>,
) -> ApiResult<Response> {
    let filter = raw.filter().map_err(ApiError::from)?;
    let date_range = filter.date_range;
    let ((files, summary), status) = state
        .engine
        .bus_factor(id, filter, raw.nocache())
        .await
        .map_err(ApiError::from)?;
    Ok(with_cache_header(
        &json!({
            "files": files,
            "summary": summary,
            "project_id": id,
            "date_range": date_range,
            "filter_applied": raw.path.is_some() || raw.risk_level.is_some(),
        }),
        status,
    ))
}

async fn file_types(
    State(state): State<AppState>,
    Path(id): Path<ProjectId>,
    Query(raw): Query<RawParams>,
) -> ApiResult<Response> {
    let (types, status) = state
        .engine
        .file_types(id, raw.nocache())
        .await
        .map_err(ApiError::from)?;
    Ok(with_cache_header(&json!({ "project_id": id, "file_types": types }), status))
}

#[derive(serde::Deserialize)]
struct AnalyzeBody {
    #[serde(rename = "repoPath")]
    repo_path: String,
}

async fn analyze(
    State(state): State<AppState>,
    Path(id): Path<ProjectId>,
    Json(body): Json<AnalyzeBody>,
) -> ApiResult<Json<serde_json::Value>> {
    state
        .scheduler
        .start_analysis(id, std::path::PathBuf::from(body.repo_path))
        .map_err(ApiError::from)?;
    Ok(Json(json!({ "status": "started" })))
}

async fn cancel_analysis(
    State(state): State<AppState>,
    Path(id): Path<ProjectId>,
) -> ApiResult<Json<serde_json::Value>> {
    state.scheduler.cancel(id).map_err(ApiError::from)?;
    Ok(Json(json!({ "status": "cancelled" })))
}

async fn analysis_status(
    State(state): State<AppState>,
    Path(id): Path<ProjectId>,
) -> ApiResult<Json<serde_json::Value>> {
    let status = state.scheduler.status(id).map_err(ApiError::from)?;
    Ok(Json(serde_json::to_value(status).unwrap()))
}
