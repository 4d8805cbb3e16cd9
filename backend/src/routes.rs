use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use tracing::{error, warn};

use crate::error::ScanError;
use crate::models::{DownloadNotice, ReportSummary, ScanRequest, ScanResponse};
use crate::reports::{self, SeverityFilter, SortKey};
use crate::scanner::Scanner;

pub struct AppState {
    pub scanner: Scanner,
    pub reports: Vec<ReportSummary>,
}

impl AppState {
    pub fn new(scanner: Scanner) -> Self {
        Self {
            scanner,
            reports: reports::seed_reports(),
        }
    }
}

/// API routes plus the single-page app served from `static_dir` for
/// everything else.
pub fn router(state: Arc<AppState>, static_dir: &Path) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let spa = ServeDir::new(static_dir).fallback(ServeFile::new(static_dir.join("index.html")));

    Router::new()
        .route("/scan", post(scan))
        .route("/download_report", get(download_report))
        .route("/api/reports", get(list_reports))
        .fallback_service(spa)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn scan(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ScanRequest>, JsonRejection>,
) -> Result<Json<ScanResponse>, ScanError> {
    let Json(request) = payload.map_err(|e| ScanError::InvalidInput(e.body_text()))?;

    match state.scanner.run_scan(&request).await {
        Ok(report) => Ok(Json(ScanResponse::success(report))),
        Err(e) => {
            match &e {
                ScanError::InvalidInput(msg) => warn!(%msg, "scan rejected"),
                ScanError::InternalFailure(msg) => error!(%msg, "scan failed"),
            }
            Err(e)
        }
    }
}

async fn download_report() -> Json<DownloadNotice> {
    Json(DownloadNotice {
        message: "Report download would be implemented here".into(),
    })
}

#[derive(Debug, Deserialize)]
struct ReportQuery {
    #[serde(default)]
    q: String,
    #[serde(default)]
    severity: SeverityFilter,
    #[serde(default)]
    sort: SortKey,
}

#[derive(Debug, Serialize)]
struct ReportList {
    total: usize,
    reports: Vec<ReportSummary>,
}

async fn list_reports(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ReportQuery>, QueryRejection>,
) -> Result<Json<ReportList>, ScanError> {
    let Query(query) = query.map_err(|e| ScanError::InvalidInput(e.body_text()))?;
    let reports = reports::view(&state.reports, &query.q, query.severity, query.sort);

    Ok(Json(ReportList {
        total: reports.len(),
        reports,
    }))
}
