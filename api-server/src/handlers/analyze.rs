//! URL analysis handler

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Deserialize;

use urlscan_core::AnalysisReport;

use crate::{AppError, AppResult, AppState};

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub url: Option<String>,
}

/// POST /api/analyze
///
/// Extraction does blocking network I/O, so the whole analysis runs on the
/// blocking pool.
pub async fn analyze(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> AppResult<Json<AnalysisReport>> {
    let Json(req) = payload?;

    let url = req.url.unwrap_or_default();
    if url.trim().is_empty() {
        return Err(AppError::ValidationError("URL is required".to_string()));
    }

    let analyzer = state.analyzer.clone();
    let report = tokio::task::spawn_blocking(move || analyzer.analyze(&url)).await??;

    Ok(Json(report))
}
