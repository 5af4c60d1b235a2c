//! Model status handler

use axum::{extract::State, Json};

use urlscan_core::ClassifierStatus;

use crate::AppState;

/// GET /api/model
pub async fn status(State(state): State<AppState>) -> Json<ClassifierStatus> {
    Json(state.analyzer.classifier().status())
}
