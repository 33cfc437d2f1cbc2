//! Quick Check Routes

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use metrics::counter;
use std::sync::Arc;
use storage::{Document, Fields};

use super::ApiError;
use crate::AppState;

/// Submitted quick checks, newest first
pub async fn history(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Document>>, ApiError> {
    Ok(Json(state.services.quick_checks.history()?))
}

pub async fn submit(
    State(state): State<Arc<AppState>>,
    Json(form): Json<Fields>,
) -> Result<(StatusCode, Json<Document>), ApiError> {
    let doc = state.services.quick_checks.submit(form)?;
    counter!("quick_checks_submitted_total").increment(1);
    Ok((StatusCode::CREATED, Json(doc)))
}

pub async fn remove(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.services.quick_checks.delete(&id)?;
    Ok(StatusCode::NO_CONTENT)
}
