//! Label Template Routes

use axum::{
    extract::{Path, Query, State},
    Json,
};
use inspection::LabelTemplate;
use serde::Deserialize;
use std::sync::Arc;

use super::ApiError;
use crate::AppState;

/// Query parameters for the labels endpoint
#[derive(Debug, Deserialize)]
pub struct LabelQuery {
    /// `true` for archived templates only, `false` for active ones only
    pub archived: Option<bool>,
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LabelQuery>,
) -> Result<Json<Vec<LabelTemplate>>, ApiError> {
    Ok(Json(state.services.labels.templates(params.archived)?))
}

pub async fn get_template(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<LabelTemplate>, ApiError> {
    Ok(Json(state.services.labels.template(&id)?))
}
