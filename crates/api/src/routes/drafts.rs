//! Draft Routes

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use storage::{Document, Fields};

use super::ApiError;
use crate::AppState;

/// Query parameters for the drafts endpoint
#[derive(Debug, Deserialize)]
pub struct DraftQuery {
    /// Only drafts of this user
    pub user: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateDraftRequest {
    pub title: String,
    #[serde(flatten)]
    pub data: Fields,
}

#[derive(Debug, Serialize)]
pub struct CreatedDraft {
    pub id: String,
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DraftQuery>,
) -> Result<Json<Vec<Document>>, ApiError> {
    let user = params.user.as_deref().filter(|u| !u.is_empty());
    Ok(Json(state.services.quick_checks.drafts(user)?))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateDraftRequest>,
) -> Result<(StatusCode, Json<CreatedDraft>), ApiError> {
    let id = state
        .services
        .quick_checks
        .create_draft(&request.title, request.data)?;
    Ok((StatusCode::CREATED, Json(CreatedDraft { id })))
}
