//! Table Browser Routes

use axum::{
    extract::{Path, State},
    Json,
};
use inspection::{TableData, TableInfo, TableSchema};
use std::sync::Arc;

use super::ApiError;
use crate::AppState;

pub async fn list(State(state): State<Arc<AppState>>) -> Json<Vec<TableInfo>> {
    Json(state.services.tables.tables())
}

pub async fn schema(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Json<TableSchema> {
    Json(state.services.tables.schema(&name))
}

/// First page of a collection
pub async fn data(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<TableData>, ApiError> {
    Ok(Json(state.services.tables.data(&name)?))
}
