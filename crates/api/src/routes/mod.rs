//! Route handlers

pub mod drafts;
pub mod labels;
pub mod live;
pub mod quick_checks;
pub mod tables;
pub mod vin;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use inspection::ServiceError;
use serde_json::json;
use storage::StorageError;
use tracing::error;

/// Service failure rendered as `{ "error": message }`
#[derive(Debug)]
pub struct ApiError(pub ServiceError);

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            ServiceError::NotFound(_) | ServiceError::Storage(StorageError::NotFound { .. }) => {
                StatusCode::NOT_FOUND
            }
            ServiceError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}
