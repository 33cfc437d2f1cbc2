//! VIN Routes

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use metrics::{counter, histogram};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use vin_decoder::{normalize, DecodeErrorCode, DecodedVehicleDetails, Vin};

use crate::AppState;

/// Response for the validate endpoint
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResponse {
    pub input: String,
    pub normalized: String,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<DecodeErrorCode>,
}

fn status_for(code: Option<DecodeErrorCode>) -> StatusCode {
    match code {
        None => StatusCode::OK,
        Some(DecodeErrorCode::InvalidLength | DecodeErrorCode::InvalidFormat) => {
            StatusCode::BAD_REQUEST
        }
        Some(DecodeErrorCode::NoData) => StatusCode::NOT_FOUND,
        Some(DecodeErrorCode::RequestFailed | DecodeErrorCode::LookupFailed) => {
            StatusCode::BAD_GATEWAY
        }
    }
}

/// Decode a VIN. The body is always a decode record; the status reflects
/// its error code.
pub async fn decode(
    State(state): State<Arc<AppState>>,
    Path(vin): Path<String>,
) -> (StatusCode, Json<DecodedVehicleDetails>) {
    let started = Instant::now();
    let record = state.decoder.decode(&vin).await;

    let outcome = record.error_code.map_or("success", DecodeErrorCode::as_str);
    counter!("vin_decode_requests_total", "outcome" => outcome).increment(1);
    histogram!("vin_decode_duration_seconds").record(started.elapsed().as_secs_f64());

    (status_for(record.error_code), Json(record))
}

/// Check a VIN without looking it up.
///
/// `valid` follows [`vin_decoder::validate`], so padded input that normalizes
/// to a good VIN is valid. An invalid VIN reports the error decode would give.
pub async fn validate(Path(vin): Path<String>) -> Json<ValidationResponse> {
    let normalized = normalize(&vin);
    let valid = vin_decoder::validate(&vin);
    let (error, error_code) = match Vin::parse(&vin) {
        Err(e) if !valid => (Some(e.to_string()), Some(e.code())),
        _ => (None, None),
    };
    Json(ValidationResponse {
        input: vin,
        normalized,
        valid,
        error,
        error_code,
    })
}
