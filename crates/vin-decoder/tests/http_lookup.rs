//! Decoder against a local stand-in for the vPIC endpoint

use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use std::collections::HashMap;
use vin_decoder::{DecodeErrorCode, LookupConfig, VinDecoder};

const VIN: &str = "1FTFW1ET4CKA5R2K0";

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}/api/vehicles/decodevin")
}

fn decoder_for(base_url: String) -> VinDecoder {
    VinDecoder::nhtsa(LookupConfig {
        base_url,
        ..Default::default()
    })
    .unwrap()
}

async fn decodevin(
    Path(vin): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    assert_eq!(params.get("format").map(String::as_str), Some("json"));
    if vin != VIN {
        return (StatusCode::BAD_REQUEST, Json(json!({ "Message": "bad vin" })));
    }
    (
        StatusCode::OK,
        Json(json!({
            "Count": 5,
            "Results": [
                { "Variable": "Make", "Value": "FORD" },
                { "Variable": "Model", "Value": "F-150" },
                { "Variable": "Model Year", "Value": "2012" },
                { "Variable": "Displacement (L)", "Value": "3.60" },
                { "Variable": "Trim", "Value": null }
            ]
        })),
    )
}

#[tokio::test]
async fn test_decode_over_http() {
    let base = serve(Router::new().route("/api/vehicles/decodevin/:vin", get(decodevin))).await;
    let decoder = decoder_for(base);

    let record = decoder.decode("1ftfw1et4cka5r2k0").await;
    assert!(record.is_success(), "unexpected error: {:?}", record.error());
    let vehicle = record.vehicle().unwrap();
    assert_eq!(vehicle.make, "FORD");
    assert_eq!(vehicle.engine_l, "3.6");
    assert_eq!(vehicle.trim, "");
    assert_eq!(vehicle.transmission, "");
}

#[tokio::test]
async fn test_non_success_status() {
    let base = serve(Router::new().route(
        "/api/vehicles/decodevin/:vin",
        get(|| async { StatusCode::SERVICE_UNAVAILABLE }),
    ))
    .await;
    let record = decoder_for(base).decode(VIN).await;
    assert_eq!(record.error(), Some("VIN decode request failed: 503"));
    assert_eq!(record.error_code, Some(DecodeErrorCode::RequestFailed));
    assert!(record.vehicle().is_none());
}

#[tokio::test]
async fn test_empty_results_over_http() {
    let base = serve(Router::new().route(
        "/api/vehicles/decodevin/:vin",
        get(|| async { Json(json!({ "Count": 0, "Results": [] })) }),
    ))
    .await;
    let record = decoder_for(base).decode(VIN).await;
    assert_eq!(record.error(), Some("No vehicle data found for this VIN"));
}

#[tokio::test]
async fn test_malformed_body() {
    let base = serve(Router::new().route(
        "/api/vehicles/decodevin/:vin",
        get(|| async { "<html>maintenance</html>" }),
    ))
    .await;
    let record = decoder_for(base).decode(VIN).await;
    let message = record.error().unwrap();
    assert!(!message.is_empty());
    assert_eq!(record.error_code, Some(DecodeErrorCode::LookupFailed));
}

#[tokio::test]
async fn test_connection_refused() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let record = decoder_for(format!("http://{addr}/decodevin")).decode(VIN).await;
    let message = record.error().unwrap();
    assert!(message.starts_with("VIN decode request failed: "), "{message}");
    assert_eq!(record.error_code, Some(DecodeErrorCode::RequestFailed));
}
