//! Vehicle Inspection API Server
//!
//! REST API and WebSocket server over the inspection record services and
//! the VIN decoder.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get},
    Json, Router,
};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use serde::Serialize;
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tower_governor::GovernorLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
pub mod rate_limit;
mod routes;

pub use config::{AppConfig, LoggingConfig, ServerConfig, DEFAULT_CONFIG_FILE};
pub use routes::ApiError;

use inspection::InspectionServices;
use live_updates::{ConnectionStatus, LiveError, LiveUpdates};
use rate_limit::{create_governor_config, RateLimitConfig};
use storage::{DocumentStore, MemoryStore, Query};
use vin_decoder::{DecodeError, VinDecoder};

/// Server startup errors
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),
    #[error("Logging setup failed: {0}")]
    Logging(String),
    #[error("Metrics setup failed: {0}")]
    Metrics(String),
    #[error("VIN decoder setup failed: {0}")]
    Decoder(#[from] DecodeError),
    #[error(transparent)]
    Live(#[from] LiveError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Application state shared across handlers
pub struct AppState {
    /// Backing document store
    pub store: Arc<dyn DocumentStore>,
    /// Record services over `store`
    pub services: InspectionServices,
    pub decoder: VinDecoder,
    /// Quick-check change feed
    pub live: LiveUpdates,
    /// Prometheus exposition
    pub metrics: PrometheusHandle,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        decoder: VinDecoder,
        live: LiveUpdates,
        metrics: PrometheusHandle,
    ) -> Self {
        Self {
            services: InspectionServices::new(store.clone()),
            store,
            decoder,
            live,
            metrics,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: Instant::now(),
        }
    }

    /// In-memory store, NHTSA-backed decoder and a connected change feed
    pub fn from_config(config: &AppConfig, metrics: PrometheusHandle) -> Result<Self, ServerError> {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let decoder = VinDecoder::nhtsa(config.lookup.clone())?;
        let live = LiveUpdates::new(store.clone(), config.live.clone());
        live.connect()?;
        Ok(Self::new(store, decoder, live, metrics))
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: u64,
    pub version: String,
    pub uptime_seconds: u64,
    pub live: ConnectionStatus,
    /// Document count per browsable collection
    pub records: BTreeMap<String, usize>,
}

/// Create the application router
pub fn create_router(state: Arc<AppState>, rate_limit: &RateLimitConfig) -> Router {
    let mut decode = Router::new().route("/api/v1/vin/:vin/decode", get(routes::vin::decode));
    if rate_limit.enabled {
        match create_governor_config(rate_limit) {
            Some(config) => decode = decode.layer(GovernorLayer { config }),
            None => warn!("Rejected rate limit settings {:?}, decode is unlimited", rate_limit),
        }
    }

    Router::new()
        .route("/api/v1/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/api/v1/vin/:vin/validate", get(routes::vin::validate))
        .route(
            "/api/v1/quick-checks",
            get(routes::quick_checks::history).post(routes::quick_checks::submit),
        )
        .route("/api/v1/quick-checks/:id", delete(routes::quick_checks::remove))
        .route(
            "/api/v1/drafts",
            get(routes::drafts::list).post(routes::drafts::create),
        )
        .route("/api/v1/labels", get(routes::labels::list))
        .route("/api/v1/labels/:id", get(routes::labels::get_template))
        .route("/api/v1/tables", get(routes::tables::list))
        .route("/api/v1/tables/:name", get(routes::tables::data))
        .route("/api/v1/tables/:name/schema", get(routes::tables::schema))
        .route("/api/v1/live", get(routes::live::socket))
        .merge(decode)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check handler
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let mut healthy = true;
    let mut records = BTreeMap::new();
    for table in state.services.tables.tables() {
        match state.store.query(&Query::collection(table.name.as_str())) {
            Ok(docs) => {
                records.insert(table.name, docs.len());
            }
            Err(e) => {
                warn!("Health check could not read {}: {}", table.name, e);
                healthy = false;
            }
        }
    }

    let live = *state.live.status().borrow();
    let status = if healthy { "healthy" } else { "degraded" };

    Json(HealthResponse {
        status: status.to_string(),
        timestamp,
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        live,
        records,
    })
}

/// Prometheus text exposition
async fn metrics_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (StatusCode::OK, state.metrics.render())
}

/// Initialize logging. `RUST_LOG` overrides the configured level.
pub fn init_logging(config: &LoggingConfig) -> Result<(), ServerError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| ServerError::Logging(e.to_string()))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    let result = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|e| ServerError::Logging(e.to_string()))
}

/// Run the server until it fails
pub async fn run_server(config: AppConfig) -> Result<(), ServerError> {
    let metrics = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| ServerError::Metrics(e.to_string()))?;

    let state = Arc::new(AppState::from_config(&config, metrics)?);
    let app = create_router(state, &config.rate_limit);

    let addr = config.server.addr();
    info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
