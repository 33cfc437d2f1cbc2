//! External VIN lookup service

use crate::error::DecodeError;
use crate::vin::Vin;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default NHTSA vPIC decode endpoint
pub const DEFAULT_BASE_URL: &str = "https://vpic.nhtsa.dot.gov/api/vehicles/decodevin";

/// One `{Variable, Value}` attribute from the lookup response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupEntry {
    #[serde(rename = "Variable", default)]
    pub variable: Option<String>,
    #[serde(rename = "Value", default)]
    pub value: Option<String>,
}

impl LookupEntry {
    pub fn new(variable: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            variable: Some(variable.into()),
            value: Some(value.into()),
        }
    }
}

/// Lookup response body
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupResponse {
    #[serde(rename = "Results", default)]
    pub results: Option<Vec<LookupEntry>>,
}

impl LookupResponse {
    pub fn from_entries(entries: Vec<LookupEntry>) -> Self {
        Self {
            results: Some(entries),
        }
    }

    /// Entries, or `None` when the service found nothing
    pub fn entries(&self) -> Option<&[LookupEntry]> {
        self.results.as_deref().filter(|entries| !entries.is_empty())
    }
}

/// Source of vehicle attributes for a VIN
#[async_trait]
pub trait VinLookup: Send + Sync {
    /// Issue a single lookup for `vin`
    async fn lookup(&self, vin: &Vin) -> Result<LookupResponse, DecodeError>;
}

/// Lookup client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    /// Endpoint the VIN is appended to as a path segment
    pub base_url: String,
    /// Value of the `format` query parameter
    pub format: String,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            format: "json".to_string(),
        }
    }
}

/// reqwest-backed client for the NHTSA vPIC service
#[derive(Debug, Clone)]
pub struct NhtsaClient {
    http: reqwest::Client,
    config: LookupConfig,
}

impl NhtsaClient {
    pub fn new(config: LookupConfig) -> Result<Self, DecodeError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("vin-decoder/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DecodeError::Transport(e.to_string()))?;
        Ok(Self::with_client(http, config))
    }

    /// Use an already configured HTTP client
    pub fn with_client(http: reqwest::Client, config: LookupConfig) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &LookupConfig {
        &self.config
    }

    fn url_for(&self, vin: &Vin) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), vin)
    }
}

#[async_trait]
impl VinLookup for NhtsaClient {
    async fn lookup(&self, vin: &Vin) -> Result<LookupResponse, DecodeError> {
        let url = self.url_for(vin);
        debug!("Requesting VIN lookup: {}", url);

        let response = self
            .http
            .get(&url)
            .query(&[("format", self.config.format.as_str())])
            .send()
            .await
            .map_err(|e| DecodeError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DecodeError::RequestFailed(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| DecodeError::Transport(e.to_string()))?;

        serde_json::from_str(&body).map_err(|e| DecodeError::Lookup(e.to_string()))
    }
}
