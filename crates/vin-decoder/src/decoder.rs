//! VIN decode pipeline

use crate::details::{DecodedVehicleDetails, VehicleDetails};
use crate::error::DecodeError;
use crate::lookup::{LookupConfig, NhtsaClient, VinLookup};
use crate::vin::Vin;
use std::sync::Arc;
use tracing::{debug, warn};

/// Decodes raw VIN input into vehicle details.
///
/// Holds no per-request state: one decoder can serve any number of
/// concurrent callers, each issuing exactly one lookup.
#[derive(Clone)]
pub struct VinDecoder {
    lookup: Arc<dyn VinLookup>,
}

impl VinDecoder {
    pub fn new(lookup: impl VinLookup + 'static) -> Self {
        Self {
            lookup: Arc::new(lookup),
        }
    }

    pub fn from_arc(lookup: Arc<dyn VinLookup>) -> Self {
        Self { lookup }
    }

    /// Decoder backed by the NHTSA vPIC service
    pub fn nhtsa(config: LookupConfig) -> Result<Self, DecodeError> {
        Ok(Self::new(NhtsaClient::new(config)?))
    }

    /// Decode and report failures as a typed error
    pub async fn try_decode(&self, raw: &str) -> Result<VehicleDetails, DecodeError> {
        let vin = Vin::parse(raw)?;
        debug!("Decoding VIN {}", vin);

        let response = self.lookup.lookup(&vin).await?;
        let entries = response.entries().ok_or(DecodeError::NoData)?;

        Ok(VehicleDetails::from_entries(entries))
    }

    /// Decode and fold any failure into the returned record
    pub async fn decode(&self, raw: &str) -> DecodedVehicleDetails {
        match self.try_decode(raw).await {
            Ok(vehicle) => DecodedVehicleDetails::success(vehicle),
            Err(e) => {
                warn!("VIN decode error: {}", e);
                DecodedVehicleDetails::failure(&e)
            }
        }
    }

    /// Decode input that may be absent altogether
    pub async fn decode_optional(&self, raw: Option<&str>) -> DecodedVehicleDetails {
        self.decode(raw.unwrap_or_default()).await
    }
}

impl std::fmt::Debug for VinDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VinDecoder").finish_non_exhaustive()
    }
}
