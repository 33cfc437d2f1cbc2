//! VIN Normalization and Decoding
//!
//! Validates raw VIN input, normalizes it and resolves it into vehicle
//! attributes through a single lookup against the NHTSA vPIC service.
//! Failures are reported as data on the returned record so that
//! [`VinDecoder::decode`] always yields a value.

mod decoder;
mod details;
mod error;
mod lookup;
mod vin;

pub use decoder::VinDecoder;
pub use details::{attribute, truncate_decimal, DecodedVehicleDetails, VehicleDetails};
pub use error::{DecodeError, DecodeErrorCode, FALLBACK_MESSAGE};
pub use lookup::{LookupConfig, LookupEntry, LookupResponse, NhtsaClient, VinLookup, DEFAULT_BASE_URL};
pub use vin::{normalize, validate, Vin, VIN_LENGTH};
