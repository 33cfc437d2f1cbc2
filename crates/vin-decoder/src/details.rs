//! Decoded vehicle records and attribute extraction

use crate::error::{DecodeError, DecodeErrorCode};
use crate::lookup::LookupEntry;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Upstream values that mean "no data"
const EMPTY_SENTINELS: [&str; 2] = ["Not Applicable", "0"];

/// Upstream attribute names
pub mod attribute {
    pub const MAKE: &str = "Make";
    pub const MODEL: &str = "Model";
    pub const MODEL_YEAR: &str = "Model Year";
    pub const ENGINE_CONFIGURATION: &str = "Engine Configuration";
    pub const DISPLACEMENT_L: &str = "Displacement (L)";
    pub const ENGINE_CYLINDERS: &str = "Engine Number of Cylinders";
    pub const TRIM: &str = "Trim";
    pub const BODY_CLASS: &str = "Body Class";
    pub const DRIVE_TYPE: &str = "Drive Type";
    pub const TRANSMISSION_STYLE: &str = "Transmission Style";
    pub const FUEL_TYPE_PRIMARY: &str = "Fuel Type - Primary";
    pub const MANUFACTURER_NAME: &str = "Manufacturer Name";
    pub const PLANT_COMPANY_NAME: &str = "Plant Company Name";
    pub const VEHICLE_TYPE: &str = "Vehicle Type";
}

/// Vehicle attributes from a successful decode.
///
/// Every field may be empty: the lookup service omits attributes it has
/// no data for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleDetails {
    pub make: String,
    pub model: String,
    pub year: String,
    pub engine: String,
    #[serde(rename = "engineL")]
    pub engine_l: String,
    pub engine_cylinders: String,
    pub trim: String,
    pub body_type: String,
    pub body_class: String,
    pub drive_type: String,
    pub transmission: String,
    pub fuel_type: String,
    pub manufacturer: String,
    pub plant: String,
    pub vehicle_type: String,
}

impl VehicleDetails {
    /// Map lookup entries onto the fixed record
    pub fn from_entries(entries: &[LookupEntry]) -> Self {
        let get = |variable| attribute_value(entries, variable);
        let body_class = get(attribute::BODY_CLASS);

        Self {
            make: get(attribute::MAKE),
            model: get(attribute::MODEL),
            year: get(attribute::MODEL_YEAR),
            engine: get(attribute::ENGINE_CONFIGURATION),
            engine_l: get(attribute::DISPLACEMENT_L),
            engine_cylinders: get(attribute::ENGINE_CYLINDERS),
            trim: get(attribute::TRIM),
            body_type: body_class.clone(),
            body_class,
            drive_type: get(attribute::DRIVE_TYPE),
            transmission: get(attribute::TRANSMISSION_STYLE),
            fuel_type: get(attribute::FUEL_TYPE_PRIMARY),
            manufacturer: get(attribute::MANUFACTURER_NAME),
            plant: get(attribute::PLANT_COMPANY_NAME),
            vehicle_type: get(attribute::VEHICLE_TYPE),
        }
    }

    /// Short "year make model" label
    pub fn summary(&self) -> String {
        format!("{} {} {}", self.year, self.make, self.model)
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Decode outcome: either vehicle attributes or an error, never both
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedVehicleDetails {
    #[serde(flatten)]
    pub vehicle: Option<VehicleDetails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<DecodeErrorCode>,
}

impl DecodedVehicleDetails {
    /// Successful record
    pub fn success(vehicle: VehicleDetails) -> Self {
        Self {
            vehicle: Some(vehicle),
            error: None,
            error_code: None,
        }
    }

    /// Error-only record
    pub fn failure(error: &DecodeError) -> Self {
        Self {
            vehicle: None,
            error: Some(error.to_string()),
            error_code: Some(error.code()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn vehicle(&self) -> Option<&VehicleDetails> {
        self.vehicle.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

impl From<Result<VehicleDetails, DecodeError>> for DecodedVehicleDetails {
    fn from(result: Result<VehicleDetails, DecodeError>) -> Self {
        match result {
            Ok(vehicle) => Self::success(vehicle),
            Err(e) => Self::failure(&e),
        }
    }
}

/// First meaningful value for `variable`, or an empty string
fn attribute_value(entries: &[LookupEntry], variable: &str) -> String {
    let value = entries
        .iter()
        .find(|entry| entry.variable.as_deref() == Some(variable))
        .and_then(|entry| entry.value.as_deref())
        .filter(|value| !value.is_empty() && !EMPTY_SENTINELS.contains(value))
        .unwrap_or_default();

    truncate_decimal(value)
}

fn decimal_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[0-9]+\.[0-9]+$").expect("decimal pattern is valid"))
}

/// Render decimal strings with at most one fractional digit.
///
/// `"3.60"` becomes `"3.6"` and `"6.0"` becomes `"6"`. Anything that is
/// not plain `digits.digits` is returned unchanged.
pub fn truncate_decimal(value: &str) -> String {
    if !decimal_pattern().is_match(value) {
        return value.to_string();
    }

    match value.parse::<f64>() {
        Ok(number) if number.is_finite() => round_to_tenths(number).to_string(),
        _ => value.to_string(),
    }
}

/// Nearest tenth of the binary value, exact ties rounded up.
///
/// A stored double sits exactly halfway between two tenths only when it is an
/// odd number of quarters (`0.25`, `0.75`, `1.25`...). `1.15` parses to
/// `1.1499...` and is not a tie, even though `1.15 * 10.0` rounds to `11.5`.
fn round_to_tenths(number: f64) -> f64 {
    let quarters = number * 4.0;
    if quarters.fract() == 0.0 && quarters % 2.0 == 1.0 {
        (number * 10.0).ceil() / 10.0
    } else {
        format!("{number:.1}").parse().unwrap_or(number)
    }
}
