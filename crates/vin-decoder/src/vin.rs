//! Vehicle Identification Number normalization and validation

use crate::error::DecodeError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Number of characters in a VIN
pub const VIN_LENGTH: usize = 17;

/// 17 characters from the VIN alphabet (I, O and Q are never used)
const VIN_PATTERN: &str = r"^[A-HJ-NPR-Z0-9]{17}$";

fn vin_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(VIN_PATTERN).expect("VIN pattern is valid"))
}

/// Strip all whitespace and convert to uppercase.
///
/// Does not check length or alphabet; see [`validate`].
pub fn normalize(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

/// Whether `raw` is a well-formed VIN once normalized
pub fn validate(raw: &str) -> bool {
    vin_pattern().is_match(&normalize(raw))
}

/// A normalized, well-formed VIN
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Vin(String);

impl Vin {
    /// Check raw user input and build a VIN from it.
    ///
    /// The raw length is checked before normalization, so padded input
    /// such as `" 1FTFW1ET4CKA5R2K0"` is rejected for its length even though
    /// it would normalize to 17 characters. Length is counted in UTF-16
    /// code units, the way browser clients measure input.
    pub fn parse(raw: &str) -> Result<Self, DecodeError> {
        if raw.is_empty() || raw.encode_utf16().count() != VIN_LENGTH {
            return Err(DecodeError::InvalidLength);
        }

        Self::from_normalized(normalize(raw))
    }

    fn from_normalized(normalized: String) -> Result<Self, DecodeError> {
        if vin_pattern().is_match(&normalized) {
            Ok(Self(normalized))
        } else {
            Err(DecodeError::InvalidFormat)
        }
    }

    /// The VIN as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// World manufacturer identifier (first three characters)
    pub fn wmi(&self) -> &str {
        &self.0[..3]
    }

    /// Model year code (tenth character)
    pub fn year_code(&self) -> char {
        self.0.as_bytes()[9] as char
    }
}

impl fmt::Display for Vin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Vin {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for Vin {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Vin {
    type Error = DecodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_normalized(normalize(&value))
    }
}

impl From<Vin> for String {
    fn from(vin: Vin) -> Self {
        vin.0
    }
}
