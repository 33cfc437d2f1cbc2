//! VIN Decode Error Types

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Message used when a lookup failure carries no text of its own
pub const FALLBACK_MESSAGE: &str = "Failed to decode VIN";

/// Errors that can occur while decoding a VIN
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Raw input is empty or not 17 characters long
    #[error("Invalid VIN length. VIN must be 17 characters.")]
    InvalidLength,

    /// Normalized input contains characters outside the VIN alphabet
    #[error("Invalid VIN format. VIN contains invalid characters.")]
    InvalidFormat,

    /// Lookup service answered with a non-success status
    #[error("VIN decode request failed: {0}")]
    RequestFailed(u16),

    /// Request never produced a response
    #[error("VIN decode request failed: {0}")]
    Transport(String),

    /// Lookup service returned an empty result set
    #[error("No vehicle data found for this VIN")]
    NoData,

    /// Anything else (unreadable body, unexpected payload)
    #[error("{}", message_or_fallback(.0))]
    Lookup(String),
}

fn message_or_fallback(message: &str) -> &str {
    if message.trim().is_empty() {
        FALLBACK_MESSAGE
    } else {
        message
    }
}

/// Stable machine-readable error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecodeErrorCode {
    InvalidLength,
    InvalidFormat,
    RequestFailed,
    NoData,
    LookupFailed,
}

impl DecodeErrorCode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidLength => "invalid_length",
            Self::InvalidFormat => "invalid_format",
            Self::RequestFailed => "request_failed",
            Self::NoData => "no_data",
            Self::LookupFailed => "lookup_failed",
        }
    }
}

impl DecodeError {
    /// Classification of this error
    pub fn code(&self) -> DecodeErrorCode {
        match self {
            Self::InvalidLength => DecodeErrorCode::InvalidLength,
            Self::InvalidFormat => DecodeErrorCode::InvalidFormat,
            Self::RequestFailed(_) | Self::Transport(_) => DecodeErrorCode::RequestFailed,
            Self::NoData => DecodeErrorCode::NoData,
            Self::Lookup(_) => DecodeErrorCode::LookupFailed,
        }
    }

    /// Whether the input itself was rejected before any lookup
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::InvalidLength | Self::InvalidFormat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            DecodeError::InvalidLength.to_string(),
            "Invalid VIN length. VIN must be 17 characters."
        );
        assert_eq!(
            DecodeError::InvalidFormat.to_string(),
            "Invalid VIN format. VIN contains invalid characters."
        );
        assert_eq!(
            DecodeError::RequestFailed(503).to_string(),
            "VIN decode request failed: 503"
        );
        assert_eq!(
            DecodeError::NoData.to_string(),
            "No vehicle data found for this VIN"
        );
    }

    #[test]
    fn test_lookup_message_fallback() {
        assert_eq!(DecodeError::Lookup(String::new()).to_string(), FALLBACK_MESSAGE);
        assert_eq!(DecodeError::Lookup("  ".into()).to_string(), FALLBACK_MESSAGE);
        assert_eq!(
            DecodeError::Lookup("expected value at line 1".into()).to_string(),
            "expected value at line 1"
        );
    }

    #[test]
    fn test_codes() {
        assert_eq!(DecodeError::Transport("refused".into()).code(), DecodeErrorCode::RequestFailed);
        assert_eq!(DecodeError::Lookup(String::new()).code().as_str(), "lookup_failed");
        assert!(DecodeError::InvalidFormat.is_input_error());
        assert!(!DecodeError::NoData.is_input_error());
    }
}
