//! TacField error types with granular categories

use thiserror::Error;

/// Top-level error type for all TacField core operations
#[derive(Debug, Error)]
pub enum TacFieldError {
    #[error("SSTV error: {0}")]
    Sstv(#[from] SstvError),

    #[error("RF path error: {0}")]
    Rf(#[from] RfError),
}

/// SSTV-codec-specific errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SstvError {
    #[error("VIS code {code:#04x} has no known mode mapping")]
    UnsupportedMode { code: u8 },

    #[error("VIS detection timed out after {elapsed_ms} ms without a valid code")]
    VisTimeout { elapsed_ms: u64 },

    #[error("transmit requires a callsign to be configured")]
    CallsignMissing,

    #[error("transmit requires the operator license acknowledgment to be set")]
    LicenseMissing,

    #[error("audio input unavailable: {reason}")]
    AudioUnavailable { reason: String },
}

/// RF-path-analyzer-specific errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RfError {
    #[error("path distance {distance_m:.1} m is outside the supported range [100 m, 500000 m]")]
    GeometryInvalid { distance_m: f64 },

    #[error("Could not fetch elevation data")]
    ElevationUnavailable,
}

/// Result type alias for TacField core operations
pub type Result<T> = std::result::Result<T, TacFieldError>;
