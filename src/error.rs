//! Typed errors for the lead pipeline.
//!
//! `ConfigError` is the only error that aborts a batch. `RecordError` never
//! leaves per-record processing; it is turned into a `Malformed` status.

use thiserror::Error;

/// Contradictory or incomplete policy, detected before any record is processed
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("industries listed as both forbidden and allowed: {0:?}")]
    IndustryOverlap(Vec<String>),

    #[error("revenue bounds inverted: min {min} > max {max}")]
    RevenueBoundsInverted { min: f64, max: f64 },

    #[error("upper-range revenue threshold {threshold} must be below the revenue cap {max}")]
    UpperRangeAboveCap { threshold: f64, max: f64 },

    #[error("required policy set is empty: {0}")]
    EmptySet(&'static str),

    #[error("scoring weights must sum to 100, got {0}")]
    WeightsNot100(u32),

    #[error("qualification threshold {0} is above the 100-point scale")]
    ThresholdOutOfRange(u32),

    #[error("invalid verifier setting: {0}")]
    Verifier(String),

    #[error("unknown policy version: {0}")]
    UnknownVersion(String),
}

/// Input record that cannot be evaluated
#[derive(Debug, Error, PartialEq)]
pub enum RecordError {
    #[error("missing business name")]
    MissingName,

    #[error("negative revenue estimate: {0}")]
    NegativeRevenue(f64),

    #[error("revenue estimate is not a finite number: {0}")]
    InvalidRevenue(f64),

    #[error("revenue confidence {0} outside [0, 1]")]
    ConfidenceOutOfRange(f64),

    #[error("unreadable input field(s): {0}")]
    UnreadableFields(String),
}
