//! Error and warning types for the forecasting engine.
//!
//! Fatal conditions are `ForecastError` and are raised before any simulation
//! work starts. Non-fatal conditions are collected as `Warning`s on the result.

use serde::Serialize;
use thiserror::Error;

/// Fatal errors surfaced by `engine::compute` and the validation helpers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ForecastError {
    /// Fewer observed points than the lookback window (or the absolute minimum) requires.
    #[error("insufficient data: {required} observed points required, {available} available")]
    InsufficientData { required: usize, available: usize },

    /// A parameter, option or series value violates its documented bound.
    #[error("invalid parameter `{field}`: {constraint}")]
    InvalidParameter { field: String, constraint: String },
}

impl ForecastError {
    pub fn invalid(field: impl Into<String>, constraint: impl Into<String>) -> Self {
        ForecastError::InvalidParameter { field: field.into(), constraint: constraint.into() }
    }
}

/// Non-fatal conditions. Recorded on the result; computation continues.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// Zero historical variance in the lookback window. Bands collapse to the
    /// deterministic path except where the collapse latch fires.
    ZeroVariance,
    /// A scenario's baseline terminal median is zero; its percentage impact is reported as null.
    UndefinedRatio { scenario: String },
    /// Fewer than 20 paths per horizon; percentile bands are unstable.
    LowIterationCount { iterations: usize },
}
