use serde::Serialize;

use crate::error::ForecastError;
use crate::stats;
use crate::types::ObservedPoint;

/// Absolute minimum history: acceleration needs three points.
pub const MIN_OBSERVATIONS: usize = 3;

/// Windowed aggregates of an observed series. Derived fresh on every call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateState {
    /// Latest composite indicator; the projection baseline.
    pub current_indicator: f64,
    pub avg_indicator: f64,
    pub avg_friction: f64,
    /// Second difference of the indicator over its last three points.
    pub acceleration: f64,
    /// Population std-dev of the indicator over the window. Scales every
    /// simulated shock; zero means deterministic paths.
    pub volatility: f64,
    /// Population std-dev of friction over the window. Sets the friction
    /// offsets of the risk surface only.
    pub friction_volatility: f64,
}

impl AggregateState {
    /// Aggregate the trailing `lookback` months of `series`.
    pub fn from_series(series: &[ObservedPoint], lookback: usize) -> Result<Self, ForecastError> {
        let required = lookback.max(MIN_OBSERVATIONS);
        if series.len() < required {
            return Err(ForecastError::InsufficientData { required, available: series.len() });
        }
        let indicator: Vec<f64> = series.iter().map(|p| p.indicator).collect();
        let friction: Vec<f64> = series.iter().map(|p| p.friction).collect();

        Ok(AggregateState {
            current_indicator: indicator[indicator.len() - 1],
            avg_indicator: stats::windowed_average(&indicator, lookback)?,
            avg_friction: stats::windowed_average(&friction, lookback)?,
            acceleration: stats::acceleration(&indicator),
            volatility: stats::windowed_std_dev(&indicator, lookback)?,
            friction_volatility: stats::windowed_std_dev(&friction, lookback)?,
        })
    }

    /// Friction fed to the collapse model: never negative.
    pub fn clamped_friction(&self) -> f64 {
        self.avg_friction.max(0.0)
    }

    /// True when simulated paths carry no randomness.
    pub fn has_zero_variance(&self) -> bool {
        self.volatility == 0.0
    }
}

/// Risk-adjusted exponential projection:
/// `baseline · exp(rate · horizon) · (1 − collapse_prob)`.
///
/// `horizon_years` must be positive; `collapse_prob` is clamped to `[0, 1]`.
pub fn cumulative_regeneration(
    baseline: f64,
    effective_rate: f64,
    horizon_years: f64,
    collapse_prob: f64,
) -> f64 {
    debug_assert!(horizon_years > 0.0, "horizon must be positive");
    baseline * (effective_rate * horizon_years).exp() * (1.0 - collapse_prob.clamp(0.0, 1.0))
}
