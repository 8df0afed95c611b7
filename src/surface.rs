use serde::Serialize;

use crate::config::ModelParameters;
use crate::projection::{self, AggregateState};
use crate::rate;

/// Horizons (years) swept by the risk surface.
pub const SURFACE_HORIZONS: [u32; 4] = [1, 3, 5, 10];

/// Offsets in windowed standard deviations applied to momentum and friction.
pub const SURFACE_OFFSETS: [i32; 5] = [-2, -1, 0, 1, 2];

/// Shifted friction is floored here, never at zero.
pub const SURFACE_FRICTION_FLOOR: f64 = 0.001;

/// Projected values within this distance of zero count as stagnation.
pub const STAGNATION_BAND: f64 = 0.01;

/// Discrete risk tier of one surface cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    Low,
    Moderate,
    High,
    Severe,
}

impl RiskTier {
    /// Tier from collapse probability and the sign/magnitude of the projected value.
    ///
    /// - Severe: p ≥ 0.70, or p ≥ 0.50 with a negative projection
    /// - High: p ≥ 0.50, or any negative projection
    /// - Moderate: p ≥ 0.30, or a projection inside the stagnation band
    /// - Low: otherwise
    pub fn classify(collapse_probability: f64, projected_value: f64) -> Self {
        let negative = projected_value < 0.0;
        if collapse_probability >= 0.70 || (collapse_probability >= 0.50 && negative) {
            RiskTier::Severe
        } else if collapse_probability >= 0.50 || negative {
            RiskTier::High
        } else if collapse_probability >= 0.30 || projected_value.abs() < STAGNATION_BAND {
            RiskTier::Moderate
        } else {
            RiskTier::Low
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            RiskTier::Low => "#22c55e",
            RiskTier::Moderate => "#eab308",
            RiskTier::High => "#f97316",
            RiskTier::Severe => "#ef4444",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskSurfaceCell {
    pub horizon_years: u32,
    pub momentum_offset: i32,
    pub friction_offset: i32,
    pub projected_value: f64,
    pub collapse_probability: f64,
    pub tier: RiskTier,
}

/// Closed-form sweep of `horizons × offsets × offsets`, in that nesting order.
///
/// Momentum and friction are shifted independently by whole standard
/// deviations around their windowed means; no covariance is modelled.
pub fn generate(
    state: &AggregateState,
    params: &ModelParameters,
    horizons: &[u32],
    offsets: &[i32],
) -> Vec<RiskSurfaceCell> {
    let mut cells = Vec::with_capacity(horizons.len() * offsets.len() * offsets.len());

    for &horizon_years in horizons {
        for &momentum_offset in offsets {
            let momentum = state.avg_indicator + momentum_offset as f64 * state.volatility;
            for &friction_offset in offsets {
                let friction = (state.avg_friction + friction_offset as f64 * state.friction_volatility)
                    .max(SURFACE_FRICTION_FLOOR);

                let collapse_probability =
                    rate::collapse_probability(friction, params.collapse_sensitivity, params.collapse_threshold);
                let effective =
                    rate::effective_rate(momentum, friction, params.compounding_efficiency, params.friction_penalty);
                let projected_value = projection::cumulative_regeneration(
                    state.current_indicator,
                    effective,
                    horizon_years as f64,
                    collapse_probability,
                );

                cells.push(RiskSurfaceCell {
                    horizon_years,
                    momentum_offset,
                    friction_offset,
                    projected_value,
                    collapse_probability,
                    tier: RiskTier::classify(collapse_probability, projected_value),
                });
            }
        }
    }

    cells
}
