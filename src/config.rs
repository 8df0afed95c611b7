use serde::{Deserialize, Serialize};

use crate::backtest::BacktestRequest;
use crate::error::ForecastError;
use crate::scenario::ScenarioDefinition;
use crate::sensitivity::SensitivityRequest;

/// Upper bound on scenarios per compute call; each costs two full forecast curves.
pub const MAX_SCENARIOS: usize = 10;

/// Forecast horizons (years) used when the caller supplies none.
pub const DEFAULT_HORIZONS: [u32; 7] = [1, 2, 3, 4, 5, 7, 10];

/// Below this many paths percentile bands are too noisy to read.
pub const MIN_STABLE_ITERATIONS: usize = 20;

/// Named model coefficients. Immutable per compute call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelParameters {
    /// α: weight of average momentum in the effective compounding rate.
    pub compounding_efficiency: f64,
    /// β: weight of average friction subtracted from the rate.
    pub friction_penalty: f64,
    /// γ: logistic slope of collapse probability in friction.
    pub collapse_sensitivity: f64,
    /// θ: logistic offset of collapse probability.
    pub collapse_threshold: f64,
    pub lookback_months: usize,
    pub horizon_years: u32,
    /// Paths per simulated horizon.
    pub iterations: usize,
    /// Scales historical std-dev into per-step shock size.
    pub volatility_multiplier: f64,
}

impl Default for ModelParameters {
    fn default() -> Self {
        ModelParameters {
            compounding_efficiency: 1.1,
            friction_penalty: 0.8,
            collapse_sensitivity: 3.5,
            collapse_threshold: 0.15,
            lookback_months: 6,
            horizon_years: 5,
            iterations: 1000,
            volatility_multiplier: 1.0,
        }
    }
}

/// Inclusive valid range for one parameter.
struct Range {
    field: &'static str,
    min: f64,
    max: f64,
}

// ── Valid ranges ─────────────────────────────────────────────────────────────
const ALPHA: Range = Range { field: "compounding_efficiency", min: 0.0, max: 5.0 };
const BETA: Range = Range { field: "friction_penalty", min: 0.0, max: 5.0 };
const GAMMA: Range = Range { field: "collapse_sensitivity", min: 0.0, max: 50.0 };
const THETA: Range = Range { field: "collapse_threshold", min: -10.0, max: 10.0 };
const LOOKBACK: Range = Range { field: "lookback_months", min: 1.0, max: 120.0 };
const HORIZON: Range = Range { field: "horizon_years", min: 1.0, max: 30.0 };
const ITERATIONS: Range = Range { field: "iterations", min: 1.0, max: 100_000.0 };
const VOLATILITY: Range = Range { field: "volatility_multiplier", min: 0.0, max: 10.0 };

impl Range {
    fn check(&self, value: f64) -> Result<(), ForecastError> {
        if !value.is_finite() {
            return Err(ForecastError::invalid(self.field, "must be finite"));
        }
        if value < self.min {
            return Err(ForecastError::invalid(self.field, format!("must be >= {}", self.min)));
        }
        if value > self.max {
            return Err(ForecastError::invalid(self.field, format!("must be <= {}", self.max)));
        }
        Ok(())
    }
}

impl ModelParameters {
    /// Check every field against its range. Reports the first violation.
    pub fn validate(&self) -> Result<(), ForecastError> {
        ALPHA.check(self.compounding_efficiency)?;
        BETA.check(self.friction_penalty)?;
        GAMMA.check(self.collapse_sensitivity)?;
        THETA.check(self.collapse_threshold)?;
        LOOKBACK.check(self.lookback_months as f64)?;
        HORIZON.check(self.horizon_years as f64)?;
        ITERATIONS.check(self.iterations as f64)?;
        VOLATILITY.check(self.volatility_multiplier)?;
        Ok(())
    }

    /// Defaults with `overrides` applied, validated.
    pub fn resolve(overrides: &ParameterOverrides) -> Result<Self, ForecastError> {
        let base = ModelParameters::default();
        let params = ModelParameters {
            compounding_efficiency: overrides.compounding_efficiency.unwrap_or(base.compounding_efficiency),
            friction_penalty: overrides.friction_penalty.unwrap_or(base.friction_penalty),
            collapse_sensitivity: overrides.collapse_sensitivity.unwrap_or(base.collapse_sensitivity),
            collapse_threshold: overrides.collapse_threshold.unwrap_or(base.collapse_threshold),
            lookback_months: overrides.lookback_months.unwrap_or(base.lookback_months),
            horizon_years: overrides.horizon_years.unwrap_or(base.horizon_years),
            iterations: overrides.iterations.unwrap_or(base.iterations),
            volatility_multiplier: overrides.volatility_multiplier.unwrap_or(base.volatility_multiplier),
        };
        params.validate()?;
        Ok(params)
    }

    /// Copy with a different horizon. Used per forecast horizon.
    pub fn with_horizon(&self, horizon_years: u32) -> Self {
        ModelParameters { horizon_years, ..self.clone() }
    }
}

/// Partial parameter set as supplied by a caller. Unset fields fall back to defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParameterOverrides {
    #[serde(alias = "alpha")]
    pub compounding_efficiency: Option<f64>,
    #[serde(alias = "beta")]
    pub friction_penalty: Option<f64>,
    #[serde(alias = "gamma")]
    pub collapse_sensitivity: Option<f64>,
    #[serde(alias = "theta")]
    pub collapse_threshold: Option<f64>,
    #[serde(alias = "lookbackMonths")]
    pub lookback_months: Option<usize>,
    #[serde(alias = "horizonYears")]
    pub horizon_years: Option<u32>,
    pub iterations: Option<usize>,
    #[serde(alias = "volatilityMultiplier")]
    pub volatility_multiplier: Option<f64>,
}

/// Which optional outputs to compute. Everything is off by default.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ComputeOptions {
    pub forecast: bool,
    pub risk_surface: bool,
    pub scenarios: Vec<ScenarioDefinition>,
    pub sensitivity: Option<SensitivityRequest>,
    /// Score the history against its flagged adverse-event months.
    pub backtest: Option<BacktestRequest>,
    /// Summarise the ensemble at the configured horizon into this many buckets.
    pub histogram_buckets: Option<usize>,
    /// Forecast horizons in years; `DEFAULT_HORIZONS` when absent.
    pub horizons: Option<Vec<u32>>,
    /// Fixed RNG seed. A fresh seed is drawn (and reported) when absent.
    pub seed: Option<u64>,
}

impl ComputeOptions {
    /// Horizons to forecast, ascending and de-duplicated, each within the horizon range.
    pub fn resolved_horizons(&self) -> Result<Vec<u32>, ForecastError> {
        let mut horizons = match &self.horizons {
            Some(h) if h.is_empty() => {
                return Err(ForecastError::invalid("horizons", "must not be empty"));
            }
            Some(h) => h.clone(),
            None => DEFAULT_HORIZONS.to_vec(),
        };
        for &h in &horizons {
            HORIZON.check(h as f64).map_err(|_| {
                ForecastError::invalid(
                    "horizons",
                    format!("each horizon must lie in [{}, {}], got {h}", HORIZON.min, HORIZON.max),
                )
            })?;
        }
        horizons.sort_unstable();
        horizons.dedup();
        Ok(horizons)
    }
}
