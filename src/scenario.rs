//! Counterfactual shock scenarios.
//!
//! A scenario scales momentum, friction and efficiency by fixed percentages
//! over the trailing months of the history, recomputes the composite
//! indicator for those months, and compares the forecast it produces with the
//! unshocked baseline under the same random draws.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ModelParameters;
use crate::error::{ForecastError, Warning};
use crate::forecast::{ForecastGenerator, ForecastPoint};
use crate::projection::AggregateState;
use crate::types::ObservedPoint;

/// Friction exponent in the composite formula.
pub const ETA: f64 = 1.5;

/// Floor on `slack + friction` so the composite never divides by zero or
/// raises a negative base to a fractional power.
pub const EPSILON: f64 = 0.001;

const MIN_SHOCK_PCT: f64 = -100.0;
const MAX_SHOCK_PCT: f64 = 1000.0;
const MAX_DURATION_MONTHS: usize = 1200;

/// Composite indicator: `(momentum · efficiency²) / (slack + friction)^η`.
pub fn composite_indicator(momentum: f64, efficiency: f64, slack: f64, friction: f64) -> f64 {
    let denominator = (slack + friction).max(EPSILON).powf(ETA);
    momentum * efficiency.powi(2) / denominator
}

/// A named shock template. Shocks are percentages: `+20` scales a component by 1.2.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub momentum_shock: f64,
    #[serde(default)]
    pub friction_shock: f64,
    #[serde(default)]
    pub efficiency_shock: f64,
    /// Number of trailing months the shock applies to.
    pub duration_months: usize,
}

impl ScenarioDefinition {
    pub fn new(
        name: &str,
        description: &str,
        momentum_shock: f64,
        friction_shock: f64,
        efficiency_shock: f64,
        duration_months: usize,
    ) -> Self {
        ScenarioDefinition {
            name: name.to_string(),
            description: description.to_string(),
            momentum_shock,
            friction_shock,
            efficiency_shock,
            duration_months,
        }
    }

    pub fn validate(&self) -> Result<(), ForecastError> {
        if self.name.trim().is_empty() {
            return Err(ForecastError::invalid("scenario.name", "must not be empty"));
        }
        for (field, shock) in [
            ("momentum_shock", self.momentum_shock),
            ("friction_shock", self.friction_shock),
            ("efficiency_shock", self.efficiency_shock),
        ] {
            let field = format!("scenario[{}].{field}", self.name);
            if !shock.is_finite() {
                return Err(ForecastError::invalid(field, "must be finite"));
            }
            if !(MIN_SHOCK_PCT..=MAX_SHOCK_PCT).contains(&shock) {
                return Err(ForecastError::invalid(
                    field,
                    format!("must lie in [{MIN_SHOCK_PCT}, {MAX_SHOCK_PCT}] percent"),
                ));
            }
        }
        if self.duration_months > MAX_DURATION_MONTHS {
            return Err(ForecastError::invalid(
                format!("scenario[{}].duration_months", self.name),
                format!("must be <= {MAX_DURATION_MONTHS}"),
            ));
        }
        Ok(())
    }

    /// True when applying the scenario leaves every point unchanged.
    pub fn is_null(&self) -> bool {
        self.duration_months == 0
            || (self.momentum_shock == 0.0 && self.friction_shock == 0.0 && self.efficiency_shock == 0.0)
    }

    /// Library of ready-made stress scenarios.
    pub fn presets() -> Vec<ScenarioDefinition> {
        vec![
            ScenarioDefinition::new(
                "policy_tightening",
                "Rate hikes cut thrust and raise real-rate drag",
                -30.0, 25.0, 0.0, 6,
            ),
            ScenarioDefinition::new(
                "productivity_boom",
                "Investment-led efficiency gains with easing friction",
                10.0, -10.0, 20.0, 12,
            ),
            ScenarioDefinition::new(
                "credit_crunch",
                "Spread blow-out: friction spikes, thrust stalls",
                -20.0, 60.0, -5.0, 3,
            ),
            ScenarioDefinition::new(
                "stagflation",
                "Persistent drag with eroding productivity",
                -15.0, 40.0, -15.0, 12,
            ),
        ]
    }
}

/// Shocked copy of `series`: the trailing `duration_months` points get scaled
/// components and a recomputed indicator; earlier points pass through.
pub fn apply_shock(series: &[ObservedPoint], scenario: &ScenarioDefinition) -> Vec<ObservedPoint> {
    if scenario.is_null() {
        return series.to_vec();
    }
    let scale = |shock: f64| 1.0 + shock / 100.0;
    let first_shocked = series.len().saturating_sub(scenario.duration_months);

    series
        .iter()
        .enumerate()
        .map(|(i, p)| {
            if i < first_shocked {
                return p.clone();
            }
            let momentum = p.momentum * scale(scenario.momentum_shock);
            let friction = p.friction * scale(scenario.friction_shock);
            let efficiency = p.efficiency * scale(scenario.efficiency_shock);
            ObservedPoint {
                momentum,
                friction,
                efficiency,
                indicator: composite_indicator(momentum, efficiency, p.slack, friction),
                ..p.clone()
            }
        })
        .collect()
}

/// Baseline versus shocked forecast for one scenario.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioOutcome {
    pub scenario: ScenarioDefinition,
    pub baseline: Vec<ForecastPoint>,
    pub shocked: Vec<ForecastPoint>,
    /// Percentage change of the terminal median. `None` when the baseline median is zero.
    pub terminal_impact_pct: Option<f64>,
    /// Shocked minus baseline terminal collapse probability.
    pub collapse_probability_change: f64,
}

/// Relative change in percent against `|baseline|`; undefined for a zero baseline.
pub fn percentage_impact(baseline: f64, shocked: f64) -> Option<f64> {
    if baseline == 0.0 {
        None
    } else {
        Some((shocked - baseline) / baseline.abs() * 100.0)
    }
}

pub struct ScenarioAnalyzer<'a> {
    series: &'a [ObservedPoint],
    params: &'a ModelParameters,
    horizons: &'a [u32],
    seed: u64,
}

impl<'a> ScenarioAnalyzer<'a> {
    pub fn new(series: &'a [ObservedPoint], params: &'a ModelParameters, horizons: &'a [u32], seed: u64) -> Self {
        ScenarioAnalyzer { series, params, horizons, seed }
    }

    fn curve(&self, series: &[ObservedPoint]) -> Result<Vec<ForecastPoint>, ForecastError> {
        let state = AggregateState::from_series(series, self.params.lookback_months)?;
        let anchor = anchor_date(series)?;
        Ok(ForecastGenerator::new(&state, self.params, anchor, self.seed).generate(self.horizons))
    }

    pub fn baseline(&self) -> Result<Vec<ForecastPoint>, ForecastError> {
        self.curve(self.series)
    }

    /// Compare `scenario` against a precomputed `baseline` curve. The shocked
    /// curve reuses the baseline seed, so a null scenario reproduces it exactly.
    pub fn analyze(
        &self,
        scenario: &ScenarioDefinition,
        baseline: &[ForecastPoint],
        warnings: &mut Vec<Warning>,
    ) -> Result<ScenarioOutcome, ForecastError> {
        scenario.validate()?;
        let shocked = self.curve(&apply_shock(self.series, scenario))?;

        let (terminal_impact_pct, collapse_probability_change) = match (baseline.last(), shocked.last()) {
            (Some(b), Some(s)) => (
                percentage_impact(b.bands.p50, s.bands.p50),
                s.collapse_probability - b.collapse_probability,
            ),
            _ => (None, 0.0),
        };

        if terminal_impact_pct.is_none() {
            warn!(scenario = %scenario.name, "baseline terminal median is zero; percentage impact undefined");
            warnings.push(Warning::UndefinedRatio { scenario: scenario.name.clone() });
        }
        debug!(scenario = %scenario.name, ?terminal_impact_pct, collapse_probability_change, "scenario analysed");

        Ok(ScenarioOutcome {
            scenario: scenario.clone(),
            baseline: baseline.to_vec(),
            shocked,
            terminal_impact_pct,
            collapse_probability_change,
        })
    }
}

pub(crate) fn anchor_date(series: &[ObservedPoint]) -> Result<NaiveDate, ForecastError> {
    series
        .last()
        .map(|p| p.date)
        .ok_or(ForecastError::InsufficientData { required: 1, available: 0 })
}
