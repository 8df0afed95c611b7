use serde::{Deserialize, Serialize};

use crate::config::ModelParameters;
use crate::error::ForecastError;
use crate::projection::{self, AggregateState};
use crate::rate;

pub const DEFAULT_STEPS: usize = 20;
pub const MAX_STEPS: usize = 50;

/// Input varied by a sensitivity sweep. `Momentum` and `Friction` are
/// multipliers on the windowed averages; the rest replace a model coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensitivityTarget {
    Momentum,
    Friction,
    Alpha,
    Beta,
    Gamma,
    Theta,
}

impl SensitivityTarget {
    /// Default `(min, max)` swept when the request gives none.
    fn default_range(self) -> (f64, f64) {
        match self {
            SensitivityTarget::Momentum | SensitivityTarget::Friction => (0.0, 2.0),
            SensitivityTarget::Alpha => (0.0, 2.5),
            SensitivityTarget::Beta => (0.0, 2.0),
            SensitivityTarget::Gamma => (0.0, 10.0),
            SensitivityTarget::Theta => (-1.0, 1.0),
        }
    }

    fn baseline(self, params: &ModelParameters) -> f64 {
        match self {
            SensitivityTarget::Momentum | SensitivityTarget::Friction => 1.0,
            SensitivityTarget::Alpha => params.compounding_efficiency,
            SensitivityTarget::Beta => params.friction_penalty,
            SensitivityTarget::Gamma => params.collapse_sensitivity,
            SensitivityTarget::Theta => params.collapse_threshold,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SensitivityRequest {
    pub target: SensitivityTarget,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub steps: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensitivityPoint {
    pub value: f64,
    pub collapse_probability: f64,
    pub projected_value: f64,
    pub collapse_delta: f64,
    pub projected_delta: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensitivityReport {
    pub target: SensitivityTarget,
    pub horizon_years: u32,
    pub baseline_value: f64,
    pub baseline_collapse_probability: f64,
    pub baseline_projected_value: f64,
    pub points: Vec<SensitivityPoint>,
}

/// `(collapse probability, projected value)` at the configured horizon with
/// `target` set to `value`.
fn evaluate(state: &AggregateState, params: &ModelParameters, target: SensitivityTarget, value: f64) -> (f64, f64) {
    let mut momentum = state.avg_indicator;
    let mut friction = state.clamped_friction();
    let mut p = params.clone();
    match target {
        SensitivityTarget::Momentum => momentum *= value,
        SensitivityTarget::Friction => friction *= value,
        SensitivityTarget::Alpha => p.compounding_efficiency = value,
        SensitivityTarget::Beta => p.friction_penalty = value,
        SensitivityTarget::Gamma => p.collapse_sensitivity = value,
        SensitivityTarget::Theta => p.collapse_threshold = value,
    }
    let prob = rate::collapse_probability(friction, p.collapse_sensitivity, p.collapse_threshold);
    let r = rate::effective_rate(momentum, friction, p.compounding_efficiency, p.friction_penalty);
    let projected = projection::cumulative_regeneration(state.current_indicator, r, p.horizon_years as f64, prob);
    (prob, projected)
}

/// Sweep one input over `steps + 1` evenly spaced values, both ends included.
pub fn sweep(
    state: &AggregateState,
    params: &ModelParameters,
    request: &SensitivityRequest,
) -> Result<SensitivityReport, ForecastError> {
    let (default_min, default_max) = request.target.default_range();
    let min = request.min_value.unwrap_or(default_min);
    let max = request.max_value.unwrap_or(default_max);
    let steps = request.steps.unwrap_or(DEFAULT_STEPS);

    if !min.is_finite() || !max.is_finite() || min >= max {
        return Err(ForecastError::invalid("sensitivity.range", "min_value and max_value must be finite with min < max"));
    }
    if steps == 0 || steps > MAX_STEPS {
        return Err(ForecastError::invalid("sensitivity.steps", format!("must lie in [1, {MAX_STEPS}]")));
    }

    let baseline_value = request.target.baseline(params);
    let (baseline_prob, baseline_projected) = evaluate(state, params, request.target, baseline_value);
    let step = (max - min) / steps as f64;

    let points = (0..=steps)
        .map(|i| {
            let value = min + i as f64 * step;
            let (collapse_probability, projected_value) = evaluate(state, params, request.target, value);
            SensitivityPoint {
                value,
                collapse_probability,
                projected_value,
                collapse_delta: collapse_probability - baseline_prob,
                projected_delta: projected_value - baseline_projected,
            }
        })
        .collect();

    Ok(SensitivityReport {
        target: request.target,
        horizon_years: params.horizon_years,
        baseline_value,
        baseline_collapse_probability: baseline_prob,
        baseline_projected_value: baseline_projected,
        points,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::tests::constant_series;

    fn request(target: SensitivityTarget) -> SensitivityRequest {
        SensitivityRequest { target, min_value: None, max_value: None, steps: None }
    }

    fn state() -> AggregateState {
        AggregateState::from_series(&constant_series(6), 6).unwrap()
    }

    #[test]
    fn default_sweep_has_steps_plus_one_points() {
        let report = sweep(&state(), &ModelParameters::default(), &request(SensitivityTarget::Friction)).unwrap();
        assert_eq!(report.points.len(), DEFAULT_STEPS + 1);
        assert_eq!(report.points[0].value, 0.0);
        assert!((report.points[DEFAULT_STEPS].value - 2.0).abs() < 1e-12);
        assert_eq!(report.baseline_value, 1.0);
    }

    #[test]
    fn baseline_point_has_zero_delta() {
        // Friction multiplier range [0, 2] in 20 steps puts 1.0 at index 10.
        let report = sweep(&state(), &ModelParameters::default(), &request(SensitivityTarget::Friction)).unwrap();
        let mid = &report.points[10];
        assert!(mid.collapse_delta.abs() < 1e-12);
        assert!(mid.projected_delta.abs() < 1e-12);
    }

    #[test]
    fn friction_multiplier_raises_collapse() {
        let report = sweep(&state(), &ModelParameters::default(), &request(SensitivityTarget::Friction)).unwrap();
        for w in report.points.windows(2) {
            assert!(w[1].collapse_probability > w[0].collapse_probability);
        }
    }

    #[test]
    fn alpha_sweep_raises_projection_for_positive_momentum() {
        let report = sweep(&state(), &ModelParameters::default(), &request(SensitivityTarget::Alpha)).unwrap();
        assert_eq!(report.baseline_value, 1.1);
        for w in report.points.windows(2) {
            assert!(w[1].projected_value > w[0].projected_value);
            assert_eq!(w[1].collapse_probability, w[0].collapse_probability);
        }
    }

    #[test]
    fn rejects_bad_range_and_steps() {
        let s = state();
        let p = ModelParameters::default();
        let bad_range = SensitivityRequest { min_value: Some(2.0), max_value: Some(1.0), ..request(SensitivityTarget::Gamma) };
        assert!(sweep(&s, &p, &bad_range).is_err());
        let too_many = SensitivityRequest { steps: Some(51), ..request(SensitivityTarget::Gamma) };
        assert!(sweep(&s, &p, &too_many).is_err());
        let zero = SensitivityRequest { steps: Some(0), ..request(SensitivityTarget::Gamma) };
        assert!(sweep(&s, &p, &zero).is_err());
    }

    #[test]
    fn request_deserializes() {
        let r: SensitivityRequest = serde_json::from_str(r#"{"target": "theta", "steps": 10}"#).unwrap();
        assert_eq!(r.target, SensitivityTarget::Theta);
        assert_eq!(r.steps, Some(10));
        assert_eq!(r.min_value, None);
    }
}
