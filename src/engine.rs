//! The single synchronous entry point: `compute(series, overrides, options)`.
//!
//! All validation happens here, eagerly, before any simulation work.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use tracing::{info, warn};

use crate::analysis::{self, DistStats, HistogramBucket};
use crate::backtest::{self, BacktestReport};
use crate::config::{ComputeOptions, MAX_SCENARIOS, MIN_STABLE_ITERATIONS, ModelParameters, ParameterOverrides};
use crate::error::{ForecastError, Warning};
use crate::forecast::{ForecastGenerator, ForecastPoint, horizon_seed};
use crate::projection::{self, AggregateState, MIN_OBSERVATIONS};
use crate::rate::{self, RiskLevel};
use crate::scenario::{self, ScenarioAnalyzer, ScenarioOutcome};
use crate::sensitivity::{self, SensitivityReport};
use crate::simulation::Simulator;
use crate::stats::{self, ACCELERATION_THRESHOLD, AccelerationTrend};
use crate::surface::{self, RiskSurfaceCell, SURFACE_HORIZONS, SURFACE_OFFSETS};
use crate::types::ObservedPoint;

const MAX_HISTOGRAM_BUCKETS: usize = 200;

/// Ensemble at the configured horizon, summarised.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TerminalDistribution {
    pub horizon_years: u32,
    pub stats: DistStats,
    pub histogram: Vec<HistogramBucket>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metadata {
    pub input_points: usize,
    pub parameters: ModelParameters,
    /// Seed actually used; replaying with it reproduces every stochastic output.
    pub seed: u64,
    pub computed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComputeResult {
    pub state: AggregateState,
    pub acceleration_trend: AccelerationTrend,
    pub effective_rate: f64,
    pub collapse_probability: f64,
    pub risk_level: RiskLevel,
    /// Closed-form cumulative regeneration at the configured horizon.
    pub projected_value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forecast: Option<Vec<ForecastPoint>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distribution: Option<TerminalDistribution>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_surface: Option<Vec<RiskSurfaceCell>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scenarios: Option<Vec<ScenarioOutcome>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sensitivity: Option<SensitivityReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backtest: Option<BacktestReport>,
    pub warnings: Vec<Warning>,
    pub metadata: Metadata,
}

/// Finite values, strictly ascending dates, enough points for the lookback.
pub fn validate_series(series: &[ObservedPoint], lookback: usize) -> Result<(), ForecastError> {
    let required = lookback.max(MIN_OBSERVATIONS);
    if series.len() < required {
        return Err(ForecastError::InsufficientData { required, available: series.len() });
    }
    for (i, point) in series.iter().enumerate() {
        for (name, value) in point.numeric_fields() {
            if !value.is_finite() {
                return Err(ForecastError::invalid(format!("series[{i}].{name}"), "must be finite"));
            }
        }
    }
    for (i, w) in series.windows(2).enumerate() {
        if w[1].date <= w[0].date {
            return Err(ForecastError::invalid(
                format!("series[{}].date", i + 1),
                format!("must be after {} (chronological, no duplicate months)", w[0].date),
            ));
        }
    }
    Ok(())
}

fn validate_options(options: &ComputeOptions) -> Result<Vec<u32>, ForecastError> {
    if options.scenarios.len() > MAX_SCENARIOS {
        return Err(ForecastError::invalid(
            "scenarios",
            format!("at most {MAX_SCENARIOS} allowed, got {}", options.scenarios.len()),
        ));
    }
    for s in &options.scenarios {
        s.validate()?;
    }
    if let Some(buckets) = options.histogram_buckets
        && (buckets == 0 || buckets > MAX_HISTOGRAM_BUCKETS)
    {
        return Err(ForecastError::invalid(
            "histogram_buckets",
            format!("must lie in [1, {MAX_HISTOGRAM_BUCKETS}]"),
        ));
    }
    if let Some(req) = &options.backtest {
        req.resolved_threshold()?;
    }
    options.resolved_horizons()
}

/// Run the engine over `series`.
///
/// Parameters, options and the series are validated before any simulation
/// starts. Optional outputs are computed only when `options` asks for them.
pub fn compute(
    series: &[ObservedPoint],
    overrides: &ParameterOverrides,
    options: &ComputeOptions,
) -> Result<ComputeResult, ForecastError> {
    let params = ModelParameters::resolve(overrides)?;
    validate_series(series, params.lookback_months)?;
    let horizons = validate_options(options)?;
    let seed = options.seed.unwrap_or_else(|| rand::rng().random());

    info!(
        points = series.len(),
        iterations = params.iterations,
        seed,
        forecast = options.forecast,
        risk_surface = options.risk_surface,
        scenarios = options.scenarios.len(),
        "computing forecast"
    );

    let mut warnings = Vec::new();
    let state = AggregateState::from_series(series, params.lookback_months)?;
    if state.has_zero_variance() {
        warn!("zero historical variance in lookback window; bands reflect collapse draws only");
        warnings.push(Warning::ZeroVariance);
    }
    let simulates = options.forecast || !options.scenarios.is_empty() || options.histogram_buckets.is_some();
    if simulates && params.iterations < MIN_STABLE_ITERATIONS {
        warn!(iterations = params.iterations, "iteration count too low for stable percentile bands");
        warnings.push(Warning::LowIterationCount { iterations: params.iterations });
    }

    let friction = state.clamped_friction();
    let collapse_probability =
        rate::collapse_probability(friction, params.collapse_sensitivity, params.collapse_threshold);
    let effective_rate =
        rate::effective_rate(state.avg_indicator, friction, params.compounding_efficiency, params.friction_penalty);
    let projected_value = projection::cumulative_regeneration(
        state.current_indicator,
        effective_rate,
        params.horizon_years as f64,
        collapse_probability,
    );
    let anchor = scenario::anchor_date(series)?;

    let analyzer = ScenarioAnalyzer::new(series, &params, &horizons, seed);
    let baseline_curve = if options.forecast || !options.scenarios.is_empty() {
        Some(ForecastGenerator::new(&state, &params, anchor, seed).generate(&horizons))
    } else {
        None
    };

    let scenarios = match (&baseline_curve, options.scenarios.is_empty()) {
        (Some(baseline), false) => Some(
            options
                .scenarios
                .iter()
                .map(|s| analyzer.analyze(s, baseline, &mut warnings))
                .collect::<Result<Vec<_>, _>>()?,
        ),
        _ => None,
    };

    let distribution = options.histogram_buckets.map(|buckets| {
        let outcomes = Simulator::new(&state, &params, horizon_seed(seed, params.horizon_years)).run_outcomes();
        let finals: Vec<f64> = outcomes.iter().map(|o| o.final_value).collect();
        analysis::dist_stats(&finals).map(|stats| TerminalDistribution {
            horizon_years: params.horizon_years,
            stats,
            histogram: analysis::histogram(&finals, buckets),
        })
    });

    let risk_surface = options
        .risk_surface
        .then(|| surface::generate(&state, &params, &SURFACE_HORIZONS, &SURFACE_OFFSETS));

    let sensitivity = options
        .sensitivity
        .as_ref()
        .map(|req| sensitivity::sweep(&state, &params, req))
        .transpose()?;

    let backtest_report = options
        .backtest
        .as_ref()
        .map(|req| backtest::run(series, &params, req))
        .transpose()?;

    let result = ComputeResult {
        acceleration_trend: stats::acceleration_trend(state.acceleration, ACCELERATION_THRESHOLD),
        effective_rate,
        collapse_probability,
        risk_level: RiskLevel::from_probability(collapse_probability),
        projected_value,
        forecast: if options.forecast { baseline_curve } else { None },
        distribution: distribution.flatten(),
        risk_surface,
        scenarios,
        sensitivity,
        backtest: backtest_report,
        warnings,
        metadata: Metadata {
            input_points: series.len(),
            parameters: params,
            seed,
            computed_at: Utc::now(),
        },
        state,
    };

    info!(
        collapse_probability = result.collapse_probability,
        projected_value = result.projected_value,
        warnings = result.warnings.len(),
        "forecast computed"
    );
    Ok(result)
}
