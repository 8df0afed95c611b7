use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::analysis::{self, ConfidenceBands};
use crate::config::ModelParameters;
use crate::projection::AggregateState;
use crate::rate::RiskLevel;
use crate::simulation::{self, Simulator};
use crate::types::horizon_date;

/// One point of the forecast curve.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastPoint {
    pub horizon_years: u32,
    /// Last observed month plus the horizon.
    pub date: NaiveDate,
    #[serde(flatten)]
    pub bands: ConfidenceBands,
    /// Fraction of simulated paths that collapsed within the horizon.
    pub collapse_probability: f64,
    pub risk_level: RiskLevel,
}

/// Seed for one horizon's ensemble. Distinct per horizon so horizons are
/// independent re-simulations, not continuations of each other.
pub fn horizon_seed(seed: u64, horizon_years: u32) -> u64 {
    seed ^ (u64::from(horizon_years)).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

pub struct ForecastGenerator<'a> {
    state: &'a AggregateState,
    params: &'a ModelParameters,
    anchor: NaiveDate,
    seed: u64,
}

impl<'a> ForecastGenerator<'a> {
    pub fn new(state: &'a AggregateState, params: &'a ModelParameters, anchor: NaiveDate, seed: u64) -> Self {
        ForecastGenerator { state, params, anchor, seed }
    }

    /// Simulate each horizon independently; one point per horizon in the order given.
    pub fn generate(&self, horizons: &[u32]) -> Vec<ForecastPoint> {
        horizons.iter().filter_map(|&h| self.point(h)).collect()
    }

    fn point(&self, horizon_years: u32) -> Option<ForecastPoint> {
        let params = self.params.with_horizon(horizon_years);
        let outcomes = Simulator::new(self.state, &params, horizon_seed(self.seed, horizon_years)).run_outcomes();
        let bands = analysis::aggregate_paths(&outcomes)?;
        let collapse_probability = simulation::collapse_rate(&outcomes);

        debug!(horizon_years, p50 = bands.p50, collapse_probability, "forecast horizon simulated");

        Some(ForecastPoint {
            horizon_years,
            date: horizon_date(self.anchor, horizon_years),
            bands,
            collapse_probability,
            risk_level: RiskLevel::from_probability(collapse_probability),
        })
    }
}
