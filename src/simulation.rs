//! Monte Carlo path simulator.
//!
//! Each path steps monthly from the current windowed state. Momentum and
//! friction take independent normal shocks, both scaled by the indicator's
//! windowed std-dev; every step carries a small
//! hazard of an irreversible collapse that dampens momentum and pins the
//! risk adjustment high for the rest of the path.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use rayon::prelude::*;
use serde::Serialize;

use crate::config::ModelParameters;
use crate::projection::AggregateState;
use crate::rate;
use crate::stats;
use crate::types::PathId;

pub const STEPS_PER_YEAR: u32 = 12;

/// Historical std-dev is scaled down by this (times the volatility multiplier) per monthly shock.
pub const SHOCK_SCALE: f64 = 0.1;

/// Momentum multiplier applied once, at the step a path collapses.
pub const COLLAPSE_DAMPENING: f64 = 0.3;

/// Risk adjustment used for every step after a collapse.
pub const POST_COLLAPSE_RISK: f64 = 0.8;

/// Simulated momentum never falls below this.
pub const MOMENTUM_FLOOR: f64 = -0.5;

/// Simulated friction never falls below this.
pub const FRICTION_FLOOR: f64 = 0.0;

/// One stochastic realisation. Consumed by the aggregator, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulatedPath {
    pub id: PathId,
    /// Risk-adjusted cumulative value after each monthly step.
    pub values: Vec<f64>,
    pub final_value: f64,
    pub collapsed: bool,
    /// Zero-based step at which the collapse latch fired.
    pub collapse_step: Option<usize>,
}

/// Terminal summary of one path; what the aggregators consume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathOutcome {
    pub final_value: f64,
    pub collapsed: bool,
}

impl SimulatedPath {
    pub fn outcome(&self) -> PathOutcome {
        PathOutcome { final_value: self.final_value, collapsed: self.collapsed }
    }
}

pub struct Simulator<'a> {
    state: &'a AggregateState,
    params: &'a ModelParameters,
    seed: u64,
}

impl<'a> Simulator<'a> {
    pub fn new(state: &'a AggregateState, params: &'a ModelParameters, seed: u64) -> Self {
        Simulator { state, params, seed }
    }

    pub fn total_steps(&self) -> usize {
        (self.params.horizon_years * STEPS_PER_YEAR) as usize
    }

    /// Simulate `params.iterations` paths in parallel, returned in path order.
    ///
    /// Path `i` draws from ChaCha stream `i` of the run seed, so the ensemble
    /// is identical however rayon schedules the work.
    pub fn run(&self) -> Vec<SimulatedPath> {
        (0..self.params.iterations as u64)
            .into_par_iter()
            .map(|i| self.simulate_path(PathId(i)))
            .collect()
    }

    /// Same ensemble as [`Simulator::run`], keeping only each path's outcome.
    /// Memory stays at one entry per path whatever the horizon.
    pub fn run_outcomes(&self) -> Vec<PathOutcome> {
        (0..self.params.iterations as u64)
            .into_par_iter()
            .map(|i| {
                let (final_value, collapse_step) = self.walk(PathId(i), |_| {});
                PathOutcome { final_value, collapsed: collapse_step.is_some() }
            })
            .collect()
    }

    pub fn simulate_path(&self, id: PathId) -> SimulatedPath {
        let mut values = Vec::with_capacity(self.total_steps());
        let (final_value, collapse_step) = self.walk(id, |v| values.push(v));
        SimulatedPath { id, values, final_value, collapsed: collapse_step.is_some(), collapse_step }
    }

    /// Step one path, handing each risk-adjusted value to `record`.
    /// Returns the final value and the collapse step, if any.
    fn walk(&self, id: PathId, mut record: impl FnMut(f64)) -> (f64, Option<usize>) {
        let mut rng = ChaCha20Rng::seed_from_u64(self.seed);
        rng.set_stream(id.0);

        let p = self.params;
        let total_steps = self.total_steps();
        let shock_scale = p.volatility_multiplier * SHOCK_SCALE;
        let shock_sd = self.state.volatility * shock_scale;
        let baseline = self.state.current_indicator;

        let mut momentum = self.state.avg_indicator;
        let mut friction = self.state.clamped_friction();
        let mut growth = 1.0;
        let mut collapse_step = None;
        let mut last = baseline;

        for step in 0..total_steps {
            momentum = (momentum + stats::sample_normal(0.0, shock_sd, &mut rng)).max(MOMENTUM_FLOOR);
            friction = (friction + stats::sample_normal(0.0, shock_sd, &mut rng)).max(FRICTION_FLOOR);

            let step_prob = rate::collapse_probability(friction, p.collapse_sensitivity, p.collapse_threshold);

            // Per-step hazard approximating the horizon-level probability.
            if collapse_step.is_none() && rng.random::<f64>() < step_prob / total_steps as f64 {
                collapse_step = Some(step);
                momentum *= COLLAPSE_DAMPENING;
            }

            let risk = if collapse_step.is_some() { POST_COLLAPSE_RISK } else { step_prob };
            let r = rate::effective_rate(momentum, friction, p.compounding_efficiency, p.friction_penalty);
            growth *= (r / STEPS_PER_YEAR as f64).exp();
            last = baseline * growth * (1.0 - risk);
            record(last);
        }

        (last, collapse_step)
    }
}

/// Fraction of paths whose collapse latch fired. Zero for an empty ensemble.
pub fn collapse_rate(outcomes: &[PathOutcome]) -> f64 {
    if outcomes.is_empty() {
        return 0.0;
    }
    outcomes.iter().filter(|o| o.collapsed).count() as f64 / outcomes.len() as f64
}
