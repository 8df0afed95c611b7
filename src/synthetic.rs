//! Synthetic monthly history for demos, benchmarks and tests.
//!
//! Components follow a seven-year business cycle with normal noise. Stress
//! episodes arrive as a Poisson process; while one is active friction spikes,
//! thrust falls and the month is flagged as a known adverse event.

use chrono::{Months, NaiveDate};
use rand::Rng;
use rand_distr::{Distribution, Poisson};

use crate::scenario::composite_indicator;
use crate::stats::sample_normal;
use crate::types::ObservedPoint;

const CYCLE_YEARS: f64 = 7.0;

/// Expected stress episodes per year.
const STRESS_FREQUENCY: f64 = 0.12;
const STRESS_MONTHS: u32 = 9;

/// Generate `months` observations starting at `start`.
pub fn synthetic_series(start: NaiveDate, months: usize, rng: &mut impl Rng) -> Vec<ObservedPoint> {
    let episodes = Poisson::new(STRESS_FREQUENCY / 12.0).ok();
    let mut stress_left = 0u32;

    (0..months)
        .map(|i| {
            let t = i as f64 / 12.0;
            let phase = (t * 2.0 * std::f64::consts::PI / CYCLE_YEARS).sin();

            let arrivals: f64 = episodes.as_ref().map_or(0.0, |d| d.sample(rng));
            if stress_left == 0 && arrivals >= 1.0 {
                stress_left = STRESS_MONTHS;
            }
            let stressed = stress_left > 0;
            stress_left = stress_left.saturating_sub(1);

            let mut momentum = (0.15 + 0.05 * phase + sample_normal(0.0, 0.01, rng)).tanh();
            let efficiency = (0.08 + 0.01 * phase + sample_normal(0.0, 0.002, rng)).max(0.01);
            let slack = (0.23 - 0.04 * phase + sample_normal(0.0, 0.005, rng)).max(0.01);
            let mut friction = (0.03 - 0.01 * phase + sample_normal(0.0, 0.003, rng)).max(0.0);
            if stressed {
                momentum -= 0.1;
                friction += 0.08;
            }

            ObservedPoint {
                date: start.checked_add_months(Months::new(i as u32)).unwrap_or(start),
                momentum,
                efficiency,
                slack,
                friction,
                indicator: composite_indicator(momentum, efficiency, slack, friction),
                adverse_event: stressed,
            }
        })
        .collect()
}
