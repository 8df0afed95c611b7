use chrono::NaiveDate;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use nivcast::config::ModelParameters;
use nivcast::projection::AggregateState;
use nivcast::synthetic::synthetic_series;
use nivcast::types::ObservedPoint;

pub struct Fixture {
    pub months: usize,
    pub iterations: usize,
}

pub const SMALL: Fixture = Fixture { months: 24, iterations: 500 };
pub const MEDIUM: Fixture = Fixture { months: 120, iterations: 5_000 };
pub const LARGE: Fixture = Fixture { months: 600, iterations: 50_000 };

pub fn series(months: usize) -> Vec<ObservedPoint> {
    let start = NaiveDate::from_ymd_opt(1980, 1, 1).unwrap();
    synthetic_series(start, months, &mut ChaCha20Rng::seed_from_u64(42))
}

pub fn params(iterations: usize) -> ModelParameters {
    ModelParameters { iterations, ..ModelParameters::default() }
}

/// Aggregate state of a synthetic history with the default lookback.
pub fn state(months: usize) -> AggregateState {
    let p = ModelParameters::default();
    AggregateState::from_series(&series(months), p.lookback_months).unwrap()
}
