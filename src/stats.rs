use rand::Rng;
use rand_distr::{Distribution, Open01};
use serde::Serialize;

use crate::error::ForecastError;

/// Default magnitude below which an acceleration counts as stable.
pub const ACCELERATION_THRESHOLD: f64 = 0.001;

/// Mean of the last `window` values.
pub fn windowed_average(series: &[f64], window: usize) -> Result<f64, ForecastError> {
    let tail = trailing(series, window)?;
    Ok(tail.iter().sum::<f64>() / tail.len() as f64)
}

/// Population standard deviation of the last `window` values. Zero for a
/// single-element window.
///
/// Deviations are taken about the window's first value, so a constant window
/// yields exactly zero.
pub fn windowed_std_dev(series: &[f64], window: usize) -> Result<f64, ForecastError> {
    let tail = trailing(series, window)?;
    let n = tail.len() as f64;
    let shift = tail[0];
    let mean = tail.iter().map(|x| x - shift).sum::<f64>() / n;
    let variance = tail.iter().map(|x| (x - shift - mean).powi(2)).sum::<f64>() / n;
    Ok(variance.sqrt())
}

fn trailing(series: &[f64], window: usize) -> Result<&[f64], ForecastError> {
    if window == 0 {
        return Err(ForecastError::invalid("window", "must be >= 1"));
    }
    if series.len() < window {
        return Err(ForecastError::InsufficientData { required: window, available: series.len() });
    }
    Ok(&series[series.len() - window..])
}

/// Second finite difference of the last three values; 0 with fewer than three.
pub fn acceleration(series: &[f64]) -> f64 {
    match series {
        [.., a, b, c] => (c - b) - (b - a),
        _ => 0.0,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AccelerationTrend {
    Accelerating,
    Decelerating,
    Stable,
}

/// Classify an acceleration by sign once its magnitude exceeds `threshold`.
pub fn acceleration_trend(accel: f64, threshold: f64) -> AccelerationTrend {
    if accel > threshold {
        AccelerationTrend::Accelerating
    } else if accel < -threshold {
        AccelerationTrend::Decelerating
    } else {
        AccelerationTrend::Stable
    }
}

/// One draw from Normal(mean, std_dev) via the Box–Muller transform.
///
/// Both uniforms come from the open interval (0, 1), so `ln(u1)` is finite.
/// A zero `std_dev` returns `mean` exactly.
pub fn sample_normal(mean: f64, std_dev: f64, rng: &mut impl Rng) -> f64 {
    let u1: f64 = Open01.sample(rng);
    let u2: f64 = Open01.sample(rng);
    let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    mean + std_dev * z
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    use super::*;

    fn rng() -> ChaCha20Rng {
        ChaCha20Rng::seed_from_u64(42)
    }

    #[test]
    fn windowed_average_uses_trailing_window() {
        let s = [100.0, 1.0, 2.0, 3.0];
        assert!((windowed_average(&s, 3).unwrap() - 2.0).abs() < 1e-12);
        assert!((windowed_average(&s, 4).unwrap() - 26.5).abs() < 1e-12);
    }

    #[test]
    fn windowed_average_insufficient_data() {
        let err = windowed_average(&[1.0, 2.0], 3).unwrap_err();
        assert_eq!(err, ForecastError::InsufficientData { required: 3, available: 2 });
    }

    #[test]
    fn windowed_std_dev_is_population() {
        // [2, 4, 4, 4, 5, 5, 7, 9]: population σ = 2.
        let s = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((windowed_std_dev(&s, 8).unwrap() - 2.0).abs() < 1e-12);
        assert_eq!(windowed_std_dev(&s, 1).unwrap(), 0.0);
    }

    #[test]
    fn windowed_std_dev_exactly_zero_for_constant_window() {
        // 6 × 0.05 sums to 0.30000000000000004; the deviation must still be 0.
        assert_eq!(windowed_std_dev(&[0.05; 6], 6).unwrap(), 0.0);
        assert_eq!(windowed_std_dev(&[0.9, 0.1, 0.1, 0.1], 3).unwrap(), 0.0);
        assert_eq!(windowed_std_dev(&[0.02; 12], 6).unwrap(), 0.0);
    }

    #[test]
    fn acceleration_second_difference() {
        assert!((acceleration(&[0.0, 1.0, 4.0, 9.0]) - 2.0).abs() < 1e-12);
        assert_eq!(acceleration(&[1.0, 2.0]), 0.0);
        assert_eq!(acceleration(&[]), 0.0);
    }

    #[test]
    fn acceleration_trend_thresholds() {
        assert_eq!(acceleration_trend(0.01, ACCELERATION_THRESHOLD), AccelerationTrend::Accelerating);
        assert_eq!(acceleration_trend(-0.01, ACCELERATION_THRESHOLD), AccelerationTrend::Decelerating);
        assert_eq!(acceleration_trend(0.0005, ACCELERATION_THRESHOLD), AccelerationTrend::Stable);
        assert_eq!(acceleration_trend(-0.001, ACCELERATION_THRESHOLD), AccelerationTrend::Stable);
    }

    #[test]
    fn sample_normal_zero_std_dev_returns_mean() {
        let mut rng = rng();
        for _ in 0..100 {
            assert_eq!(sample_normal(0.25, 0.0, &mut rng), 0.25);
        }
    }

    #[test]
    fn sample_normal_reproducible_under_seed() {
        let a: Vec<f64> = {
            let mut r = rng();
            (0..10).map(|_| sample_normal(0.0, 1.0, &mut r)).collect()
        };
        let b: Vec<f64> = {
            let mut r = rng();
            (0..10).map(|_| sample_normal(0.0, 1.0, &mut r)).collect()
        };
        assert_eq!(a, b);
    }

    /// 20k draws from N(3, 2): sample mean within 0.1, sample σ within 0.1.
    #[test]
    fn sample_normal_moments() {
        let mut rng = rng();
        let n = 20_000;
        let draws: Vec<f64> = (0..n).map(|_| sample_normal(3.0, 2.0, &mut rng)).collect();
        let mean = draws.iter().sum::<f64>() / n as f64;
        let sd = (draws.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n as f64).sqrt();
        assert!((mean - 3.0).abs() < 0.1, "mean {mean:.4}");
        assert!((sd - 2.0).abs() < 0.1, "sd {sd:.4}");
        assert!(draws.iter().all(|x| x.is_finite()));
    }
}
