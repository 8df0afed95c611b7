//! Rolling backtest of the closed-form collapse probability against months
//! flagged as known adverse events.
//!
//! Every month with a full lookback window behind it is scored from that
//! window alone. A month signals when its probability exceeds the threshold;
//! signals on flagged months are hits, signals elsewhere are false alarms and
//! flagged months without a signal are misses.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::ModelParameters;
use crate::error::ForecastError;
use crate::projection::{AggregateState, MIN_OBSERVATIONS};
use crate::rate;
use crate::types::ObservedPoint;

/// Probability above which a month counts as signalling.
pub const DEFAULT_SIGNAL_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct BacktestRequest {
    /// Signal threshold in (0, 1); `DEFAULT_SIGNAL_THRESHOLD` when absent.
    pub threshold: Option<f64>,
}

impl BacktestRequest {
    /// Effective signal threshold, rejected unless strictly inside (0, 1).
    pub fn resolved_threshold(&self) -> Result<f64, ForecastError> {
        let threshold = self.threshold.unwrap_or(DEFAULT_SIGNAL_THRESHOLD);
        if threshold > 0.0 && threshold < 1.0 {
            Ok(threshold)
        } else {
            Err(ForecastError::invalid("backtest.threshold", "must lie in (0, 1)"))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestPoint {
    pub date: NaiveDate,
    pub collapse_probability: f64,
    pub signal: bool,
    pub adverse_event: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestReport {
    pub threshold: f64,
    /// Months scored; the first `max(lookback, 3) - 1` have no full window.
    pub evaluated_points: usize,
    pub adverse_months: usize,
    pub signals: usize,
    pub hits: usize,
    pub false_alarms: usize,
    pub misses: usize,
    /// `hits / adverse_months`; `None` when nothing is flagged.
    pub hit_rate: Option<f64>,
    /// `false_alarms / signals`; `None` when nothing signals.
    pub false_alarm_ratio: Option<f64>,
    pub avg_probability: f64,
    pub max_probability: f64,
    pub min_probability: f64,
    pub points: Vec<BacktestPoint>,
}

fn ratio(num: usize, den: usize) -> Option<f64> {
    (den > 0).then(|| num as f64 / den as f64)
}

/// Score every month of `series` that has a full window behind it.
///
/// `series` must already be validated; at least one month is always scored.
pub fn run(
    series: &[ObservedPoint],
    params: &ModelParameters,
    request: &BacktestRequest,
) -> Result<BacktestReport, ForecastError> {
    let threshold = request.resolved_threshold()?;
    let window = params.lookback_months.max(MIN_OBSERVATIONS);
    if series.len() < window {
        return Err(ForecastError::InsufficientData { required: window, available: series.len() });
    }

    let points = series
        .windows(window)
        .map(|w| {
            let state = AggregateState::from_series(w, params.lookback_months)?;
            let collapse_probability =
                rate::collapse_probability(state.clamped_friction(), params.collapse_sensitivity, params.collapse_threshold);
            let last = &w[window - 1];
            Ok(BacktestPoint {
                date: last.date,
                collapse_probability,
                signal: collapse_probability > threshold,
                adverse_event: last.adverse_event,
            })
        })
        .collect::<Result<Vec<_>, ForecastError>>()?;

    let adverse_months = points.iter().filter(|p| p.adverse_event).count();
    let signals = points.iter().filter(|p| p.signal).count();
    let hits = points.iter().filter(|p| p.signal && p.adverse_event).count();
    let probs = points.iter().map(|p| p.collapse_probability);

    Ok(BacktestReport {
        threshold,
        evaluated_points: points.len(),
        adverse_months,
        signals,
        hits,
        false_alarms: signals - hits,
        misses: adverse_months - hits,
        hit_rate: ratio(hits, adverse_months),
        false_alarm_ratio: ratio(signals - hits, signals),
        avg_probability: probs.clone().sum::<f64>() / points.len() as f64,
        max_probability: probs.clone().fold(f64::NEG_INFINITY, f64::max),
        min_probability: probs.fold(f64::INFINITY, f64::min),
        points,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::tests::constant_series;

    fn params(lookback_months: usize) -> ModelParameters {
        ModelParameters { lookback_months, ..ModelParameters::default() }
    }

    /// Friction spikes at month 3 (unflagged) and from month 8 (flagged);
    /// month 6 is flagged with calm friction.
    fn labelled_series() -> Vec<ObservedPoint> {
        let mut series = constant_series(12);
        series[3].friction = 0.2;
        series[6].adverse_event = true;
        for point in &mut series[8..] {
            point.friction = 0.2;
            point.adverse_event = true;
        }
        series
    }

    #[test]
    fn counts_hits_false_alarms_and_misses() {
        let report = run(&labelled_series(), &params(3), &BacktestRequest::default()).unwrap();
        assert_eq!(report.evaluated_points, 10);
        assert_eq!(report.points[0].date, labelled_series()[2].date);
        assert_eq!(report.adverse_months, 5);
        assert_eq!(report.signals, 7);
        assert_eq!(report.hits, 4);
        assert_eq!(report.false_alarms, 3);
        assert_eq!(report.misses, 1);
        assert_eq!(report.hit_rate, Some(0.8));
        assert!((report.false_alarm_ratio.unwrap() - 3.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn each_month_scored_from_its_own_window() {
        let report = run(&labelled_series(), &params(3), &BacktestRequest::default()).unwrap();
        // Window (1, 2, 3) averages friction to 0.08.
        let expected = rate::collapse_probability(0.08, 3.5, 0.15);
        assert!((report.points[1].collapse_probability - expected).abs() < 1e-12);
        let calm = rate::collapse_probability(0.02, 3.5, 0.15);
        assert!((report.points[0].collapse_probability - calm).abs() < 1e-12);
        assert!((report.min_probability - calm).abs() < 1e-12);
        assert!(report.max_probability > DEFAULT_SIGNAL_THRESHOLD);
    }

    #[test]
    fn unlabelled_calm_history_has_no_ratios() {
        let report = run(&constant_series(12), &params(6), &BacktestRequest::default()).unwrap();
        assert_eq!(report.evaluated_points, 7);
        assert_eq!(report.signals, 0);
        assert_eq!(report.hit_rate, None);
        assert_eq!(report.false_alarm_ratio, None);
    }

    #[test]
    fn lower_threshold_signals_more() {
        let strict = run(&labelled_series(), &params(3), &BacktestRequest { threshold: Some(0.9) }).unwrap();
        let loose = run(&labelled_series(), &params(3), &BacktestRequest { threshold: Some(0.4) }).unwrap();
        assert_eq!(strict.signals, 0);
        assert_eq!(loose.signals, loose.evaluated_points);
    }

    #[test]
    fn rejects_threshold_outside_unit_interval() {
        for t in [0.0, 1.0, -0.2, f64::NAN] {
            let err = run(&labelled_series(), &params(3), &BacktestRequest { threshold: Some(t) }).unwrap_err();
            assert_eq!(err, ForecastError::invalid("backtest.threshold", "must lie in (0, 1)"));
        }
    }
}
