use serde::Serialize;

use crate::simulation::PathOutcome;

/// Percentile bands of an ensemble's final values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfidenceBands {
    pub p5: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p95: f64,
}

impl ConfidenceBands {
    /// Width of the 90% band.
    pub fn spread(&self) -> f64 {
        self.p95 - self.p5
    }
}

/// Distribution statistics for an ensemble: bands plus moments and extremes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistStats {
    pub n: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Population standard deviation.
    pub std_dev: f64,
    pub bands: ConfidenceBands,
}

/// One equal-width histogram bucket over `[range_start, range_end)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBucket {
    pub range_start: f64,
    pub range_end: f64,
    pub count: usize,
    pub frequency: f64,
}

pub const DEFAULT_HISTOGRAM_BUCKETS: usize = 20;

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut v = values.to_vec();
    v.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    v
}

/// Floor-indexed empirical percentile of ascending `sorted`: `sorted[⌊n·p⌋]`, no interpolation.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    let idx = ((n as f64 * p) as usize).min(n - 1);
    sorted[idx]
}

/// 5th/25th/50th/75th/95th percentile of `values`. `None` when empty.
///
/// Needs at least 20 values to be meaningful; a few hundred for stable tails.
pub fn confidence_bands(values: &[f64]) -> Option<ConfidenceBands> {
    if values.is_empty() {
        return None;
    }
    let s = sorted(values);
    Some(bands_of_sorted(&s))
}

fn bands_of_sorted(s: &[f64]) -> ConfidenceBands {
    ConfidenceBands {
        p5: percentile(s, 0.05),
        p25: percentile(s, 0.25),
        p50: percentile(s, 0.50),
        p75: percentile(s, 0.75),
        p95: percentile(s, 0.95),
    }
}

/// Bands over the final values of an ensemble.
pub fn aggregate_paths(outcomes: &[PathOutcome]) -> Option<ConfidenceBands> {
    let finals: Vec<f64> = outcomes.iter().map(|o| o.final_value).collect();
    confidence_bands(&finals)
}

pub fn dist_stats(values: &[f64]) -> Option<DistStats> {
    if values.is_empty() {
        return None;
    }
    let s = sorted(values);
    let n = s.len();
    let mean = s.iter().sum::<f64>() / n as f64;
    let variance = s.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n as f64;

    Some(DistStats {
        n,
        min: s[0],
        max: s[n - 1],
        mean,
        std_dev: variance.sqrt(),
        bands: bands_of_sorted(&s),
    })
}

/// Equal-width histogram between min and max. The maximum lands in the last bucket.
/// A zero-width range puts everything in the first bucket.
pub fn histogram(values: &[f64], bucket_count: usize) -> Vec<HistogramBucket> {
    if values.is_empty() || bucket_count == 0 {
        return Vec::new();
    }
    let s = sorted(values);
    let n = s.len();
    let (min, max) = (s[0], s[n - 1]);
    let width = (max - min) / bucket_count as f64;

    let mut counts = vec![0usize; bucket_count];
    for &v in &s {
        let idx = if width > 0.0 { ((v - min) / width) as usize } else { 0 };
        counts[idx.min(bucket_count - 1)] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| {
            let range_start = min + i as f64 * width;
            HistogramBucket {
                range_start,
                range_end: range_start + width,
                count,
                frequency: count as f64 / n as f64,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn bands_are_floor_indexed() {
        // n = 20: indices ⌊20p⌋ → 1, 5, 10, 15, 19.
        let values: Vec<f64> = (0..20).rev().map(|i| i as f64).collect();
        let b = confidence_bands(&values).unwrap();
        assert_eq!(b, ConfidenceBands { p5: 1.0, p25: 5.0, p50: 10.0, p75: 15.0, p95: 19.0 });
    }

    #[test]
    fn bands_single_value() {
        let b = confidence_bands(&[3.5]).unwrap();
        assert_eq!(b.p5, 3.5);
        assert_eq!(b.p95, 3.5);
        assert_eq!(b.spread(), 0.0);
    }

    #[test]
    fn bands_empty_is_none() {
        assert!(confidence_bands(&[]).is_none());
        assert!(dist_stats(&[]).is_none());
    }

    #[test]
    fn aggregate_paths_uses_final_values() {
        let outcomes: Vec<PathOutcome> =
            (0..5).map(|i| PathOutcome { final_value: i as f64, collapsed: i % 2 == 0 }).collect();
        let b = aggregate_paths(&outcomes).unwrap();
        assert_eq!(b.p50, 2.0);
    }

    #[test]
    fn dist_stats_known_values() {
        let ds = dist_stats(&[5.0, 1.0, 3.0, 2.0, 4.0]).unwrap();
        assert_eq!(ds.n, 5);
        assert_eq!(ds.min, 1.0);
        assert_eq!(ds.max, 5.0);
        assert!((ds.mean - 3.0).abs() < 1e-12);
        assert!((ds.std_dev - 2.0_f64.sqrt()).abs() < 1e-12);
        assert_eq!(ds.bands.p50, 3.0);
    }

    #[test]
    fn histogram_counts_every_value() {
        let values: Vec<f64> = (0..=100).map(|i| i as f64).collect();
        let h = histogram(&values, 20);
        assert_eq!(h.len(), 20);
        assert_eq!(h.iter().map(|b| b.count).sum::<usize>(), 101);
        assert_eq!(h[19].count, 6, "last bucket holds 95..=100");
        assert!((h.iter().map(|b| b.frequency).sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn histogram_constant_values() {
        let h = histogram(&[2.0; 10], 4);
        assert_eq!(h[0].count, 10);
        assert!(h[1..].iter().all(|b| b.count == 0));
        assert!(histogram(&[], 4).is_empty());
    }

    proptest! {
        #[test]
        fn bands_are_ordered(values in proptest::collection::vec(-1e6f64..1e6, 1..300)) {
            let b = confidence_bands(&values).unwrap();
            prop_assert!(b.p5 <= b.p25 && b.p25 <= b.p50 && b.p50 <= b.p75 && b.p75 <= b.p95);
        }
    }
}
