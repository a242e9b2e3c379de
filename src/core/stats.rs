use super::types::{HistogramBin, RoiEfficiency, SummaryStats};
use crate::error::{SimResult, SimulationError};

/// Summary of a non-empty outcome set. Sorts a copy; `outcomes` keeps trial order.
pub fn summarize(outcomes: &[f64]) -> SimResult<SummaryStats> {
    if outcomes.is_empty() {
        return Err(SimulationError::invalid(
            "cannot summarize an empty outcome set",
        ));
    }

    let mut sorted = outcomes.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let n = sorted.len() as f64;
    let mean = sorted.iter().sum::<f64>() / n;
    let variance = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

    Ok(SummaryStats {
        mean,
        median: percentile_sorted(&sorted, 50.0),
        p5: percentile_sorted(&sorted, 5.0),
        p95: percentile_sorted(&sorted, 95.0),
        std_dev: variance.sqrt(),
        min: sorted[0],
        max: sorted[sorted.len() - 1],
    })
}

/// Fraction of trials that ended strictly above zero.
pub fn success_probability(outcomes: &[f64]) -> f64 {
    if outcomes.is_empty() {
        return 0.0;
    }
    outcomes.iter().filter(|v| **v > 0.0).count() as f64 / outcomes.len() as f64
}

pub fn roi_efficiency(median_outcome: f64, total_cost: f64) -> RoiEfficiency {
    if total_cost > 0.0 {
        RoiEfficiency::Ratio(median_outcome / total_cost)
    } else {
        RoiEfficiency::DebtFree
    }
}

/// Linear-interpolated percentile over values already sorted ascending.
pub fn percentile_sorted(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let n = values.len();
    if n == 1 {
        return values[0];
    }

    let rank = (p.clamp(0.0, 100.0) / 100.0) * (n as f64 - 1.0);
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;

    if lower == upper {
        values[lower]
    } else {
        let w = rank - lower as f64;
        values[lower] * (1.0 - w) + values[upper] * w
    }
}

/// Equal-width bins spanning `[min, max]`; the last bin is closed on the right.
pub fn histogram(outcomes: &[f64], bins: u32) -> SimResult<Vec<HistogramBin>> {
    if bins == 0 {
        return Err(SimulationError::invalid("histogram bins must be > 0"));
    }
    if outcomes.is_empty() {
        return Ok(Vec::new());
    }

    let (min, max) = outcomes
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(*v), hi.max(*v))
        });

    if max <= min {
        return Ok(vec![HistogramBin {
            lower: min,
            upper: max,
            count: outcomes.len() as u32,
        }]);
    }

    let width = (max - min) / bins as f64;
    let mut counts = vec![0_u32; bins as usize];
    for v in outcomes {
        let idx = (((v - min) / width) as usize).min(bins as usize - 1);
        counts[idx] += 1;
    }

    Ok(counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            lower: min + width * i as f64,
            upper: if i + 1 == bins as usize {
                max
            } else {
                min + width * (i + 1) as f64
            },
            count,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    const EPS: f64 = 1e-9;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn percentile_interpolates_between_neighbours() {
        let values = [10.0, 20.0, 30.0, 40.0, 50.0];
        assert_approx(percentile_sorted(&values, 50.0), 30.0);
        assert_approx(percentile_sorted(&values, 0.0), 10.0);
        assert_approx(percentile_sorted(&values, 100.0), 50.0);
        assert_approx(percentile_sorted(&values, 5.0), 12.0);
        assert_approx(percentile_sorted(&values, 95.0), 48.0);
    }

    #[test]
    fn summarize_rejects_empty_set() {
        assert!(summarize(&[]).is_err());
    }

    #[test]
    fn summarize_reports_moments_and_extremes() {
        let stats = summarize(&[4.0, -2.0, 1.0, 1.0]).expect("non-empty");
        assert_approx(stats.mean, 1.0);
        assert_approx(stats.median, 1.0);
        assert_approx(stats.min, -2.0);
        assert_approx(stats.max, 4.0);
        assert_approx(stats.std_dev, (4.5f64).sqrt());
    }

    #[test]
    fn success_probability_counts_strictly_positive() {
        assert_approx(success_probability(&[-1.0, 0.0, 1.0, 2.0]), 0.5);
    }

    #[test]
    fn roi_uses_sentinel_for_zero_cost() {
        assert_eq!(roi_efficiency(50_000.0, 0.0), RoiEfficiency::DebtFree);
        assert_eq!(
            roi_efficiency(50_000.0, 100_000.0),
            RoiEfficiency::Ratio(0.5)
        );
    }

    #[test]
    fn histogram_collapses_degenerate_range() {
        let bins = histogram(&[5.0, 5.0, 5.0], 70).expect("valid bins");
        assert_eq!(bins.len(), 1);
        assert_eq!(bins[0].count, 3);
    }

    #[test]
    fn histogram_rejects_zero_bins() {
        assert!(histogram(&[1.0], 0).is_err());
    }

    proptest! {
        #[test]
        fn prop_percentiles_are_ordered(
            values in proptest::collection::vec(-1.0e6f64..1.0e6, 1..200),
        ) {
            let stats = summarize(&values).expect("non-empty");
            prop_assert!(stats.min <= stats.p5);
            prop_assert!(stats.p5 <= stats.median);
            prop_assert!(stats.median <= stats.p95);
            prop_assert!(stats.p95 <= stats.max);
        }

        #[test]
        fn prop_histogram_counts_every_outcome(
            values in proptest::collection::vec(-1.0e6f64..1.0e6, 1..300),
            bins in 1u32..100,
        ) {
            let hist = histogram(&values, bins).expect("valid bins");
            let total: u32 = hist.iter().map(|b| b.count).sum();
            prop_assert_eq!(total as usize, values.len());
        }
    }
}
