//! Binned probability density / frequency curves.

use std::sync::Arc;

use arrow::array::Float64Array;
use arrow::record_batch::RecordBatch;
use vaxstat_core::output;

use crate::AnalyticsError;

/// One histogram bin: its midpoint and its density or frequency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DensityPoint {
    pub x: f64,
    pub y: f64,
}

/// Upper bound on the number of bins one curve may have.
const MAX_BINS: usize = 1_000_000;

/// Number of `bins_res`-wide bins, starting at the sample minimum, needed
/// so that every value (the maximum included) falls in a half-open bin.
fn bin_count(range: f64, bins_res: f64) -> Result<usize, AnalyticsError> {
    let too_many = || {
        AnalyticsError::InvalidConfiguration(format!(
            "range {range} at resolution {bins_res} needs more than {MAX_BINS} bins"
        ))
    };
    let steps = range / bins_res;
    if !steps.is_finite() || steps >= MAX_BINS as f64 {
        return Err(too_many());
    }
    let whole = steps.round();
    let n_bins = if (steps - whole).abs() < 1e-9 {
        (whole as usize).checked_add(1).ok_or_else(too_many)?
    } else {
        steps.ceil() as usize
    };
    if n_bins > MAX_BINS {
        return Err(too_many());
    }
    Ok(n_bins)
}

/// Histogram of `sample` with fixed-width bins of `bins_res`.
///
/// With `density` the bin values are normalised so that they integrate to 1
/// over the bins; otherwise they are raw counts summing to the sample size.
pub fn probability_density(
    sample: &[f64],
    bins_res: f64,
    density: bool,
) -> Result<Vec<DensityPoint>, AnalyticsError> {
    if !bins_res.is_finite() || bins_res <= 0.0 {
        return Err(AnalyticsError::InvalidConfiguration(format!(
            "bin resolution must be positive, got {bins_res}"
        )));
    }
    if sample.is_empty() {
        return Err(AnalyticsError::InvalidSample("empty sample".into()));
    }
    if let Some(bad) = sample.iter().find(|v| !v.is_finite()) {
        return Err(AnalyticsError::InvalidSample(format!(
            "non-finite value {bad}"
        )));
    }

    let min = sample.iter().copied().fold(f64::INFINITY, f64::min);
    let max = sample.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let n_bins = bin_count(max - min, bins_res)?;

    let mut counts = vec![0u64; n_bins];
    for &value in sample {
        let bin = ((value - min) / bins_res).floor() as usize;
        counts[bin.min(n_bins - 1)] += 1;
    }

    let scale = if density {
        1.0 / (sample.len() as f64 * bins_res)
    } else {
        1.0
    };
    Ok(counts
        .iter()
        .enumerate()
        .map(|(i, &count)| DensityPoint {
            x: min + bins_res * (i as f64 + 0.5),
            y: count as f64 * scale,
        })
        .collect())
}

/// Density curve as an Arrow batch (`x`, `y`).
pub fn density_batch(points: &[DensityPoint]) -> Result<RecordBatch, AnalyticsError> {
    let xs = Float64Array::from_iter_values(points.iter().map(|p| p.x));
    let ys = Float64Array::from_iter_values(points.iter().map(|p| p.y));
    Ok(RecordBatch::try_new(
        Arc::new(output::density_schema()),
        vec![Arc::new(xs), Arc::new(ys)],
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: [f64; 7] = [1.0, 2.0, 2.0, 3.0, 3.0, 3.0, 4.0];

    #[test]
    fn frequency_bins_with_unit_resolution() {
        let points = probability_density(&SAMPLE, 1.0, false).unwrap();
        let xs: Vec<f64> = points.iter().map(|p| p.x).collect();
        let ys: Vec<f64> = points.iter().map(|p| p.y).collect();
        assert_eq!(xs, [1.5, 2.5, 3.5, 4.5]);
        assert_eq!(ys, [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(ys.iter().sum::<f64>(), 7.0);
    }

    #[test]
    fn density_integrates_to_one() {
        let ages: Vec<f64> = (0..200).map(|i| 40.0 + (i % 47) as f64 * 0.9).collect();
        for res in [1.0, 3.0, 5.0] {
            let points = probability_density(&ages, res, true).unwrap();
            let area: f64 = points.iter().map(|p| p.y * res).sum();
            assert!((area - 1.0).abs() < 1e-9, "res {res}: area {area}");
        }
    }

    #[test]
    fn coarse_resolution_rounds_bins_up() {
        // range 3 at resolution 2 needs two bins: [1,3) and [3,5).
        let points = probability_density(&SAMPLE, 2.0, false).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].y, 3.0);
        assert_eq!(points[1].y, 4.0);
    }

    #[test]
    fn single_value_is_one_bin() {
        let points = probability_density(&[42.0], 3.0, false).unwrap();
        assert_eq!(points, [DensityPoint { x: 43.5, y: 1.0 }]);
    }

    #[test]
    fn invalid_inputs() {
        assert!(matches!(
            probability_density(&[], 1.0, false),
            Err(AnalyticsError::InvalidSample(_))
        ));
        assert!(matches!(
            probability_density(&[1.0, f64::NAN], 1.0, false),
            Err(AnalyticsError::InvalidSample(_))
        ));
        assert!(matches!(
            probability_density(&SAMPLE, 0.0, false),
            Err(AnalyticsError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            probability_density(&SAMPLE, -1.0, true),
            Err(AnalyticsError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn huge_range_is_rejected_not_allocated() {
        assert!(matches!(
            probability_density(&[0.0, 1e300], 1.0, false),
            Err(AnalyticsError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            probability_density(&[-1e308, 1e308], 1.0, true),
            Err(AnalyticsError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            probability_density(&[0.0, 1e7], 1.0, false),
            Err(AnalyticsError::InvalidConfiguration(_))
        ));
        // Just under the cap still works.
        let points = probability_density(&[0.0, 999_998.5], 1.0, false).unwrap();
        assert_eq!(points.len(), 999_999);
    }

    #[test]
    fn batch_has_one_row_per_bin() {
        let points = probability_density(&SAMPLE, 1.0, true).unwrap();
        let batch = density_batch(&points).unwrap();
        assert_eq!(batch.num_rows(), 4);
        assert_eq!(batch.num_columns(), 2);
    }
}
