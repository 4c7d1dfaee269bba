//! Segmentation of a correction series into coherent clusters.
//!
//! Defined corrections are projected into (time, correction, slope) space
//! and clustered with DBSCAN under the station's weighted metric. Clock
//! resets and drift-rate changes separate into different clusters; isolated
//! outliers become noise.

use serde::{Deserialize, Serialize};

use super::dbscan::{cluster_count, dbscan};
use super::metric::{FeaturePoint, TimeValueMetric, TimeValueSlopeMetric};
use super::slope::local_slope;
use super::types::{
    AnalysisError, AnalysisResult, CorrectionSample, DriftEstimate, MetricWeights, Segmentation,
    NOISE,
};

/// Configuration for segmentation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentationConfig {
    /// Neighbourhood radius in weighted seconds.
    pub eps_secs: f64,
    /// Minimum neighbourhood size (point included) of a core point.
    pub min_samples: usize,
    /// Also cluster without the slope feature and log the result.
    pub diagnostic_pass: bool,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            eps_secs: 1_209_600.0,
            min_samples: 7,
            diagnostic_pass: false,
        }
    }
}

/// Segment the defined corrections of a drift estimate.
///
/// # Arguments
/// * `drift` - Per-window estimates; NaN entries are skipped
/// * `start_times` - Window start times, index-aligned with the estimates
/// * `weights` - Station metric weights
/// * `config` - Radius and density threshold
///
/// # Errors
/// `InsufficientData` if fewer than `min_samples` corrections are defined.
pub fn segment(
    drift: &DriftEstimate,
    start_times: &[f64],
    weights: &MetricWeights,
    config: &SegmentationConfig,
) -> AnalysisResult<Segmentation> {
    let indices: Vec<usize> = drift
        .defined_indices()
        .into_iter()
        .filter(|&i| i < start_times.len())
        .collect();

    let times: Vec<f64> = indices.iter().map(|&i| start_times[i]).collect();
    let values: Vec<f64> = indices.iter().map(|&i| drift.corrections[i]).collect();

    segment_series(&indices, &times, &values, weights, config)
}

/// Segment an already-filtered (time, correction) series.
///
/// `window_indices` tags each sample with its source window.
pub fn segment_series(
    window_indices: &[usize],
    times: &[f64],
    values: &[f64],
    weights: &MetricWeights,
    config: &SegmentationConfig,
) -> AnalysisResult<Segmentation> {
    let valid = times.len();
    if valid < config.min_samples || valid == 0 {
        return Err(AnalysisError::InsufficientData {
            valid,
            required: config.min_samples.max(1),
        });
    }

    let slopes = local_slope(times, values);
    let points: Vec<FeaturePoint> = (0..valid)
        .map(|i| FeaturePoint::new(times[i], values[i], slopes[i]))
        .collect();

    if config.diagnostic_pass {
        let flat = dbscan(
            &points,
            &TimeValueMetric::new(*weights),
            config.eps_secs,
            config.min_samples,
        );
        tracing::info!(
            "Diagnostic clustering without slope: {} clusters, {} noise",
            cluster_count(&flat),
            flat.iter().filter(|&&l| l == NOISE).count()
        );
    }

    let labels = dbscan(
        &points,
        &TimeValueSlopeMetric::new(*weights),
        config.eps_secs,
        config.min_samples,
    );

    let samples: Vec<CorrectionSample> = (0..valid)
        .map(|i| CorrectionSample {
            window_index: window_indices.get(i).copied().unwrap_or(i),
            start_time: times[i],
            correction: values[i],
            local_slope: slopes[i],
            cluster_id: labels[i],
        })
        .collect();

    let segmentation = Segmentation {
        cluster_count: cluster_count(&labels),
        noise_count: labels.iter().filter(|&&l| l == NOISE).count(),
        samples,
    };

    tracing::info!(
        "Segmented {} corrections into {} clusters ({} noise)",
        valid,
        segmentation.cluster_count,
        segmentation.noise_count
    );

    Ok(segmentation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::types::{DriftDiagnostics, SECONDS_PER_DAY};

    fn weights() -> MetricWeights {
        MetricWeights::new(1.0, 1.0, 1.0)
    }

    fn config(min_samples: usize) -> SegmentationConfig {
        SegmentationConfig {
            eps_secs: 2.0 * 604_800.0,
            min_samples,
            diagnostic_pass: false,
        }
    }

    fn estimate(corrections: Vec<f64>) -> DriftEstimate {
        let n = corrections.len();
        DriftEstimate {
            corrections,
            peak_quality: vec![1.0; n],
            reference: None,
            diagnostics: DriftDiagnostics::default(),
        }
    }

    fn days(n: usize, offset_days: f64) -> Vec<f64> {
        (0..n)
            .map(|i| (offset_days + i as f64) * SECONDS_PER_DAY)
            .collect()
    }

    #[test]
    fn separated_blocks_form_two_clusters() {
        let mut times = days(10, 0.0);
        times.extend(days(10, 100.0));
        let mut values = vec![1.0; 10];
        values.extend(vec![-2.0; 10]);
        let indices: Vec<usize> = (0..20).collect();

        let seg = segment_series(&indices, &times, &values, &weights(), &config(7)).unwrap();

        assert_eq!(seg.cluster_count, 2);
        assert_eq!(seg.noise_count, 0);
        assert!(seg.members(0).iter().all(|s| s.correction == 1.0));
        assert!(seg.members(1).iter().all(|s| s.correction == -2.0));
    }

    #[test]
    fn isolated_window_is_noise() {
        let mut times = days(10, 0.0);
        times.push(200.0 * SECONDS_PER_DAY);
        let values = vec![0.0; 11];
        let indices: Vec<usize> = (0..11).collect();

        let seg = segment_series(&indices, &times, &values, &weights(), &config(7)).unwrap();

        assert_eq!(seg.cluster_count, 1);
        assert_eq!(seg.noise_count, 1);
        assert!(seg.samples[10].is_noise());
    }

    #[test]
    fn too_few_samples_is_insufficient() {
        let times = days(5, 0.0);
        let values = vec![0.0; 5];
        let indices: Vec<usize> = (0..5).collect();

        let err = segment_series(&indices, &times, &values, &weights(), &config(7)).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::InsufficientData {
                valid: 5,
                required: 7
            }
        ));
    }

    #[test]
    fn undefined_corrections_are_skipped() {
        let mut corrections = vec![0.25; 12];
        corrections[3] = f64::NAN;
        corrections[8] = f64::NAN;
        let drift = estimate(corrections);
        let times = days(12, 0.0);

        let seg = segment(&drift, &times, &weights(), &config(7)).unwrap();

        assert_eq!(seg.samples.len(), 10);
        assert!(seg.samples.iter().all(|s| s.window_index != 3 && s.window_index != 8));
        assert!(seg.samples.iter().all(|s| !s.correction.is_nan()));
    }

    #[test]
    fn undefined_corrections_do_not_count_as_valid() {
        let mut corrections = vec![f64::NAN; 10];
        corrections[0] = 0.0;
        corrections[1] = 0.0;
        let drift = estimate(corrections);

        let err = segment(&drift, &days(10, 0.0), &weights(), &config(7)).unwrap_err();
        assert!(matches!(err, AnalysisError::InsufficientData { valid: 2, .. }));
    }

    #[test]
    fn every_cluster_meets_min_samples() {
        let mut times = days(8, 0.0);
        times.extend(days(3, 60.0));
        times.extend(days(9, 120.0));
        let values = vec![0.5; 20];
        let indices: Vec<usize> = (0..20).collect();

        let seg = segment_series(&indices, &times, &values, &weights(), &config(7)).unwrap();

        for id in seg.cluster_ids() {
            assert!(seg.members(id).len() >= 7);
        }
        assert_eq!(seg.cluster_count, 2);
        assert_eq!(seg.noise_count, 3);
    }

    #[test]
    fn cluster_sharing_border_points_still_meets_min_samples() {
        // Two-week spacing units: the middle points sit within reach of both
        // the early group and the late one
        let unit = 14.0 * SECONDS_PER_DAY;
        let times: Vec<f64> = [-0.2, -0.1, 0.0, 0.95, 1.9, 2.8, 2.85]
            .iter()
            .map(|t| t * unit)
            .collect();
        let values = vec![0.5; 7];
        let indices: Vec<usize> = (0..7).collect();

        let seg = segment_series(&indices, &times, &values, &weights(), &config(4)).unwrap();

        assert_eq!(seg.cluster_count, 1);
        assert_eq!(seg.noise_count, 3);
        for id in seg.cluster_ids() {
            assert!(seg.members(id).len() >= 4);
        }
        assert!(seg.samples[4..].iter().all(|s| s.is_noise()));
    }

    #[test]
    fn diagnostic_pass_leaves_labels_unchanged() {
        let times = days(10, 0.0);
        let values = vec![0.0; 10];
        let indices: Vec<usize> = (0..10).collect();
        let mut with_diag = config(7);
        with_diag.diagnostic_pass = true;

        let a = segment_series(&indices, &times, &values, &weights(), &config(7)).unwrap();
        let b = segment_series(&indices, &times, &values, &weights(), &with_diag).unwrap();

        assert_eq!(a.samples, b.samples);
    }
}
