//! Core types for clock-drift analysis.

use serde::{Deserialize, Serialize};

/// Cluster label used for points that belong to no cluster.
pub const NOISE: i32 = -1;

/// Seconds in one day (resampling grid spacing).
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Seconds in one week (scale factor of the distance metrics).
pub const WEEK_SECONDS: f64 = 604_800.0;

/// Per-window quality gate: true where the window is kept.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FilterMask(pub Vec<bool>);

impl FilterMask {
    /// Number of windows covered by the mask.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the mask covers no windows.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether window `index` passed the gate.
    pub fn is_kept(&self, index: usize) -> bool {
        self.0.get(index).copied().unwrap_or(false)
    }

    /// Number of windows that passed the gate.
    pub fn kept_count(&self) -> usize {
        self.0.iter().filter(|&&k| k).count()
    }
}

/// Counts reported by the preprocessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PreprocessSummary {
    /// Windows in the archive.
    pub total_windows: usize,
    /// Windows whose correlation function is identically zero.
    pub zero_windows: usize,
    /// Non-zero windows rejected by the SNR threshold.
    pub below_snr: usize,
    /// Windows kept by the mask.
    pub retained: usize,
}

/// Output of the preprocessor: trimmed and gated correlation data.
#[derive(Debug, Clone)]
pub struct PreprocessedData {
    /// Reference correlation function over the trimmed lag axis.
    ///
    /// `None` when the archive carries no reference and no window passed the gate.
    pub reference: Option<Vec<f64>>,
    /// Per-window signal-to-noise ratio.
    pub snr: Vec<f64>,
    /// Windows kept for estimation.
    pub mask: FilterMask,
    /// Correlation matrix trimmed to the lag window (rows = windows).
    pub ccf: Vec<Vec<f64>>,
    /// Trimmed lag axis in seconds.
    pub lag: Vec<f64>,
    /// Window start times, seconds since the Unix epoch.
    pub start_times: Vec<f64>,
    /// Window counts.
    pub summary: PreprocessSummary,
}

impl PreprocessedData {
    /// Number of windows.
    pub fn window_count(&self) -> usize {
        self.ccf.len()
    }

    /// Correlation function of window `index`, or `None` if the mask rejects it.
    pub fn masked_row(&self, index: usize) -> Option<&[f64]> {
        if self.mask.is_kept(index) {
            self.ccf.get(index).map(Vec::as_slice)
        } else {
            None
        }
    }

    /// Lag-axis sample spacing in seconds.
    pub fn lag_spacing(&self) -> f64 {
        if self.lag.len() < 2 {
            return 0.0;
        }
        self.lag[1] - self.lag[0]
    }
}

/// Counts reported by the drift estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DriftDiagnostics {
    /// Windows rejected before estimation (zero rows, SNR gate, no reference).
    pub masked: usize,
    /// Windows whose peak quality fell below the cutoff.
    pub below_cutoff: usize,
    /// Windows with a defined correction.
    pub defined: usize,
}

/// Per-window drift estimates, index-aligned with the archive windows.
#[derive(Debug, Clone)]
pub struct DriftEstimate {
    /// Estimated time shift in seconds; NaN where undefined.
    pub corrections: Vec<f64>,
    /// Normalized correlation peak (or Pearson coefficient in refined mode); NaN where masked.
    pub peak_quality: Vec<f64>,
    /// Reference the final estimates were measured against.
    pub reference: Option<Vec<f64>>,
    /// Window counts.
    pub diagnostics: DriftDiagnostics,
}

impl DriftEstimate {
    /// Indices of windows with a defined correction.
    pub fn defined_indices(&self) -> Vec<usize> {
        self.corrections
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.is_nan())
            .map(|(i, _)| i)
            .collect()
    }
}

/// One defined correction sample, ready for segmentation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorrectionSample {
    /// Index of the originating archive window.
    pub window_index: usize,
    /// Window start time, seconds since the Unix epoch.
    pub start_time: f64,
    /// Estimated clock error in seconds.
    pub correction: f64,
    /// Smoothed local slope, seconds per second.
    pub local_slope: f64,
    /// Cluster label, or [`NOISE`].
    pub cluster_id: i32,
}

impl CorrectionSample {
    /// Whether the sample was labelled noise.
    pub fn is_noise(&self) -> bool {
        self.cluster_id == NOISE
    }
}

/// Per-station distance-metric weights.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricWeights {
    /// Weight on time separation.
    pub time: f64,
    /// Weight on correction separation.
    pub value: f64,
    /// Weight on slope separation.
    #[serde(default)]
    pub slope: f64,
}

impl MetricWeights {
    /// Create a weight triple.
    pub fn new(time: f64, value: f64, slope: f64) -> Self {
        Self { time, value, slope }
    }
}

/// Result of segmenting a correction series.
#[derive(Debug, Clone)]
pub struct Segmentation {
    /// Samples with their assigned labels, in window order.
    pub samples: Vec<CorrectionSample>,
    /// Number of clusters (labels `0..cluster_count`).
    pub cluster_count: usize,
    /// Number of samples labelled noise.
    pub noise_count: usize,
}

impl Segmentation {
    /// Samples belonging to cluster `cluster_id`.
    pub fn members(&self, cluster_id: i32) -> Vec<&CorrectionSample> {
        self.samples
            .iter()
            .filter(|s| s.cluster_id == cluster_id)
            .collect()
    }

    /// Cluster labels in ascending order.
    pub fn cluster_ids(&self) -> impl Iterator<Item = i32> {
        0..self.cluster_count as i32
    }
}

/// Degree-1 least-squares model of one cluster.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionModel {
    /// Cluster the model was fit to.
    pub cluster_id: i32,
    /// Seconds of error per second of time.
    pub slope: f64,
    /// Error at t = 0 (Unix epoch).
    pub intercept: f64,
    /// Coefficient of determination.
    pub r_squared: f64,
    /// Earliest member time.
    pub min_time: f64,
    /// Latest member time.
    pub max_time: f64,
    /// Number of members used in the fit.
    pub members: usize,
}

impl RegressionModel {
    /// Evaluate the fitted clock error at `time`.
    pub fn evaluate(&self, time: f64) -> f64 {
        self.slope * time + self.intercept
    }
}

/// One point of a cluster's daily resampled series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResampledPoint {
    /// Cluster the point came from.
    pub cluster_id: i32,
    /// Time, seconds since the Unix epoch.
    pub time: f64,
    /// Fitted clock error at `time`.
    pub clock_error: f64,
}

impl ResampledPoint {
    /// Correction that cancels the fitted error.
    pub fn clock_correction(&self) -> f64 {
        // Subtraction keeps a zero error as +0.0
        0.0 - self.clock_error
    }
}

/// Errors that can occur during clock-drift analysis.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// Archive is missing required arrays or has inconsistent shapes.
    #[error("Malformed correlation data: {0}")]
    DataFormat(String),

    /// Archive JSON could not be decoded.
    #[error("Failed to decode archive: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Too few defined corrections to cluster.
    #[error("Insufficient valid samples: got {valid} of {required} required")]
    InsufficientData { valid: usize, required: usize },

    /// A cluster cannot be regressed.
    #[error("Cluster {cluster_id} is degenerate: {members} members share a single time value")]
    DegenerateCluster { cluster_id: i32, members: usize },

    /// No metric weights configured for the station.
    #[error("No metric weights configured for station {0}")]
    UnconfiguredStation(String),
}

impl AnalysisError {
    /// Create a data format error.
    pub fn data_format(message: impl Into<String>) -> Self {
        Self::DataFormat(message.into())
    }
}

/// Type alias for analysis results.
pub type AnalysisResult<T> = Result<T, AnalysisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_mask_counts_kept() {
        let mask = FilterMask(vec![true, false, true, true]);
        assert_eq!(mask.kept_count(), 3);
        assert!(mask.is_kept(0));
        assert!(!mask.is_kept(1));
        assert!(!mask.is_kept(10));
    }

    #[test]
    fn resampled_point_negates_error() {
        let point = ResampledPoint {
            cluster_id: 0,
            time: 0.0,
            clock_error: 1.5,
        };
        assert_eq!(point.clock_correction(), -1.5);

        let zero = ResampledPoint {
            clock_error: 0.0,
            ..point
        };
        assert!(zero.clock_correction().is_sign_positive());
    }

    #[test]
    fn drift_estimate_lists_defined() {
        let estimate = DriftEstimate {
            corrections: vec![f64::NAN, 0.5, f64::NAN, -0.25],
            peak_quality: vec![f64::NAN; 4],
            reference: None,
            diagnostics: DriftDiagnostics::default(),
        };
        assert_eq!(estimate.defined_indices(), vec![1, 3]);
    }

    #[test]
    fn degenerate_error_mentions_cluster() {
        let err = AnalysisError::DegenerateCluster {
            cluster_id: 3,
            members: 7,
        };
        let msg = err.to_string();
        assert!(msg.contains("Cluster 3"));
        assert!(msg.contains("7 members"));
    }
}
