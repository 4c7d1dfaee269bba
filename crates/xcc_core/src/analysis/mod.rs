//! Clock-drift analysis of station-pair correlation archives.
//!
//! # Architecture
//!
//! The analysis pipeline consists of pure functions that the orchestrator steps
//! compose together:
//!
//! 1. **Preprocessing** (`preprocess`): Trim correlation functions to the lag
//!    window, compute SNR, build the quality mask and reference function.
//!
//! 2. **Drift Estimation** (`drift`): Cross-correlate each kept window against
//!    the reference and convert the best shift to a clock error.
//!
//! 3. **Segmentation** (`segment`): Cluster defined corrections with DBSCAN over
//!    a weighted (time, correction, slope) metric.
//!
//! 4. **Regression** (`regression`): Fit a line per cluster and resample it onto
//!    a daily grid.
//!
//! # Usage
//!
//! ```ignore
//! use xcc_core::analysis::{
//!     preprocess, estimate_drift, segment, fit_clusters,
//!     PreprocessConfig, DriftEstimationConfig, SegmentationConfig, MetricWeights,
//! };
//!
//! let data = preprocess(&archive, &PreprocessConfig::default())?;
//! let drift = estimate_drift(&data, &DriftEstimationConfig::default());
//! let config = SegmentationConfig::default();
//! let segmentation = segment(&drift, &data.start_times, &weights, &config)?;
//! let fits = fit_clusters(&segmentation);
//! ```

mod correlation;
pub mod dbscan;
mod drift;
pub mod metric;
mod preprocess;
mod regression;
mod segment;
pub mod slope;
pub mod types;

// Re-export main types from types module
pub use types::{
    AnalysisError, AnalysisResult, CorrectionSample, DriftDiagnostics, DriftEstimate, FilterMask,
    MetricWeights, PreprocessSummary, PreprocessedData, RegressionModel, ResampledPoint,
    Segmentation, NOISE, SECONDS_PER_DAY, WEEK_SECONDS,
};

// Re-export preprocessing
pub use preprocess::{preprocess, signal_to_noise, PreprocessConfig};

// Re-export correlation primitives
pub use correlation::{find_peak, pearson, zero_lag_index, CrossCorrelator};

// Re-export drift estimation
pub use drift::{estimate_drift, reference_pearson, DriftEstimationConfig};

// Re-export segmentation
pub use metric::{DistanceMetric, FeaturePoint, TimeValueMetric, TimeValueSlopeMetric};
pub use segment::{segment, segment_series, SegmentationConfig};

// Re-export regression
pub use regression::{fit_clusters, fit_linear, resample_daily, ClusterFits};
