//! Per-cluster linear regression and daily resampling.
//!
//! Each cluster's (time, correction) members are fit with a least-squares
//! line. The line is then evaluated on a uniform daily grid spanning the
//! cluster's own time range, so output never leaves the cluster bounds.

use super::types::{
    AnalysisError, AnalysisResult, RegressionModel, ResampledPoint, Segmentation, SECONDS_PER_DAY,
};

/// Fit a degree-1 least-squares model to one cluster.
///
/// # Errors
/// `DegenerateCluster` if the members do not span at least two distinct
/// time values.
pub fn fit_linear(
    cluster_id: i32,
    times: &[f64],
    values: &[f64],
) -> AnalysisResult<RegressionModel> {
    let members = times.len().min(values.len());
    let degenerate = AnalysisError::DegenerateCluster {
        cluster_id,
        members,
    };

    if members < 2 {
        return Err(degenerate);
    }

    let x = &times[..members];
    let y = &values[..members];

    let min_time = x.iter().copied().fold(f64::INFINITY, f64::min);
    let max_time = x.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max_time <= min_time {
        return Err(degenerate);
    }

    let n = members as f64;

    // Calculate means
    let x_mean = x.iter().sum::<f64>() / n;
    let y_mean = y.iter().sum::<f64>() / n;

    let mut numerator = 0.0;
    let mut denominator = 0.0;

    for (xi, yi) in x.iter().zip(y.iter()) {
        let x_diff = xi - x_mean;
        numerator += x_diff * (yi - y_mean);
        denominator += x_diff * x_diff;
    }

    if denominator.abs() < 1e-10 {
        return Err(degenerate);
    }

    let slope = numerator / denominator;
    let intercept = y_mean - slope * x_mean;

    // R² (coefficient of determination)
    let mut ss_res = 0.0;
    let mut ss_tot = 0.0;

    for (xi, yi) in x.iter().zip(y.iter()) {
        let y_pred = slope * xi + intercept;
        ss_res += (yi - y_pred).powi(2);
        ss_tot += (yi - y_mean).powi(2);
    }

    let r_squared = if ss_tot.abs() < 1e-10 {
        1.0
    } else {
        1.0 - (ss_res / ss_tot)
    };

    Ok(RegressionModel {
        cluster_id,
        slope,
        intercept,
        r_squared: r_squared.max(0.0),
        min_time,
        max_time,
        members,
    })
}

/// Evaluate a model on a daily grid over its cluster's time range.
///
/// The grid holds `round((max - min) / 86400) + 1` evenly spaced points,
/// both endpoints included.
pub fn resample_daily(model: &RegressionModel) -> Vec<ResampledPoint> {
    let span = model.max_time - model.min_time;
    let count = (span / SECONDS_PER_DAY).round() as usize + 1;

    (0..count)
        .map(|i| {
            let time = if count == 1 {
                model.min_time
            } else if i == count - 1 {
                model.max_time
            } else {
                model.min_time + span * i as f64 / (count - 1) as f64
            };
            ResampledPoint {
                cluster_id: model.cluster_id,
                time,
                clock_error: model.evaluate(time),
            }
        })
        .collect()
}

/// Models and resampled points for every regressable cluster.
#[derive(Debug, Clone, Default)]
pub struct ClusterFits {
    /// One model per fitted cluster, ascending cluster id.
    pub models: Vec<RegressionModel>,
    /// Resampled points of all fitted clusters, grouped by cluster.
    pub points: Vec<ResampledPoint>,
    /// Clusters skipped as degenerate.
    pub skipped: Vec<i32>,
}

/// Fit and resample every cluster of a segmentation.
///
/// Noise is excluded. A degenerate cluster is logged and skipped without
/// affecting its siblings.
pub fn fit_clusters(segmentation: &Segmentation) -> ClusterFits {
    let mut fits = ClusterFits::default();

    for cluster_id in segmentation.cluster_ids() {
        let members = segmentation.members(cluster_id);
        let times: Vec<f64> = members.iter().map(|s| s.start_time).collect();
        let values: Vec<f64> = members.iter().map(|s| s.correction).collect();

        match fit_linear(cluster_id, &times, &values) {
            Ok(model) => {
                tracing::debug!(
                    "Cluster {}: {} members, slope={:.3e} s/s, intercept={:.6}, R²={:.4}",
                    cluster_id,
                    model.members,
                    model.slope,
                    model.intercept,
                    model.r_squared
                );
                fits.points.extend(resample_daily(&model));
                fits.models.push(model);
            }
            Err(e) => {
                tracing::warn!("Skipping cluster {}: {}", cluster_id, e);
                fits.skipped.push(cluster_id);
            }
        }
    }

    fits
}
