//! Preprocessing of correlation archives.
//!
//! Trims every correlation function to a symmetric lag window, measures
//! per-window SNR and builds the quality mask used by the drift estimator.
//!
//! Pure function - no I/O.

use crate::archive::CorrelationArchive;

use super::types::{
    AnalysisError, AnalysisResult, FilterMask, PreprocessSummary, PreprocessedData,
};

/// Configuration for preprocessing.
#[derive(Debug, Clone)]
pub struct PreprocessConfig {
    /// Minimum SNR for a window to be kept.
    pub snr_threshold: f64,
    /// Half-width of the lag window in seconds.
    pub half_width_secs: f64,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            snr_threshold: 6.0,
            half_width_secs: 300.0,
        }
    }
}

/// Trim, gate and summarize an archive.
///
/// # Arguments
/// * `archive` - Correlation archive of one station pair
/// * `config` - SNR threshold and lag half-width
///
/// # Returns
/// Trimmed data with SNR values, mask and reference function.
pub fn preprocess(
    archive: &CorrelationArchive,
    config: &PreprocessConfig,
) -> AnalysisResult<PreprocessedData> {
    archive.validate()?;

    let (first, last) = lag_window(&archive.lag, config.half_width_secs)?;
    let lag = archive.lag[first..=last].to_vec();
    let ccf: Vec<Vec<f64>> = archive
        .xcorr
        .iter()
        .map(|row| row[first..=last].to_vec())
        .collect();

    let zero_rows: Vec<bool> = ccf.iter().map(|row| row.iter().all(|&v| v == 0.0)).collect();

    let snr: Vec<f64> = match &archive.snr {
        Some(given) => given.clone(),
        None => ccf.iter().map(|row| signal_to_noise(row)).collect(),
    };

    let mask = FilterMask(
        zero_rows
            .iter()
            .zip(snr.iter())
            .map(|(&zero, &s)| !zero && s >= config.snr_threshold)
            .collect(),
    );

    let zero_windows = zero_rows.iter().filter(|&&z| z).count();
    let retained = mask.kept_count();
    let summary = PreprocessSummary {
        total_windows: ccf.len(),
        zero_windows,
        below_snr: ccf.len() - zero_windows - retained,
        retained,
    };

    let reference = match &archive.reference {
        Some(full) => Some(full[first..=last].to_vec()),
        None => mean_of_kept(&ccf, &mask),
    };

    tracing::info!(
        "Preprocessed {} windows: {} retained, {} below SNR {:.1}, {} empty",
        summary.total_windows,
        summary.retained,
        summary.below_snr,
        config.snr_threshold,
        summary.zero_windows
    );
    if reference.is_none() {
        tracing::warn!("No window passed the SNR gate; reference correlation unavailable");
    }

    Ok(PreprocessedData {
        reference,
        snr,
        mask,
        ccf,
        lag,
        start_times: archive.interval_start_times.clone(),
        summary,
    })
}

/// Inclusive index range of lag samples with `|lag| <= half_width`.
///
/// Lags are compared at centisecond precision.
fn lag_window(lag: &[f64], half_width: f64) -> AnalysisResult<(usize, usize)> {
    let inside = |v: f64| ((v * 100.0).round() / 100.0).abs() <= half_width;

    let first = lag.iter().position(|&v| inside(v));
    let last = lag.iter().rposition(|&v| inside(v));

    match (first, last) {
        (Some(first), Some(last)) => Ok((first, last)),
        _ => Err(AnalysisError::data_format(format!(
            "No lag samples within ±{} s",
            half_width
        ))),
    }
}

/// Peak-to-background ratio: max / population standard deviation.
///
/// Returns NaN for a flat function.
pub fn signal_to_noise(row: &[f64]) -> f64 {
    if row.is_empty() {
        return f64::NAN;
    }

    let n = row.len() as f64;
    let mean = row.iter().sum::<f64>() / n;
    let variance = row.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let std = variance.sqrt();

    if std < 1e-15 {
        return f64::NAN;
    }

    let max = row.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    max / std
}

/// Element-wise mean of the kept rows, or `None` if no row is kept.
fn mean_of_kept(ccf: &[Vec<f64>], mask: &FilterMask) -> Option<Vec<f64>> {
    let kept: Vec<&Vec<f64>> = ccf
        .iter()
        .enumerate()
        .filter(|(i, _)| mask.is_kept(*i))
        .map(|(_, row)| row)
        .collect();

    let first = kept.first()?;
    let mut sum = vec![0.0; first.len()];
    for row in &kept {
        for (acc, v) in sum.iter_mut().zip(row.iter()) {
            *acc += v;
        }
    }

    let n = kept.len() as f64;
    Some(sum.into_iter().map(|v| v / n).collect())
}
