//! Clock-drift estimation for correlation time series.
//!
//! Each retained window's correlation function is cross-correlated against
//! the reference correlation function; the shift of the best match is the
//! window's clock error estimate. Windows whose match quality falls below
//! the cutoff get no estimate (NaN) so they never reach clustering.
//!
//! All functions are pure - no I/O, no side effects.

use serde::{Deserialize, Serialize};

use super::correlation::{find_peak, pearson, shift_samples, zero_lag_index, CrossCorrelator};
use super::types::{DriftDiagnostics, DriftEstimate, PreprocessedData};

/// Configuration for drift estimation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriftEstimationConfig {
    /// Minimum match quality in [0, 1] for an estimate to be kept.
    pub quality_cutoff: f64,
    /// Run the two-pass estimate against a shift-corrected reference.
    pub refine: bool,
}

impl Default for DriftEstimationConfig {
    fn default() -> Self {
        Self {
            quality_cutoff: 0.5,
            refine: false,
        }
    }
}

/// Estimate the clock error of every window.
///
/// Pure function - no I/O, no side effects.
///
/// # Arguments
/// * `data` - Preprocessed correlation data
/// * `config` - Cutoff and estimation mode
///
/// # Returns
/// Estimates index-aligned with the archive windows. Masked windows and
/// windows below the cutoff hold NaN.
pub fn estimate_drift(data: &PreprocessedData, config: &DriftEstimationConfig) -> DriftEstimate {
    let windows = data.window_count();

    let reference = match &data.reference {
        Some(r) => r,
        None => {
            tracing::warn!("No reference correlation; all {} windows undefined", windows);
            return DriftEstimate {
                corrections: vec![f64::NAN; windows],
                peak_quality: vec![f64::NAN; windows],
                reference: None,
                diagnostics: DriftDiagnostics {
                    masked: windows,
                    below_cutoff: 0,
                    defined: 0,
                },
            };
        }
    };

    let correlator = CrossCorrelator::new(data.lag.len(), zero_lag_index(&data.lag));

    let estimate = if config.refine {
        estimate_refined(data, reference, &correlator, config.quality_cutoff)
    } else {
        estimate_single_pass(data, reference, &correlator, config.quality_cutoff)
    };

    tracing::info!(
        "Drift estimates: {} defined, {} below cutoff {:.2}, {} masked",
        estimate.diagnostics.defined,
        estimate.diagnostics.below_cutoff,
        config.quality_cutoff,
        estimate.diagnostics.masked
    );

    estimate
}

/// One estimate per window against a fixed reference.
fn estimate_single_pass(
    data: &PreprocessedData,
    reference: &[f64],
    correlator: &CrossCorrelator,
    cutoff: f64,
) -> DriftEstimate {
    let windows = data.window_count();
    let spacing = data.lag_spacing();

    let mut corrections = vec![f64::NAN; windows];
    let mut peak_quality = vec![f64::NAN; windows];
    let mut diagnostics = DriftDiagnostics::default();

    for i in 0..windows {
        let Some(row) = data.masked_row(i) else {
            diagnostics.masked += 1;
            continue;
        };

        match best_shift(correlator, reference, row) {
            Some((shift, peak)) => {
                peak_quality[i] = peak;
                if peak < cutoff {
                    diagnostics.below_cutoff += 1;
                } else {
                    corrections[i] = shift as f64 * spacing;
                    diagnostics.defined += 1;
                }
            }
            None => diagnostics.below_cutoff += 1,
        }
    }

    DriftEstimate {
        corrections,
        peak_quality,
        reference: Some(reference.to_vec()),
        diagnostics,
    }
}

/// Two-pass estimate.
///
/// First-order shifts align every window to the reference; their mean is a
/// corrected reference. The cutoff is applied to the Pearson coefficient of
/// each aligned window against the corrected reference, and surviving
/// windows are re-estimated against it.
fn estimate_refined(
    data: &PreprocessedData,
    reference: &[f64],
    correlator: &CrossCorrelator,
    cutoff: f64,
) -> DriftEstimate {
    let windows = data.window_count();
    let spacing = data.lag_spacing();

    let mut diagnostics = DriftDiagnostics::default();

    // First pass: align each window to the reference
    let aligned: Vec<Option<Vec<f64>>> = (0..windows)
        .map(|i| {
            let row = data.masked_row(i)?;
            let (shift, _) = best_shift(correlator, reference, row)?;
            Some(shift_samples(row, shift))
        })
        .collect();

    let corrected_reference = match mean_rows(aligned.iter().flatten()) {
        Some(r) => r,
        None => return estimate_single_pass(data, reference, correlator, cutoff),
    };

    let mut corrections = vec![f64::NAN; windows];
    let mut peak_quality = vec![f64::NAN; windows];

    for i in 0..windows {
        let Some(row) = data.masked_row(i) else {
            diagnostics.masked += 1;
            continue;
        };
        let Some(shifted) = aligned[i].as_ref() else {
            diagnostics.below_cutoff += 1;
            continue;
        };

        let coefficient = pearson(&corrected_reference, shifted);
        peak_quality[i] = coefficient;
        if coefficient.is_nan() || coefficient < cutoff {
            diagnostics.below_cutoff += 1;
            continue;
        }

        // Second pass against the corrected reference
        match best_shift(correlator, &corrected_reference, row) {
            Some((shift, _)) => {
                corrections[i] = shift as f64 * spacing;
                diagnostics.defined += 1;
            }
            None => diagnostics.below_cutoff += 1,
        }
    }

    DriftEstimate {
        corrections,
        peak_quality,
        reference: Some(corrected_reference),
        diagnostics,
    }
}

/// Shift (in samples) and value of the best normalized match.
fn best_shift(
    correlator: &CrossCorrelator,
    reference: &[f64],
    row: &[f64],
) -> Option<(isize, f64)> {
    let correlation = correlator.correlate(reference, row)?;
    let (index, peak) = find_peak(&correlation)?;
    Some((index as isize - correlator.center() as isize, peak))
}

fn mean_rows<'a>(rows: impl Iterator<Item = &'a Vec<f64>>) -> Option<Vec<f64>> {
    let mut sum: Option<Vec<f64>> = None;
    let mut count = 0usize;

    for row in rows {
        let acc = sum.get_or_insert_with(|| vec![0.0; row.len()]);
        for (a, v) in acc.iter_mut().zip(row.iter()) {
            *a += v;
        }
        count += 1;
    }

    sum.map(|s| s.into_iter().map(|v| v / count as f64).collect())
}

/// Pearson coefficient of every retained window against the reference.
///
/// Diagnostic helper; masked windows hold NaN.
pub fn reference_pearson(data: &PreprocessedData) -> Vec<f64> {
    let Some(reference) = data.reference.as_ref() else {
        return vec![f64::NAN; data.window_count()];
    };

    (0..data.window_count())
        .map(|i| match data.masked_row(i) {
            Some(row) => pearson(reference, row),
            None => f64::NAN,
        })
        .collect()
}
